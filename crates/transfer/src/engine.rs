//! Idempotent materialization of manifest records.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use protocol::FileRecord;
use session::{Connect, ConnectionManager, SessionError, TransferMode};

use crate::dest::DestinationLayout;
use crate::error::TransferError;

/// Suffix of the staging file a download is written to before commit.
const STAGING_SUFFIX: &str = ".part";

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The local copy was created or replaced.
    Created,
    /// The local copy already carried the remote timestamp; no remote
    /// command was issued.
    Skipped,
    /// The record could not be materialized; the run continues.
    Failed,
}

/// Brings local paths up to date with manifest records.
///
/// Files are downloaded into a `.part` staging file in the destination
/// directory and renamed over the final name only after a full flush,
/// then stamped with the remote creation time. The stamp doubles as the
/// idempotence marker: a later run sees the matching timestamp and
/// skips the record without touching the network.
pub struct TransferEngine<'a, C: Connect> {
    manager: &'a mut ConnectionManager<C>,
    layout: DestinationLayout,
    text_extensions: Vec<String>,
}

impl<'a, C: Connect> TransferEngine<'a, C> {
    /// Creates an engine.
    ///
    /// `text_extensions` selects line-oriented transfer by extension,
    /// compared ASCII case-insensitively; everything else moves as a
    /// raw byte stream.
    pub fn new(
        manager: &'a mut ConnectionManager<C>,
        layout: DestinationLayout,
        text_extensions: Vec<String>,
    ) -> Self {
        Self {
            manager,
            layout,
            text_extensions,
        }
    }

    /// Materializes one record.
    ///
    /// # Errors
    ///
    /// Only [`TransferError`]; ordinary per-record failures come back as
    /// [`Outcome::Failed`].
    pub fn materialize(&mut self, record: &FileRecord) -> Result<Outcome, TransferError> {
        let local = self.layout.local_path(record);
        if is_current(&local, record) {
            tracing::debug!(path = %local.display(), "up to date");
            return Ok(Outcome::Skipped);
        }
        if record.is_dir() {
            self.create_directory(&local, record)
        } else {
            self.download(&local, record)
        }
    }

    fn create_directory(&self, local: &Path, record: &FileRecord) -> Result<Outcome, TransferError> {
        create_dir_all(local)?;
        if let Err(err) = stamp(local, record) {
            tracing::warn!(path = %local.display(), error = %err, "cannot stamp directory time");
        }
        tracing::info!(path = %local.display(), "directory created");
        Ok(Outcome::Created)
    }

    fn download(&mut self, local: &Path, record: &FileRecord) -> Result<Outcome, TransferError> {
        if let Some(parent) = local.parent() {
            create_dir_all(parent)?;
        }

        let mode = self.mode_for(record);
        let name = record.transfer_name();
        let bytes = match self.manager.retrieve(&record.parent, &name, mode) {
            Ok(bytes) => bytes,
            Err(SessionError::Connect(err)) => return Err(err.into()),
            Err(err) => {
                tracing::warn!(name, error = %err, "download failed");
                return Ok(Outcome::Failed);
            }
        };
        let bytes = match mode {
            TransferMode::Text => normalize_line_endings(bytes),
            TransferMode::Binary => bytes,
        };

        match commit(local, &bytes, record) {
            Ok(()) => {
                tracing::info!(path = %local.display(), size = bytes.len(), "file created");
                Ok(Outcome::Created)
            }
            Err(err) => {
                // The staging file, if any, stays behind for inspection.
                tracing::warn!(path = %local.display(), error = %err, "commit failed");
                Ok(Outcome::Failed)
            }
        }
    }

    /// Reapplies a directory record's timestamp.
    ///
    /// Materializing a child file updates the parent directory's mtime,
    /// which would fail the skip check on the next run. Callers reapply
    /// directory stamps once all transfers under them are done.
    pub fn restamp(&self, record: &FileRecord) {
        if !record.is_dir() {
            return;
        }
        let local = self.layout.local_path(record);
        if let Err(err) = stamp(&local, record) {
            tracing::warn!(path = %local.display(), error = %err, "cannot restamp directory time");
        }
    }

    fn mode_for(&self, record: &FileRecord) -> TransferMode {
        let is_text = self
            .text_extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(&record.extension));
        if is_text {
            TransferMode::Text
        } else {
            TransferMode::Binary
        }
    }
}

/// Whether the local copy already carries the record's timestamp.
///
/// Exact equality, sentinel included: a record whose creation time is
/// unknown stamps zero and matches zero on the next run.
fn is_current(local: &Path, record: &FileRecord) -> bool {
    let Ok(meta) = fs::metadata(local) else {
        return false;
    };
    if meta.is_dir() != record.is_dir() {
        return false;
    }
    FileTime::from_last_modification_time(&meta).unix_seconds() == record.created
}

fn create_dir_all(path: &Path) -> Result<(), TransferError> {
    fs::create_dir_all(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            TransferError::DirPermission {
                path: path.to_path_buf(),
                source,
            }
        } else {
            TransferError::DirInvalid {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn staging_path(local: &Path) -> PathBuf {
    let mut name = local.file_name().unwrap_or_default().to_os_string();
    name.push(STAGING_SUFFIX);
    local.with_file_name(name)
}

/// Writes, flushes, renames, stamps.
fn commit(local: &Path, bytes: &[u8], record: &FileRecord) -> std::io::Result<()> {
    let staging = staging_path(local);
    let mut file = fs::File::create(&staging)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&staging, local)?;
    stamp(local, record)
}

fn stamp(local: &Path, record: &FileRecord) -> std::io::Result<()> {
    filetime::set_file_mtime(local, FileTime::from_unix_time(record.created, 0))
}

/// Collapses CRLF pairs to bare newlines. Lone carriage returns are
/// data and stay put.
fn normalize_line_endings(bytes: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied().peekable();
    while let Some(byte) = iter.next() {
        if byte == b'\r' && iter.peek() == Some(&b'\n') {
            continue;
        }
        out.push(byte);
    }
    out
}
