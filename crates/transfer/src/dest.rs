//! Remote-to-local path mapping.

use std::path::{Path, PathBuf};

use protocol::FileRecord;

/// Maps records under one remote root to paths under one local root.
#[derive(Debug, Clone)]
pub struct DestinationLayout {
    remote_root: String,
    local_root: PathBuf,
}

impl DestinationLayout {
    /// Creates a layout mirroring `remote_root` into `local_root`.
    #[must_use]
    pub fn new(remote_root: &str, local_root: &Path) -> Self {
        Self {
            remote_root: remote_root.trim_end_matches('/').to_owned(),
            local_root: local_root.to_path_buf(),
        }
    }

    /// Local path a record materializes at.
    ///
    /// The remote root prefix is stripped from the record's parent, so
    /// `/DISK0/ARCHIVE/SUB` under root `/DISK0/ARCHIVE` lands in
    /// `<local>/SUB`. Version 1 keeps the plain file name; older
    /// revisions get the version spliced in before the extension, e.g.
    /// `PAYROLL;2.DAT`, so every revision has a distinct local name.
    #[must_use]
    pub fn local_path(&self, record: &FileRecord) -> PathBuf {
        let mut path = self.local_root.clone();
        for part in self.relative_dir(&record.parent).split('/') {
            if !part.is_empty() {
                path.push(part);
            }
        }
        path.push(Self::local_name(record));
        path
    }

    fn relative_dir<'a>(&self, parent: &'a str) -> &'a str {
        parent
            .strip_prefix(&self.remote_root)
            .unwrap_or(parent)
            .trim_start_matches('/')
    }

    fn local_name(record: &FileRecord) -> String {
        if record.is_dir() || record.version == 1 {
            record.remote_name()
        } else {
            format!("{};{}{}", record.name, record.version, record.extension)
        }
    }
}
