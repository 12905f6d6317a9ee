//! Structured remote filesystem entries.

/// Extension the server uses to mark directory entries in a listing.
///
/// Case-sensitive, exact match; `SUBDIR.dir` would be treated as a file.
pub const DIRECTORY_MARKER: &str = ".DIR";

/// Sentinel creation time meaning "timestamp unknown".
///
/// Produced when a degraded listing provides no dates; roundtrips
/// through the local mtime stamp so repeated runs still skip.
pub const UNKNOWN_CREATION: i64 = 0;

/// Whether a record names a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A plain file, eligible for byte transfer.
    File,
    /// A directory, never passed to byte-transfer logic.
    Directory,
}

/// One parsed remote filesystem entry.
///
/// `(parent, name, extension, version)` uniquely identifies a record
/// within one crawl; multiple versions of the same name may coexist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Remote directory the entry belongs to (absolute, `/`-separated).
    pub parent: String,
    /// Base name without extension or version suffix.
    pub name: String,
    /// Extension including the leading dot, empty for extensionless
    /// names. The directory marker is stripped, not stored.
    pub extension: String,
    /// Revision number from the `NAME;VERSION` syntax (≥ 1).
    pub version: u32,
    /// Size in bytes (allocation blocks × 512), 0 when unknown.
    pub size: u64,
    /// Creation time as epoch seconds, [`UNKNOWN_CREATION`] when the
    /// listing carried no dates.
    pub created: i64,
    /// File or directory.
    pub kind: RecordKind,
}

impl FileRecord {
    /// Returns `true` for directory records.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, RecordKind::Directory)
    }

    /// Remote name without version, e.g. `PAYROLL.DAT`.
    #[must_use]
    pub fn remote_name(&self) -> String {
        format!("{}{}", self.name, self.extension)
    }

    /// Name used to retrieve this exact revision, e.g. `PAYROLL.DAT;3`.
    ///
    /// The version is always explicit; a bare `RETR PAYROLL.DAT` would
    /// silently fetch the highest version even for an older record.
    #[must_use]
    pub fn transfer_name(&self) -> String {
        format!("{}{};{}", self.name, self.extension, self.version)
    }

    /// Absolute remote path of this entry, e.g. `/DISK0/ARCHIVE/SUBDIR`.
    #[must_use]
    pub fn remote_path(&self) -> String {
        join_remote(&self.parent, &self.name)
    }
}

/// Joins a remote directory and a child name with the server-native
/// separator.
#[must_use]
pub fn join_remote(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}
