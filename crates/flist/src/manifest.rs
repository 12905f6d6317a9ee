//! Ordered collection of records discovered by one crawl.

use protocol::FileRecord;

/// Everything one run intends to mirror, in mirror order: a parent
/// directory's own entries come before any subdirectory's contents, and
/// subdirectories are visited in listing order. Materializing records
/// front to back therefore never needs a local parent that has not been
/// created yet.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    records: Vec<FileRecord>,
}

impl Manifest {
    /// Wraps records already in mirror order.
    #[must_use]
    pub fn new(records: Vec<FileRecord>) -> Self {
        Self { records }
    }

    /// Number of records, directories included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when the crawl found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in mirror order.
    #[must_use]
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Number of file (non-directory) records.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_dir()).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.records.iter()
    }
}

impl IntoIterator for Manifest {
    type Item = FileRecord;
    type IntoIter = std::vec::IntoIter<FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
