//! Stateful parser for VMS directory-listing output.
//!
//! The server may split one logical entry across two physical lines
//! when the filename column overflows. A line is complete only when it
//! contains the parenthesized protection segment; an incomplete line is
//! buffered and prepended to the next one before re-parsing.
//!
//! Unparseable lines are skipped, never fatal: the listing format has
//! trailers and banners this tool has no business understanding.

use chrono::NaiveDateTime;

use crate::record::{DIRECTORY_MARKER, FileRecord, RecordKind, UNKNOWN_CREATION};

/// Timestamp layout used by the listing, e.g. `19-JAN-1994 14:32:11`.
const TIMESTAMP_FORMAT: &str = "%d-%b-%Y %H:%M:%S";

/// Bytes per allocation block in the `used/allocated` size column.
const BLOCK_SIZE: u64 = 512;

/// Line parser with two-line carry-over state.
///
/// Feed every physical line of one listing call, in order, to
/// [`parse_line`](Self::parse_line). Create a fresh parser (or call
/// [`reset`](Self::reset)) for every listing call so a truncated
/// fragment cannot leak across directories or listing retries.
#[derive(Debug, Default)]
pub struct ListingParser {
    carry: Option<String>,
}

impl ListingParser {
    /// Creates a parser with empty carry-over state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards any buffered line fragment.
    pub fn reset(&mut self) {
        self.carry = None;
    }

    /// Parses one physical line of listing output.
    ///
    /// Returns `None` for header/footer lines, buffered fragments, and
    /// anything that fails to tokenize.
    ///
    /// # Examples
    ///
    /// ```
    /// use protocol::ListingParser;
    ///
    /// let mut parser = ListingParser::new();
    /// let record = parser
    ///     .parse_line(
    ///         "PAYROLL.DAT;3  18/20  19-JAN-1994 14:32:11  [SYSTEM]  (RWED,RWED,RE,)",
    ///         "/DISK0/ARCHIVE",
    ///     )
    ///     .unwrap();
    /// assert_eq!(record.name, "PAYROLL");
    /// assert_eq!(record.version, 3);
    /// ```
    pub fn parse_line(&mut self, line: &str, parent: &str) -> Option<FileRecord> {
        if line.trim().is_empty() || line.starts_with("Directory") || line.starts_with("Total") {
            return None;
        }

        // No protection segment yet: the entry continues on the next line.
        if !line.contains('(') && !line.contains(')') {
            self.carry = Some(line.to_owned());
            return None;
        }

        let assembled = match self.carry.take() {
            Some(previous) => format!("{previous}{line}"),
            None => line.to_owned(),
        };
        tokenize(&assembled, parent)
    }
}

/// Parses a bare name from a degraded (name-only) listing.
///
/// The result carries the unknown-timestamp sentinel and no size, since
/// a name-only listing provides no metadata.
#[must_use]
pub fn parse_name_only(name: &str, parent: &str) -> Option<FileRecord> {
    let mut record = tokenize(name, parent)?;
    record.created = UNKNOWN_CREATION;
    record.size = 0;
    Some(record)
}

/// Tokenizes a complete listing entry into a record.
fn tokenize(entry: &str, parent: &str) -> Option<FileRecord> {
    let tokens: Vec<&str> = entry.split_whitespace().collect();
    let first = tokens.first()?;
    let (raw_name, raw_version) = first.split_once(';')?;
    let version: u32 = raw_version.parse().ok()?;
    if version == 0 {
        return None;
    }

    let (name, extension, kind) = split_name(raw_name)?;
    // Directory revisions are not meaningful; the entry names the
    // directory itself.
    let version = match kind {
        RecordKind::Directory => 1,
        RecordKind::File => version,
    };

    let size = tokens
        .get(1)
        .and_then(|t| t.split('/').next())
        .and_then(|blocks| blocks.parse::<u64>().ok())
        .map_or(0, |blocks| blocks * BLOCK_SIZE);

    let created = if tokens.len() >= 4 {
        parse_timestamp(tokens[2], tokens[3])?
    } else {
        UNKNOWN_CREATION
    };

    Some(FileRecord {
        parent: parent.to_owned(),
        name,
        extension,
        version,
        size,
        created,
        kind,
    })
}

/// Splits a raw listing name into base, extension, and kind.
///
/// The directory marker is detected before the rightmost-dot split and
/// stripped entirely; `SUBDIR.DIR` stores name `SUBDIR` with an empty
/// extension.
fn split_name(raw: &str) -> Option<(String, String, RecordKind)> {
    if let Some(stripped) = raw.strip_suffix(DIRECTORY_MARKER) {
        if stripped.is_empty() {
            return None;
        }
        return Some((stripped.to_owned(), String::new(), RecordKind::Directory));
    }
    match raw.rfind('.') {
        Some(0) | None => {
            if raw.is_empty() {
                None
            } else {
                Some((raw.to_owned(), String::new(), RecordKind::File))
            }
        }
        Some(dot) => Some((
            raw[..dot].to_owned(),
            raw[dot..].to_owned(),
            RecordKind::File,
        )),
    }
}

/// Combines the date and time tokens into epoch seconds (UTC).
fn parse_timestamp(date: &str, time: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}
