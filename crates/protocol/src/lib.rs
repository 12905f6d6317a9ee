#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Wire-format knowledge for vmsync: the VMS directory-listing text
//! format and the structured records parsed out of it.
//!
//! The listing format is non-standard and line-oriented. One logical
//! entry looks like:
//!
//! ```text
//! PAYROLL.DAT;3        18/20      19-JAN-1994 14:32:11  [SYSTEM]   (RWED,RWED,RE,)
//! ```
//!
//! and may be split across two physical lines when the name column
//! overflows. [`parser::ListingParser`] handles the reassembly;
//! [`record::FileRecord`] is the parsed result.

pub mod parser;
pub mod record;

pub use parser::{ListingParser, parse_name_only};
pub use record::{FileRecord, RecordKind, join_remote};
