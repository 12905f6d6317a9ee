#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Run orchestration: discover, then materialize, then report.
//!
//! [`runner::SyncRunner`] ties the crawler and the transfer engine
//! together over one managed session and narrates the run to a
//! caller-supplied observer, one progress event per manifest record and
//! a terminal completion event in every case, fatal failures included.

pub mod runner;

pub use runner::{FatalError, RunSummary, SyncRunner};
