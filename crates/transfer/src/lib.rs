#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Local materialization of remote records.
//!
//! [`dest::DestinationLayout`] maps a remote record to its local path;
//! [`engine::TransferEngine`] brings the local side up to date: skip
//! when the stamped timestamp already matches, otherwise download into
//! a staging file and commit with an atomic rename. Interrupting a run
//! never leaves a half-written file under a final name.

pub mod dest;
pub mod engine;
pub mod error;

pub use dest::DestinationLayout;
pub use engine::{Outcome, TransferEngine};
pub use error::TransferError;
