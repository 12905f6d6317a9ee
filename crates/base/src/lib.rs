#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Shared primitives for the vmsync workspace.
//!
//! This crate carries the pieces every other crate needs but none owns:
//! the [`exit_code`] table surfaced to the caller, the [`config`]
//! structure populated from `config.json`, the [`deadline`] supervisor
//! that bounds blocking remote calls, and the typed [`event`] stream the
//! orchestrator reports through.

pub mod config;
pub mod deadline;
pub mod event;
pub mod exit_code;

pub use config::SyncConfig;
pub use deadline::supervise;
pub use event::SyncEvent;
pub use exit_code::{ExitCode, HasExitCode};
