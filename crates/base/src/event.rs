//! Typed events reported by the orchestrator.
//!
//! The core never formats output itself; it hands these values to a
//! caller-supplied observer. The CLI turns them into the JSON lines the
//! legacy tool printed.

use serde::Serialize;

use crate::exit_code::ExitCode;

/// One observable step of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncEvent {
    /// A manifest entry was processed (skipped, created, or failed).
    Progress {
        /// Entries processed so far, starting at 1.
        completed: usize,
        /// Total entries in the manifest.
        total: usize,
    },
    /// The run reached its terminal state.
    Completed {
        /// Status code for the run.
        code: ExitCode,
    },
}

impl SyncEvent {
    /// Completion fraction in `[0, 1]`.
    ///
    /// Monotonically non-decreasing over a run; the final progress event
    /// and the completion event both report `1.0`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        match self {
            Self::Progress { completed, total } => {
                if *total == 0 {
                    1.0
                } else {
                    *completed as f64 / *total as f64
                }
            }
            Self::Completed { .. } => 1.0,
        }
    }
}

impl Serialize for ExitCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.as_i32())
    }
}
