//! Fatal transfer failures.
//!
//! Most per-file problems are absorbed as a failed outcome and the run
//! moves on. What escapes here is unrecoverable: either the remote side
//! cannot be reached at all, or the local destination tree cannot be
//! built, which would doom every remaining record the same way.

use std::path::PathBuf;

use base::{ExitCode, HasExitCode};
use session::ConnectError;
use thiserror::Error;

/// Failure that aborts the whole run.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Reconnecting for a download failed.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// A local directory could not be created for lack of permission.
    #[error("cannot create local directory {path}: permission denied")]
    DirPermission {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A local directory could not be created for any other reason,
    /// typically a path component occupied by a regular file.
    #[error("cannot create local directory {path}: {source}")]
    DirInvalid {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl HasExitCode for TransferError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Connect(err) => err.exit_code(),
            Self::DirPermission { .. } => ExitCode::DirPermission,
            Self::DirInvalid { .. } => ExitCode::DirInvalid,
        }
    }
}
