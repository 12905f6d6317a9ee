//! Session error taxonomy.
//!
//! Connection establishment failures are fatal to the whole run and map
//! onto the legacy status codes. Command failures split three ways:
//! a deadline expiry or a broken channel costs the session, while a
//! plain server rejection leaves it usable.

use std::time::Duration;

use base::{ExitCode, HasExitCode};
use thiserror::Error;

/// Failure to establish an authenticated session.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The TCP connection could not be established.
    #[error("connection to {host} refused: {detail}")]
    Refused {
        /// Host that was dialed.
        host: String,
        /// Underlying failure text.
        detail: String,
    },

    /// The server rejected the supplied credentials.
    #[error("login rejected for {username}: {detail}")]
    AuthRejected {
        /// User name that was presented.
        username: String,
        /// Server rejection text.
        detail: String,
    },

    /// The connection opened but the exchange before login failed.
    #[error("handshake with {host} failed: {detail}")]
    Handshake {
        /// Host that was dialed.
        host: String,
        /// Underlying failure text.
        detail: String,
    },
}

impl HasExitCode for ConnectError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Refused { .. } => ExitCode::ConnectionRefused,
            Self::AuthRejected { .. } => ExitCode::AuthRejected,
            Self::Handshake { .. } => ExitCode::Failure,
        }
    }
}

/// Failure of one remote command as reported by a client.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The server answered with a refusal; the control channel is still
    /// in sync and the session may keep serving commands.
    #[error("server rejected command: {0}")]
    Rejected(String),

    /// The control channel broke mid-command; the session is unusable.
    #[error("control channel lost: {0}")]
    Lost(String),
}

/// Failure of a managed session operation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reconnecting for this command failed; fatal to the run.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The command exceeded its deadline. The session was abandoned
    /// mid-command and the next operation reconnects.
    #[error("remote command exceeded its {0:?} deadline")]
    Expired(Duration),

    /// The control channel broke; the next operation reconnects.
    #[error("session lost: {0}")]
    Lost(String),

    /// The server refused the command; the session stays open.
    #[error("server rejected command: {0}")]
    Rejected(String),
}

impl SessionError {
    /// Whether the whole run must stop rather than retry elsewhere.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Connect(_))
    }
}

impl HasExitCode for SessionError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Connect(err) => err.exit_code(),
            Self::Expired(_) | Self::Lost(_) | Self::Rejected(_) => ExitCode::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_errors_map_to_legacy_codes() {
        let refused = ConnectError::Refused {
            host: "vax.example.com".to_owned(),
            detail: "connection refused".to_owned(),
        };
        assert_eq!(refused.exit_code(), ExitCode::ConnectionRefused);

        let auth = ConnectError::AuthRejected {
            username: "FIELD".to_owned(),
            detail: "530 Login incorrect".to_owned(),
        };
        assert_eq!(auth.exit_code(), ExitCode::AuthRejected);
    }

    #[test]
    fn only_connect_failures_are_fatal() {
        let fatal = SessionError::Connect(ConnectError::Handshake {
            host: "vax.example.com".to_owned(),
            detail: "garbled banner".to_owned(),
        });
        assert!(fatal.is_fatal());
        assert!(!SessionError::Expired(Duration::from_secs(1)).is_fatal());
        assert!(!SessionError::Lost("reset by peer".to_owned()).is_fatal());
        assert!(!SessionError::Rejected("550".to_owned()).is_fatal());
    }
}
