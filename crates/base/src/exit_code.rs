//! Centralized status code definitions surfaced to the caller.
//!
//! The numeric values are part of the tool's external contract: the
//! completion event carries them verbatim, and the process exit status
//! is derived from them (clamped to the 0..=255 range the OS allows).

use std::fmt;

/// Status codes reported in the terminal completion event.
///
/// # Examples
///
/// ```
/// use base::exit_code::ExitCode;
///
/// let code = ExitCode::AuthRejected;
/// assert_eq!(code.as_i32(), 430);
/// assert_eq!(code.description(), "authentication rejected");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Run completed. Individual item failures do not change this.
    Ok = 0,

    /// Configuration, usage, or other unexpected failure.
    ///
    /// Not part of the remote-protocol code space; covers conditions
    /// such as an unreadable configuration file.
    Failure = 1,

    /// The server rejected the configured credentials.
    AuthRejected = 430,

    /// Local permission error while creating a destination directory.
    DirPermission = 535,

    /// Invalid local path while creating a destination directory.
    DirInvalid = 553,

    /// The remote host refused the control connection.
    ConnectionRefused = 10061,
}

impl ExitCode {
    /// Returns the numeric status code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a human-readable description of this status code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "run completed",
            Self::Failure => "unexpected failure",
            Self::AuthRejected => "authentication rejected",
            Self::DirPermission => "permission error creating directory",
            Self::DirInvalid => "directory name error",
            Self::ConnectionRefused => "connection refused",
        }
    }

    /// Returns `true` if this represents a completed run.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Creates a status code from an i32 value.
    ///
    /// Returns `None` if the value doesn't correspond to a known code.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Failure),
            430 => Some(Self::AuthRejected),
            535 => Some(Self::DirPermission),
            553 => Some(Self::DirInvalid),
            10061 => Some(Self::ConnectionRefused),
            _ => None,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        // Codes above 255 (430, 535, 10061) cannot be represented in a
        // process exit status; the completion event carries the real value.
        let value = code.as_i32().clamp(0, 255) as u8;
        Self::from(value)
    }
}

/// Trait for error types that map to a status code.
pub trait HasExitCode {
    /// Returns the status code associated with this value.
    fn exit_code(&self) -> ExitCode;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_external_contract() {
        assert_eq!(ExitCode::Ok.as_i32(), 0);
        assert_eq!(ExitCode::Failure.as_i32(), 1);
        assert_eq!(ExitCode::AuthRejected.as_i32(), 430);
        assert_eq!(ExitCode::DirPermission.as_i32(), 535);
        assert_eq!(ExitCode::DirInvalid.as_i32(), 553);
        assert_eq!(ExitCode::ConnectionRefused.as_i32(), 10061);
    }

    #[test]
    fn from_i32_roundtrips() {
        for code in [
            ExitCode::Ok,
            ExitCode::Failure,
            ExitCode::AuthRejected,
            ExitCode::DirPermission,
            ExitCode::DirInvalid,
            ExitCode::ConnectionRefused,
        ] {
            assert_eq!(ExitCode::from_i32(code.as_i32()), Some(code));
        }
    }

    #[test]
    fn from_i32_rejects_unknown() {
        assert_eq!(ExitCode::from_i32(-1), None);
        assert_eq!(ExitCode::from_i32(2), None);
        assert_eq!(ExitCode::from_i32(500), None);
    }

    #[test]
    fn is_success_only_for_ok() {
        assert!(ExitCode::Ok.is_success());
        assert!(!ExitCode::Failure.is_success());
        assert!(!ExitCode::ConnectionRefused.is_success());
    }

    #[test]
    fn display_shows_description() {
        assert_eq!(format!("{}", ExitCode::Ok), "run completed");
        assert_eq!(
            format!("{}", ExitCode::ConnectionRefused),
            "connection refused"
        );
    }

    #[test]
    fn process_exit_code_clamps_large_values() {
        // 10061 exceeds the u8 range; conversion must not panic.
        let _: std::process::ExitCode = ExitCode::ConnectionRefused.into();
        let _: std::process::ExitCode = ExitCode::Ok.into();
    }

    #[test]
    fn descriptions_are_not_empty() {
        for code in [
            ExitCode::Ok,
            ExitCode::Failure,
            ExitCode::AuthRejected,
            ExitCode::DirPermission,
            ExitCode::DirInvalid,
            ExitCode::ConnectionRefused,
        ] {
            assert!(!code.description().is_empty());
        }
    }
}
