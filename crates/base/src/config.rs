//! Run configuration loaded from `config.json`.
//!
//! Keys use camelCase to stay compatible with the configuration files
//! the legacy tool consumed. Everything beyond the connection and path
//! settings has a serde default, so a minimal file only needs
//! `hostname`, `username`, `password`, `source` and `destination`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::exit_code::{ExitCode, HasExitCode};

fn default_true() -> bool {
    true
}

fn default_list_timeout() -> u64 {
    60
}

fn default_change_dir_timeout() -> u64 {
    10
}

fn default_transfer_timeout() -> u64 {
    300
}

fn default_text_extensions() -> Vec<String> {
    vec![".TXT".to_owned(), ".LOG".to_owned(), ".COM".to_owned()]
}

/// Settings for one mirror run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Remote host to connect to (host or host:port).
    pub hostname: String,
    /// Login user name.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Remote root path to mirror from.
    pub source: String,
    /// Local root path to mirror into.
    pub destination: PathBuf,
    /// Recurse into subdirectories (default `true`).
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Fall back to a name-only listing when the full listing times out
    /// (default `false`).
    #[serde(default)]
    pub try_degraded_listing: bool,
    /// Deadline for the metadata-rich listing command, in seconds.
    #[serde(default = "default_list_timeout")]
    pub list_timeout_seconds: u64,
    /// Deadline for the degraded name-only listing command, in seconds.
    #[serde(default = "default_list_timeout")]
    pub degraded_list_timeout_seconds: u64,
    /// Deadline for a directory change, in seconds. Deliberately shorter
    /// than the listing deadlines; `CWD` is a lightweight command.
    #[serde(default = "default_change_dir_timeout")]
    pub change_dir_timeout_seconds: u64,
    /// Deadline for a single file download, in seconds.
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_seconds: u64,
    /// Extensions transferred line-oriented (server-side line-ending
    /// normalization); everything else is a raw byte stream.
    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,
    /// Raise diagnostic verbosity.
    #[serde(default)]
    pub debug: bool,
}

impl SyncConfig {
    /// Loads and deserializes a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid JSON for this shape.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Deadline for the metadata-rich listing command.
    #[must_use]
    pub const fn list_deadline(&self) -> Duration {
        Duration::from_secs(self.list_timeout_seconds)
    }

    /// Deadline for the degraded name-only listing command.
    #[must_use]
    pub const fn degraded_list_deadline(&self) -> Duration {
        Duration::from_secs(self.degraded_list_timeout_seconds)
    }

    /// Deadline for a directory change.
    #[must_use]
    pub const fn change_dir_deadline(&self) -> Duration {
        Duration::from_secs(self.change_dir_timeout_seconds)
    }

    /// Deadline for a single file download.
    #[must_use]
    pub const fn transfer_deadline(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_seconds)
    }
}

/// Failure to produce a usable [`SyncConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`SyncConfig`].
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl HasExitCode for ConfigError {
    fn exit_code(&self) -> ExitCode {
        ExitCode::Failure
    }
}
