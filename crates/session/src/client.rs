//! Remote client trait and its FTP implementation.

use std::net::ToSocketAddrs;

use crate::error::{CommandError, ConnectError};

/// Default FTP control port.
const FTP_PORT: u16 = 21;

/// Representation requested for a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Raw byte stream, no translation.
    Binary,
    /// Line-oriented transfer with server-side line-ending translation.
    Text,
}

/// Blocking remote command surface.
///
/// One instance owns one authenticated control channel. All commands
/// operate relative to the session's current working directory, which
/// only [`change_dir`](Self::change_dir) moves.
///
/// The `Send + 'static` bound lets a session be moved onto a deadline
/// worker thread.
pub trait RemoteClient: Send + 'static {
    /// Changes the session's working directory.
    fn change_dir(&mut self, path: &str) -> Result<(), CommandError>;

    /// Full metadata listing of the current directory, one line per
    /// physical output line.
    fn list(&mut self) -> Result<Vec<String>, CommandError>;

    /// Name-only listing of the current directory.
    fn name_list(&mut self) -> Result<Vec<String>, CommandError>;

    /// Downloads one file from the current directory into memory.
    fn retrieve(&mut self, name: &str, mode: TransferMode) -> Result<Vec<u8>, CommandError>;

    /// Ends the session politely. Best-effort; the connection is gone
    /// either way.
    fn quit(&mut self) -> Result<(), CommandError>;
}

/// Factory for authenticated sessions, used for both the initial
/// connection and every reconnect after a lost session.
pub trait Connect {
    /// Session type produced by this connector.
    type Client: RemoteClient;

    /// Dials, authenticates, and returns a ready session.
    ///
    /// # Errors
    ///
    /// Any [`ConnectError`] is fatal to the run.
    fn connect(&self) -> Result<Self::Client, ConnectError>;
}

/// Live FTP session over one control connection.
#[derive(Debug)]
pub struct FtpSession {
    stream: ftp::FtpStream,
}

impl RemoteClient for FtpSession {
    fn change_dir(&mut self, path: &str) -> Result<(), CommandError> {
        self.stream.cwd(path).map_err(command_error)
    }

    fn list(&mut self) -> Result<Vec<String>, CommandError> {
        self.stream.list(None).map_err(command_error)
    }

    fn name_list(&mut self) -> Result<Vec<String>, CommandError> {
        self.stream.nlst(None).map_err(command_error)
    }

    fn retrieve(&mut self, name: &str, mode: TransferMode) -> Result<Vec<u8>, CommandError> {
        let file_type = match mode {
            TransferMode::Binary => ftp::types::FileType::Binary,
            TransferMode::Text => {
                ftp::types::FileType::Ascii(ftp::types::FormatControl::Default)
            }
        };
        self.stream.transfer_type(file_type).map_err(command_error)?;
        let cursor = self.stream.simple_retr(name).map_err(command_error)?;
        Ok(cursor.into_inner())
    }

    fn quit(&mut self) -> Result<(), CommandError> {
        self.stream.quit().map_err(command_error)
    }
}

/// Classifies an FTP-level failure for the session manager.
///
/// Transport errors cost the session; a negative reply with the channel
/// intact does not.
fn command_error(err: ftp::FtpError) -> CommandError {
    match err {
        ftp::FtpError::ConnectionError(io) => CommandError::Lost(io.to_string()),
        ftp::FtpError::InvalidResponse(reply) => CommandError::Rejected(reply),
        other => CommandError::Lost(other.to_string()),
    }
}

/// Connection settings for [`FtpSession`].
#[derive(Debug, Clone)]
pub struct FtpConnector {
    hostname: String,
    username: String,
    password: String,
}

impl FtpConnector {
    /// Creates a connector. `hostname` may carry an explicit `:port`;
    /// otherwise the standard control port is used.
    #[must_use]
    pub fn new(hostname: &str, username: &str, password: &str) -> Self {
        Self {
            hostname: hostname.to_owned(),
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    fn address(&self) -> String {
        if self.hostname.contains(':') {
            self.hostname.clone()
        } else {
            format!("{}:{FTP_PORT}", self.hostname)
        }
    }
}

impl Connect for FtpConnector {
    type Client = FtpSession;

    fn connect(&self) -> Result<FtpSession, ConnectError> {
        let address = self.address();
        // Resolution failures never reached the host; they are not a
        // refused connection.
        let addrs = address
            .to_socket_addrs()
            .map_err(|err| ConnectError::Handshake {
                host: self.hostname.clone(),
                detail: err.to_string(),
            })?
            .collect::<Vec<_>>();

        let mut stream =
            ftp::FtpStream::connect(addrs.as_slice()).map_err(|err| match err {
                ftp::FtpError::ConnectionError(io) => ConnectError::Refused {
                    host: self.hostname.clone(),
                    detail: io.to_string(),
                },
                other => ConnectError::Handshake {
                    host: self.hostname.clone(),
                    detail: other.to_string(),
                },
            })?;

        tracing::debug!(host = %self.hostname, "control connection established");

        stream
            .login(&self.username, &self.password)
            .map_err(|err| ConnectError::AuthRejected {
                username: self.username.clone(),
                detail: err.to_string(),
            })?;

        tracing::debug!(user = %self.username, "login accepted");
        Ok(FtpSession { stream })
    }
}
