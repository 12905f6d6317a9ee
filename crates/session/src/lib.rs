#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Remote session management for vmsync.
//!
//! [`client::RemoteClient`] is the seam between the sync logic and the
//! wire: the production implementation speaks FTP, tests substitute
//! in-memory fakes. [`manager::ConnectionManager`] wraps a client with
//! per-command deadlines, lazy reconnection, and a working-directory
//! cache, so callers never handle a raw control channel.

pub mod client;
pub mod error;
pub mod manager;

pub use client::{Connect, FtpConnector, FtpSession, RemoteClient, TransferMode};
pub use error::{CommandError, ConnectError, SessionError};
pub use manager::{ConnectionManager, SessionTimeouts};
