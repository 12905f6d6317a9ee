//! Deadline-supervised session ownership.
//!
//! [`ConnectionManager`] is the only holder of a live session. Every
//! command runs under its own wall-clock deadline; an expiry or a broken
//! channel discards the session and the next command transparently
//! reconnects through the stored connector. Callers therefore see at
//! most one fatal error class, connection establishment, and can treat
//! everything else as retryable per-branch noise.

use std::time::Duration;

use base::config::SyncConfig;
use base::deadline::{DeadlineError, supervise};

use crate::client::{Connect, RemoteClient, TransferMode};
use crate::error::{CommandError, ConnectError, SessionError};

/// Per-command deadlines.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimeouts {
    /// Deadline for a directory change.
    pub change_dir: Duration,
    /// Deadline for a full metadata listing.
    pub list: Duration,
    /// Deadline for a degraded name-only listing.
    pub degraded_list: Duration,
    /// Deadline for one file download.
    pub transfer: Duration,
}

impl SessionTimeouts {
    /// Reads all four deadlines from the run configuration.
    #[must_use]
    pub const fn from_config(config: &SyncConfig) -> Self {
        Self {
            change_dir: config.change_dir_deadline(),
            list: config.list_deadline(),
            degraded_list: config.degraded_list_deadline(),
            transfer: config.transfer_deadline(),
        }
    }
}

/// Owner of the remote session, with lazy reconnection and a
/// working-directory cache.
///
/// The cache suppresses redundant directory changes: a change to the
/// directory the session is already in is a no-op. The cache empties
/// whenever the session is lost, so a fresh session never inherits a
/// stale working directory.
pub struct ConnectionManager<C: Connect> {
    connector: C,
    timeouts: SessionTimeouts,
    session: Option<C::Client>,
    cwd: Option<String>,
}

impl<C: Connect> ConnectionManager<C> {
    /// Creates a manager; no connection is made until the first command.
    #[must_use]
    pub fn new(connector: C, timeouts: SessionTimeouts) -> Self {
        Self {
            connector,
            timeouts,
            session: None,
            cwd: None,
        }
    }

    /// The deadlines this manager applies.
    #[must_use]
    pub const fn timeouts(&self) -> &SessionTimeouts {
        &self.timeouts
    }

    /// Eagerly establishes the session, so credential and reachability
    /// problems surface before any work is attempted.
    ///
    /// # Errors
    ///
    /// Any [`ConnectError`] is fatal to the run.
    pub fn open(&mut self) -> Result<(), ConnectError> {
        if self.session.is_none() {
            self.session = Some(self.connector.connect()?);
            self.cwd = None;
        }
        Ok(())
    }

    /// Changes the remote working directory, served from the cache when
    /// the session is already there.
    ///
    /// # Errors
    ///
    /// See [`SessionError`]; on any error the cache stays empty.
    pub fn change_dir(&mut self, path: &str) -> Result<(), SessionError> {
        if self.session.is_some() && self.cwd.as_deref() == Some(path) {
            return Ok(());
        }
        self.cwd = None;
        let target = path.to_owned();
        self.run(self.timeouts.change_dir, move |client| {
            client.change_dir(&target)
        })?;
        self.cwd = Some(path.to_owned());
        Ok(())
    }

    /// Full metadata listing of `path`.
    ///
    /// # Errors
    ///
    /// See [`SessionError`].
    pub fn list(&mut self, path: &str) -> Result<Vec<String>, SessionError> {
        self.change_dir(path)?;
        self.run(self.timeouts.list, |client| client.list())
    }

    /// Name-only listing of `path`, under its own (typically more
    /// generous per-byte) deadline.
    ///
    /// # Errors
    ///
    /// See [`SessionError`].
    pub fn name_list(&mut self, path: &str) -> Result<Vec<String>, SessionError> {
        self.change_dir(path)?;
        self.run(self.timeouts.degraded_list, |client| client.name_list())
    }

    /// Downloads `name` from directory `dir` into memory.
    ///
    /// # Errors
    ///
    /// See [`SessionError`].
    pub fn retrieve(
        &mut self,
        dir: &str,
        name: &str,
        mode: TransferMode,
    ) -> Result<Vec<u8>, SessionError> {
        self.change_dir(dir)?;
        let name = name.to_owned();
        self.run(self.timeouts.transfer, move |client| {
            client.retrieve(&name, mode)
        })
    }

    /// Ends the session politely. The farewell itself runs under the
    /// directory-change deadline; a peer that no longer answers cannot
    /// stall shutdown.
    pub fn close(&mut self) {
        self.cwd = None;
        if let Some(session) = self.session.take() {
            let _ = supervise(self.timeouts.change_dir, session, |client| {
                let _ = client.quit();
            });
        }
    }

    /// Runs one command against the session under `limit`, reconnecting
    /// first if no session is held.
    fn run<T, F>(&mut self, limit: Duration, op: F) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: FnOnce(&mut C::Client) -> Result<T, CommandError> + Send + 'static,
    {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                tracing::debug!("no live session, reconnecting");
                self.cwd = None;
                self.connector.connect()?
            }
        };
        match supervise(limit, session, op) {
            Ok((session, Ok(value))) => {
                self.session = Some(session);
                Ok(value)
            }
            Ok((session, Err(CommandError::Rejected(reply)))) => {
                self.session = Some(session);
                Err(SessionError::Rejected(reply))
            }
            Ok((_, Err(CommandError::Lost(detail)))) => {
                self.cwd = None;
                tracing::warn!(%detail, "session lost mid-command");
                Err(SessionError::Lost(detail))
            }
            Err(DeadlineError::Expired(limit)) => {
                // The worker still owns the session; it is gone for good.
                self.cwd = None;
                tracing::warn!(?limit, "remote command abandoned on deadline");
                Err(SessionError::Expired(limit))
            }
            Err(DeadlineError::Spawn(err)) => {
                self.cwd = None;
                Err(SessionError::Lost(err.to_string()))
            }
        }
    }
}

impl<C: Connect> Drop for ConnectionManager<C> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[derive(Default)]
    struct Script {
        connects: usize,
        cwd_calls: Vec<String>,
        list_calls: usize,
        quit_calls: usize,
    }

    #[derive(Default)]
    struct Behavior {
        hang_list: AtomicBool,
        reject_cwd: AtomicBool,
        lose_list: AtomicBool,
    }

    struct FakeClient {
        script: Arc<Mutex<Script>>,
        behavior: Arc<Behavior>,
    }

    impl RemoteClient for FakeClient {
        fn change_dir(&mut self, path: &str) -> Result<(), CommandError> {
            self.script.lock().unwrap().cwd_calls.push(path.to_owned());
            if self.behavior.reject_cwd.load(Ordering::SeqCst) {
                return Err(CommandError::Rejected("550 no such directory".to_owned()));
            }
            Ok(())
        }

        fn list(&mut self) -> Result<Vec<String>, CommandError> {
            self.script.lock().unwrap().list_calls += 1;
            if self.behavior.hang_list.load(Ordering::SeqCst) {
                // Sleep without holding the lock so the test can observe
                // the abandoned worker.
                thread::sleep(Duration::from_millis(300));
            }
            if self.behavior.lose_list.load(Ordering::SeqCst) {
                return Err(CommandError::Lost("reset by peer".to_owned()));
            }
            Ok(vec!["LINE".to_owned()])
        }

        fn name_list(&mut self) -> Result<Vec<String>, CommandError> {
            Ok(vec!["NAME.TXT;1".to_owned()])
        }

        fn retrieve(&mut self, _name: &str, _mode: TransferMode) -> Result<Vec<u8>, CommandError> {
            Ok(b"data".to_vec())
        }

        fn quit(&mut self) -> Result<(), CommandError> {
            self.script.lock().unwrap().quit_calls += 1;
            Ok(())
        }
    }

    struct FakeConnector {
        script: Arc<Mutex<Script>>,
        behavior: Arc<Behavior>,
    }

    impl Connect for FakeConnector {
        type Client = FakeClient;

        fn connect(&self) -> Result<FakeClient, ConnectError> {
            self.script.lock().unwrap().connects += 1;
            Ok(FakeClient {
                script: Arc::clone(&self.script),
                behavior: Arc::clone(&self.behavior),
            })
        }
    }

    fn timeouts() -> SessionTimeouts {
        SessionTimeouts {
            change_dir: Duration::from_secs(1),
            list: Duration::from_millis(50),
            degraded_list: Duration::from_secs(1),
            transfer: Duration::from_secs(1),
        }
    }

    fn manager() -> (
        ConnectionManager<FakeConnector>,
        Arc<Mutex<Script>>,
        Arc<Behavior>,
    ) {
        let script = Arc::new(Mutex::new(Script::default()));
        let behavior = Arc::new(Behavior::default());
        let connector = FakeConnector {
            script: Arc::clone(&script),
            behavior: Arc::clone(&behavior),
        };
        (ConnectionManager::new(connector, timeouts()), script, behavior)
    }

    #[test]
    fn repeated_directory_is_served_from_cache() {
        let (mut manager, script, _) = manager();
        manager.list("/DISK0/A").unwrap();
        manager.list("/DISK0/A").unwrap();
        let script = script.lock().unwrap();
        assert_eq!(script.connects, 1);
        assert_eq!(script.cwd_calls, vec!["/DISK0/A"]);
        assert_eq!(script.list_calls, 2);
    }

    #[test]
    fn new_directory_issues_a_change() {
        let (mut manager, script, _) = manager();
        manager.list("/DISK0/A").unwrap();
        manager.list("/DISK0/B").unwrap();
        assert_eq!(
            script.lock().unwrap().cwd_calls,
            vec!["/DISK0/A", "/DISK0/B"]
        );
    }

    #[test]
    fn rejection_keeps_the_session_alive() {
        let (mut manager, script, behavior) = manager();
        behavior.reject_cwd.store(true, Ordering::SeqCst);
        let err = manager.change_dir("/DISK0/MISSING").unwrap_err();
        assert!(matches!(err, SessionError::Rejected(_)));

        behavior.reject_cwd.store(false, Ordering::SeqCst);
        manager.list("/DISK0/A").unwrap();
        // No reconnect happened.
        assert_eq!(script.lock().unwrap().connects, 1);
    }

    #[test]
    fn deadline_expiry_discards_the_session() {
        let (mut manager, script, behavior) = manager();
        manager.list("/DISK0/A").unwrap();

        behavior.hang_list.store(true, Ordering::SeqCst);
        let err = manager.list("/DISK0/A").unwrap_err();
        assert!(matches!(err, SessionError::Expired(_)));

        behavior.hang_list.store(false, Ordering::SeqCst);
        manager.list("/DISK0/A").unwrap();
        let script = script.lock().unwrap();
        assert_eq!(script.connects, 2);
        // The fresh session re-issued the directory change.
        assert_eq!(script.cwd_calls, vec!["/DISK0/A", "/DISK0/A"]);
    }

    #[test]
    fn lost_channel_forces_reconnect() {
        let (mut manager, script, behavior) = manager();
        behavior.lose_list.store(true, Ordering::SeqCst);
        let err = manager.list("/DISK0/A").unwrap_err();
        assert!(matches!(err, SessionError::Lost(_)));

        behavior.lose_list.store(false, Ordering::SeqCst);
        manager.list("/DISK0/A").unwrap();
        assert_eq!(script.lock().unwrap().connects, 2);
    }

    #[test]
    fn close_sends_quit_once() {
        let (mut manager, script, _) = manager();
        manager.open().unwrap();
        manager.close();
        manager.close();
        assert_eq!(script.lock().unwrap().quit_calls, 1);
    }

    #[test]
    fn open_is_idempotent() {
        let (mut manager, script, _) = manager();
        manager.open().unwrap();
        manager.open().unwrap();
        assert_eq!(script.lock().unwrap().connects, 1);
    }

    #[test]
    fn retrieve_changes_into_the_directory_first() {
        let (mut manager, script, _) = manager();
        let bytes = manager
            .retrieve("/DISK0/A", "PAYROLL.DAT;3", TransferMode::Binary)
            .unwrap();
        assert_eq!(bytes, b"data");
        assert_eq!(script.lock().unwrap().cwd_calls, vec!["/DISK0/A"]);
    }
}
