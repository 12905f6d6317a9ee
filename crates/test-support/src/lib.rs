#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! In-memory remote server for exercising sync logic without a network.
//!
//! [`FakeServer`] holds a scripted directory tree behind a mutex;
//! [`FakeConnector`] hands out any number of sessions over it, so
//! reconnect-after-timeout paths behave like the real thing: state set
//! up once is visible to every session, and counters record what each
//! command actually did.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use session::{CommandError, Connect, ConnectError, RemoteClient, TransferMode};

/// How long a hanging command sleeps. Longer than the shortest
/// whole-second deadline a run configuration can express, so a hang
/// reliably outlasts it.
const HANG: Duration = Duration::from_millis(1500);

/// One scripted remote directory.
#[derive(Debug, Default)]
struct DirScript {
    listing: Vec<String>,
    names: Vec<String>,
    hang_list: bool,
    hang_name_list: bool,
    reject_change: bool,
}

/// Counters and command log shared by all sessions of one server.
#[derive(Debug, Default)]
struct Counters {
    connects: usize,
    change_dirs: usize,
    lists: usize,
    name_lists: usize,
    retrievals: Vec<(String, String, TransferMode)>,
}

#[derive(Debug, Default)]
struct State {
    dirs: HashMap<String, DirScript>,
    files: HashMap<(String, String), Vec<u8>>,
    reject_login: bool,
    refuse_connect: bool,
    counters: Counters,
}

/// Scripted in-memory remote server.
#[derive(Debug, Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<State>>,
}

impl FakeServer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty directory.
    pub fn add_dir(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .dirs
            .entry(path.to_owned())
            .or_default();
    }

    /// Appends one physical line to a directory's metadata listing.
    pub fn add_listing_line(&self, path: &str, line: &str) {
        self.state
            .lock()
            .unwrap()
            .dirs
            .entry(path.to_owned())
            .or_default()
            .listing
            .push(line.to_owned());
    }

    /// Sets a directory's name-only listing.
    pub fn set_names(&self, path: &str, names: &[&str]) {
        self.state
            .lock()
            .unwrap()
            .dirs
            .entry(path.to_owned())
            .or_default()
            .names = names.iter().map(|n| (*n).to_owned()).collect();
    }

    /// Stores file content retrievable as `name` (with explicit version
    /// suffix) from directory `dir`.
    pub fn add_file(&self, dir: &str, name: &str, bytes: &[u8]) {
        self.add_dir(dir);
        self.state
            .lock()
            .unwrap()
            .files
            .insert((dir.to_owned(), name.to_owned()), bytes.to_vec());
    }

    /// Makes the metadata listing of `path` hang past any deadline.
    pub fn hang_list(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .dirs
            .entry(path.to_owned())
            .or_default()
            .hang_list = true;
    }

    /// Makes the name-only listing of `path` hang past any deadline.
    pub fn hang_name_list(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .dirs
            .entry(path.to_owned())
            .or_default()
            .hang_name_list = true;
    }

    /// Makes directory changes into `path` fail with a negative reply.
    pub fn reject_change_dir(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .dirs
            .entry(path.to_owned())
            .or_default()
            .reject_change = true;
    }

    /// Makes every future connection attempt fail at the TCP level.
    pub fn refuse_connections(&self) {
        self.state.lock().unwrap().refuse_connect = true;
    }

    /// Makes every future login attempt fail.
    pub fn reject_logins(&self) {
        self.state.lock().unwrap().reject_login = true;
    }

    /// Connector handing out sessions over this server.
    #[must_use]
    pub fn connector(&self) -> FakeConnector {
        FakeConnector {
            state: Arc::clone(&self.state),
        }
    }

    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.state.lock().unwrap().counters.connects
    }

    #[must_use]
    pub fn change_dir_count(&self) -> usize {
        self.state.lock().unwrap().counters.change_dirs
    }

    #[must_use]
    pub fn list_count(&self) -> usize {
        self.state.lock().unwrap().counters.lists
    }

    #[must_use]
    pub fn name_list_count(&self) -> usize {
        self.state.lock().unwrap().counters.name_lists
    }

    /// Every retrieval performed, as `(dir, name, mode)` in order.
    #[must_use]
    pub fn retrievals(&self) -> Vec<(String, String, TransferMode)> {
        self.state.lock().unwrap().counters.retrievals.clone()
    }

    #[must_use]
    pub fn retrieval_count(&self) -> usize {
        self.state.lock().unwrap().counters.retrievals.len()
    }
}

/// Builds one complete listing line in the server's output format.
#[must_use]
pub fn listing_line(name_and_version: &str, blocks: u64, stamp: &str) -> String {
    format!("{name_and_version:<24} {blocks}/{blocks}  {stamp}  [SYSTEM]  (RWED,RWED,RE,)")
}

/// Connector for [`FakeServer`] sessions.
#[derive(Debug, Clone)]
pub struct FakeConnector {
    state: Arc<Mutex<State>>,
}

impl Connect for FakeConnector {
    type Client = FakeSession;

    fn connect(&self) -> Result<FakeSession, ConnectError> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_connect {
            return Err(ConnectError::Refused {
                host: "fake".to_owned(),
                detail: "connection refused".to_owned(),
            });
        }
        if state.reject_login {
            return Err(ConnectError::AuthRejected {
                username: "fake".to_owned(),
                detail: "530 Login incorrect".to_owned(),
            });
        }
        state.counters.connects += 1;
        Ok(FakeSession {
            state: Arc::clone(&self.state),
            cwd: None,
        })
    }
}

/// One session over a [`FakeServer`].
#[derive(Debug)]
pub struct FakeSession {
    state: Arc<Mutex<State>>,
    cwd: Option<String>,
}

impl FakeSession {
    fn cwd(&self) -> Result<String, CommandError> {
        self.cwd
            .clone()
            .ok_or_else(|| CommandError::Rejected("550 no working directory".to_owned()))
    }
}

impl RemoteClient for FakeSession {
    fn change_dir(&mut self, path: &str) -> Result<(), CommandError> {
        let mut state = self.state.lock().unwrap();
        state.counters.change_dirs += 1;
        match state.dirs.get(path) {
            Some(dir) if !dir.reject_change => {
                self.cwd = Some(path.to_owned());
                Ok(())
            }
            _ => Err(CommandError::Rejected(format!("550 {path}: no such directory"))),
        }
    }

    fn list(&mut self) -> Result<Vec<String>, CommandError> {
        let cwd = self.cwd()?;
        let (hang, listing) = {
            let mut state = self.state.lock().unwrap();
            state.counters.lists += 1;
            let dir = state
                .dirs
                .get(&cwd)
                .ok_or_else(|| CommandError::Lost("directory vanished".to_owned()))?;
            (dir.hang_list, dir.listing.clone())
        };
        if hang {
            // Sleep outside the lock; the abandoning caller must be able
            // to reconnect while this worker is still stuck.
            thread::sleep(HANG);
        }
        Ok(listing)
    }

    fn name_list(&mut self) -> Result<Vec<String>, CommandError> {
        let cwd = self.cwd()?;
        let (hang, names) = {
            let mut state = self.state.lock().unwrap();
            state.counters.name_lists += 1;
            let dir = state
                .dirs
                .get(&cwd)
                .ok_or_else(|| CommandError::Lost("directory vanished".to_owned()))?;
            (dir.hang_name_list, dir.names.clone())
        };
        if hang {
            thread::sleep(HANG);
        }
        Ok(names)
    }

    fn retrieve(&mut self, name: &str, mode: TransferMode) -> Result<Vec<u8>, CommandError> {
        let cwd = self.cwd()?;
        let mut state = self.state.lock().unwrap();
        state
            .counters
            .retrievals
            .push((cwd.clone(), name.to_owned(), mode));
        state
            .files
            .get(&(cwd, name.to_owned()))
            .cloned()
            .ok_or_else(|| CommandError::Rejected(format!("550 {name}: no such file")))
    }

    fn quit(&mut self) -> Result<(), CommandError> {
        Ok(())
    }
}
