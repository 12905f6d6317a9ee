//! Wall-clock deadline supervision for blocking remote calls.
//!
//! The legacy tool armed a process-wide alarm before every remote call;
//! here the deadline is scoped to one [`supervise`] invocation: the
//! operation runs on a worker thread and the caller waits on a channel
//! with a timeout. There is no global timer to disarm, so a stale
//! deadline can never fire during unrelated later work.
//!
//! On expiry the worker thread is abandoned together with the state that
//! was moved into it. That is deliberate: a forcibly-interrupted
//! multi-line command can leave the control channel mid-response, so the
//! session must not be reused — losing it enforces the reconnect rule.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Failure of a supervised call to produce a result.
#[derive(Debug, Error)]
pub enum DeadlineError {
    /// The deadline elapsed before the operation finished. The state
    /// moved into [`supervise`] is gone with the abandoned worker.
    #[error("deadline of {0:?} expired")]
    Expired(Duration),

    /// The supervisor thread could not be spawned.
    #[error("cannot spawn deadline worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Runs `op` against `state` under a wall-clock deadline.
///
/// Returns the state together with the operation's result so the caller
/// can keep using it. A `limit` of zero disables supervision and runs
/// the operation inline.
///
/// A per-socket read timeout is not enough for the servers this tool
/// talks to: a faulty peer can trickle keepalive bytes forever. The
/// worker-thread wait bounds the whole call, mid-stream included.
///
/// # Errors
///
/// [`DeadlineError::Expired`] when the deadline elapses first; the
/// in-flight operation is abandoned and its output discarded.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use base::deadline::supervise;
///
/// let (state, sum) = supervise(Duration::from_secs(5), 40, |n| *n + 2).unwrap();
/// assert_eq!(state, 40);
/// assert_eq!(sum, 42);
/// ```
pub fn supervise<S, T, F>(limit: Duration, state: S, op: F) -> Result<(S, T), DeadlineError>
where
    S: Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut S) -> T + Send + 'static,
{
    if limit.is_zero() {
        let mut state = state;
        let out = op(&mut state);
        return Ok((state, out));
    }

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("vmsync-deadline".to_owned())
        .spawn(move || {
            let mut state = state;
            let out = op(&mut state);
            // The receiver is gone if the deadline already expired.
            let _ = tx.send((state, out));
        })
        .map_err(DeadlineError::Spawn)?;

    match rx.recv_timeout(limit) {
        Ok(result) => Ok(result),
        // A disconnected channel means the worker panicked; either way
        // the state is unusable and the caller must replace the session.
        Err(_) => Err(DeadlineError::Expired(limit)),
    }
}
