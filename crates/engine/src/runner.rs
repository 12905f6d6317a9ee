//! One mirror run, start to finish.

use base::config::SyncConfig;
use base::event::SyncEvent;
use base::exit_code::{ExitCode, HasExitCode};
use flist::Crawler;
use session::{Connect, ConnectError, ConnectionManager, SessionTimeouts};
use thiserror::Error;
use transfer::{DestinationLayout, Outcome, TransferEngine, TransferError};

/// Failure that ends the run early.
#[derive(Debug, Error)]
pub enum FatalError {
    /// No authenticated session could be established.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The transfer phase hit an unrecoverable local or remote problem.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl HasExitCode for FatalError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Connect(err) => err.exit_code(),
            Self::Transfer(err) => err.exit_code(),
        }
    }
}

/// Tally of one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Manifest records processed, directories included.
    pub total: usize,
    /// Records created or replaced locally.
    pub created: usize,
    /// Records already up to date.
    pub skipped: usize,
    /// Records that failed without aborting the run.
    pub failed: usize,
}

/// Orchestrates one run: connect, crawl, materialize, report.
pub struct SyncRunner<C: Connect> {
    manager: ConnectionManager<C>,
    source: String,
    layout: DestinationLayout,
    recursive: bool,
    try_degraded: bool,
    text_extensions: Vec<String>,
}

impl<C: Connect> SyncRunner<C> {
    /// Builds a runner from the run configuration and a connector for
    /// its remote side.
    #[must_use]
    pub fn new(connector: C, config: &SyncConfig) -> Self {
        Self {
            manager: ConnectionManager::new(connector, SessionTimeouts::from_config(config)),
            source: config.source.clone(),
            layout: DestinationLayout::new(&config.source, &config.destination),
            recursive: config.recursive,
            try_degraded: config.try_degraded_listing,
            text_extensions: config.text_extensions.clone(),
        }
    }

    /// Executes the run, narrating it to `observer`.
    ///
    /// The observer sees one [`SyncEvent::Progress`] per manifest record
    /// in mirror order and exactly one terminal [`SyncEvent::Completed`]
    /// carrying the run's status code, on fatal failures included.
    ///
    /// # Errors
    ///
    /// [`FatalError`] when the run aborted; per-record failures are
    /// tallied in the [`RunSummary`] instead.
    pub fn run<F>(mut self, mut observer: F) -> Result<RunSummary, FatalError>
    where
        F: FnMut(&SyncEvent),
    {
        let outcome = self.execute(&mut observer);
        let code = match &outcome {
            Ok(summary) => {
                tracing::info!(
                    total = summary.total,
                    created = summary.created,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "run complete"
                );
                ExitCode::Ok
            }
            Err(err) => {
                tracing::error!(error = %err, "run aborted");
                err.exit_code()
            }
        };
        observer(&SyncEvent::Completed { code });
        outcome
    }

    fn execute<F>(&mut self, observer: &mut F) -> Result<RunSummary, FatalError>
    where
        F: FnMut(&SyncEvent),
    {
        self.manager.open()?;

        let manifest =
            Crawler::new(&mut self.manager, self.recursive, self.try_degraded).crawl(&self.source)?;

        let mut summary = RunSummary {
            total: manifest.len(),
            ..RunSummary::default()
        };
        let mut engine = TransferEngine::new(
            &mut self.manager,
            self.layout.clone(),
            self.text_extensions.clone(),
        );
        for (index, record) in manifest.iter().enumerate() {
            match engine.materialize(record)? {
                Outcome::Created => summary.created += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Failed => summary.failed += 1,
            }
            observer(&SyncEvent::Progress {
                completed: index + 1,
                total: summary.total,
            });
        }
        // Creating children bumped their parents' mtimes; reapply the
        // directory stamps so the next run's skip check still matches.
        for record in manifest.iter().filter(|record| record.is_dir()) {
            engine.restamp(record);
        }
        drop(engine);

        self.manager.close();
        Ok(summary)
    }
}
