#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Command-line front-end for vmsync.
//!
//! The crate is a thin shell: it parses arguments, loads the JSON run
//! configuration (with `VMSYNC_*` environment and command-line
//! overrides layered on top), wires the orchestrator to the FTP
//! connector, and renders sync events as the line-oriented JSON stream
//! consumers of the legacy tool already scrape:
//!
//! ```text
//! {"progress":0.25}
//! {"progress":0.5}
//! {"complete":1,"code":0,"description":"run completed"}
//! ```
//!
//! [`run`] accepts the argument iterator and output handles explicitly
//! so the whole surface is testable without a process boundary;
//! `bin/vmsync` wires it to the real ones.

use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use base::config::{ConfigError, SyncConfig};
use base::event::SyncEvent;
use base::exit_code::{ExitCode, HasExitCode};
use clap::Parser;
use engine::SyncRunner;
use session::FtpConnector;
use tracing_subscriber::EnvFilter;

/// Command-line options.
#[derive(Debug, Parser)]
#[command(
    name = "vmsync",
    version,
    about = "Mirror a VMS-style versioned FTP hierarchy onto local storage"
)]
pub struct Options {
    /// Path to the JSON run configuration.
    #[arg(long, default_value = "config.json", value_name = "FILE")]
    pub config: PathBuf,

    /// Remote source root, overriding the configuration.
    #[arg(long, value_name = "PATH")]
    pub source: Option<String>,

    /// Local destination root, overriding the configuration.
    #[arg(long, value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Raise diagnostic verbosity.
    #[arg(long)]
    pub debug: bool,
}

/// Entry point shared by the binary and the integration tests.
///
/// Diagnostics go to `stderr`; `stdout` carries nothing but the JSON
/// event stream. The returned code is the run's status, which the
/// binary clamps into the process exit status while the completion
/// event keeps the unclamped value.
pub fn run<I, T, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
    E: Write,
{
    let options = match Options::try_parse_from(args) {
        Ok(options) => options,
        Err(err) => {
            return if err.use_stderr() {
                let _ = write!(stderr, "{err}");
                ExitCode::Failure
            } else {
                // Help and version output.
                let _ = write!(stdout, "{err}");
                ExitCode::Ok
            };
        }
    };

    let config = match load_config(&options) {
        Ok(config) => config,
        Err(err) => {
            let _ = writeln!(stderr, "vmsync: {err}");
            return err.exit_code();
        }
    };
    init_tracing(config.debug);
    tracing::info!(host = %config.hostname, source = %config.source, "starting run");

    let connector = FtpConnector::new(&config.hostname, &config.username, &config.password);
    let result = SyncRunner::new(connector, &config).run(|event| {
        let _ = writeln!(stdout, "{}", render_event(event));
    });
    match result {
        Ok(_) => ExitCode::Ok,
        Err(err) => {
            let _ = writeln!(stderr, "vmsync: {err}");
            err.exit_code()
        }
    }
}

/// Loads the configuration and layers environment and command-line
/// overrides on top, in that order.
fn load_config(options: &Options) -> Result<SyncConfig, ConfigError> {
    let mut config = SyncConfig::load(&options.config)?;
    apply_overrides(&mut config, |key| env::var(key).ok());
    if let Some(source) = &options.source {
        config.source.clone_from(source);
    }
    if let Some(destination) = &options.destination {
        config.destination.clone_from(destination);
    }
    if options.debug {
        config.debug = true;
    }
    Ok(config)
}

/// Applies `VMSYNC_*` overrides through a lookup function.
fn apply_overrides<F>(config: &mut SyncConfig, get: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(hostname) = get("VMSYNC_HOSTNAME") {
        config.hostname = hostname;
    }
    if let Some(username) = get("VMSYNC_USERNAME") {
        config.username = username;
    }
    if let Some(password) = get("VMSYNC_PASSWORD") {
        config.password = password;
    }
    if let Some(source) = get("VMSYNC_SOURCE") {
        config.source = source;
    }
    if let Some(destination) = get("VMSYNC_DESTINATION") {
        config.destination = PathBuf::from(destination);
    }
}

/// Installs the diagnostic subscriber on stderr. `RUST_LOG` wins over
/// the configuration's debug flag; repeated calls are harmless.
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// One JSON line per event.
fn render_event(event: &SyncEvent) -> String {
    match event {
        SyncEvent::Progress { .. } => {
            serde_json::json!({ "progress": event.fraction() }).to_string()
        }
        SyncEvent::Completed { code } => serde_json::json!({
            "complete": 1,
            "code": code.as_i32(),
            "description": code.description(),
        })
        .to_string(),
    }
}
