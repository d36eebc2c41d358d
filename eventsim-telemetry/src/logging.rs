//! ## eventsim-telemetry::logging
//! **Global `tracing` subscriber driven by [`LoggingConfig`]**
//!
//! `RUST_LOG` overrides the configured level. Output goes to stdout, stderr
//! or a file; an unusable file falls back to stdout so a run never aborts
//! because of logging.

use std::fs::File;
use std::sync::Mutex;

use eventsim_config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to install global subscriber: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. Call once, before any session starts.
    pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(&config.level));
        let (writer, ansi) = make_writer(&config.file);

        let builder = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_ansi(ansi)
            .with_writer(writer);

        match config.format {
            LogFormat::Text => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        }
        .map_err(LoggingError::Install)
    }
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|err| {
        eprintln!("invalid log level {:?} ({}), using info", level, err);
        EnvFilter::new("info")
    })
}

fn make_writer(target: &str) -> (BoxMakeWriter, bool) {
    match target {
        "stdout" => (BoxMakeWriter::new(std::io::stdout), true),
        "stderr" => (BoxMakeWriter::new(std::io::stderr), true),
        path => match File::create(path) {
            Ok(file) => (BoxMakeWriter::new(Mutex::new(file)), false),
            Err(err) => {
                eprintln!("cannot open log file {} ({}), logging to stdout", path, err);
                (BoxMakeWriter::new(std::io::stdout), true)
            }
        },
    }
}
