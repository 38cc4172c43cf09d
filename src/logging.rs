//! Subscriber setup for binaries. Library code only emits `tracing` events.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LoggerConfig, LoggerKind};
use crate::error::SwarmError;

/// `RUST_LOG` when set, otherwise the configured level.
pub fn filter(config: &LoggerConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber: text on stderr, or JSON lines appended to
/// `config.path`.
pub fn init(config: &LoggerConfig) -> Result<(), SwarmError> {
    let registry = tracing_subscriber::registry().with(filter(config));
    let installed = match config.kind {
        LoggerKind::Console => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LoggerKind::File => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.path)
                .map_err(|e| {
                    SwarmError::Configuration(format!(
                        "cannot open log file {}: {e}",
                        config.path.display()
                    ))
                })?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
    };
    installed.map_err(|e| SwarmError::InvalidState(format!("logger already installed: {e}")))
}
