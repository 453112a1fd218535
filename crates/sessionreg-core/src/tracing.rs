//! Logging setup for the batch binary.
//!
//! A pass produces one short burst of log lines; the only real variation is
//! who reads them. [`LogMode`] picks between a human terminal run, a
//! troubleshooting run and the JSON stream a cron scheduler collects.
//! `RUST_LOG` overrides the per-mode default filter.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Failure to install the global subscriber (it can only be set once).
#[derive(Debug, Error)]
#[error("failed to set global tracing subscriber")]
pub struct TracingError(#[from] tracing::subscriber::SetGlobalDefaultError);

/// How the binary is being run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogMode {
    /// Interactive terminal run: pretty output at INFO.
    #[default]
    Interactive,
    /// Troubleshooting run: compact DEBUG lines with file/line, no
    /// timestamps (the terminal already shows when).
    Debug,
    /// Unattended cron run: JSON lines with span events, for collection.
    Batch,
}

impl LogMode {
    /// The default level when `RUST_LOG` is not set.
    pub fn default_level(self) -> Level {
        match self {
            Self::Debug => Level::DEBUG,
            Self::Interactive | Self::Batch => Level::INFO,
        }
    }

    fn env_filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("sessionreg={}", self.default_level())))
    }
}

/// Installs the global subscriber for the given mode.
///
/// Called once at startup, before the configuration is loaded, so even a
/// config failure is reported through the chosen format.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(mode: LogMode) -> Result<(), TracingError> {
    let filter = mode.env_filter();
    match mode {
        LogMode::Interactive => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_target(true));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogMode::Debug => {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .compact()
                    .without_time()
                    .with_file(true)
                    .with_line_number(true),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogMode::Batch => {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .json()
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}
