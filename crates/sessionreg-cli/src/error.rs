//! Top-level error type for the batch binary.

use thiserror::Error;

use crate::config::ConfigError;
use sessionreg_core::TracingError;
use sessionreg_gateways::GatewayError;

/// Fatal errors that abort the pass before or during setup.
///
/// Per-event failures are not represented here; they are logged and counted
/// in the pass summary so one bad event never aborts the pass.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error")]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging")]
    Tracing(#[from] TracingError),

    #[error("failed to read mail template '{path}'")]
    Template {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("gateway error during setup")]
    Gateway(#[from] GatewayError),

    #[error("no calendar named '{0}' is visible to this account")]
    CalendarNotFound(String),
}
