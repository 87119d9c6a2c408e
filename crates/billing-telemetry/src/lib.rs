//! # Billing Telemetry
//!
//! Observability for the billing client.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` setup with env filtering and optional
//!   JSON output
//! - **Metrics**: Prometheus counters for connections, operations,
//!   verifications, retries and observer evictions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billing_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!     // Billing client runs here
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PK_SERVICE_NAME` | `poolakey` | Service name in logs |
//! | `PK_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `PK_JSON_LOGS` | `false` | Emit JSON log lines |
//! | `PK_CONSOLE_OUTPUT` | `true` | Write logs to the console |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{gather_text, register_metrics, HistogramTimer, MetricsHandle};

#[doc(hidden)]
pub use tracing as __tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the logging subscriber.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    init_logging(config)?;
    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}
