//! Subscriber setup: `RUST_LOG`-style filtering, text or JSON output, and
//! `log` records forwarded into `tracing`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use dentflow::LogFormat;

use crate::error::StartupError;

const DEFAULT_FILTER: &str = "info,tower_http=debug";

pub fn init(format: LogFormat) -> Result<(), StartupError> {
    tracing_log::LogTracer::init().map_err(|e| StartupError::Logging(e.to_string()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = Registry::default().with(filter);

    let installed = match format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
    installed.map_err(|e| StartupError::Logging(e.to_string()))
}
