//! Global logger over `tracing-subscriber`.
//!
//! Handlers and workers log through these re-exported macros so call sites
//! read `logger::info!` regardless of the configured format.

pub use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the logging pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console lines.
    #[default]
    Console,
    /// One JSON object per line, for log shippers.
    Json,
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// filter. Must be called at most once per process; later calls are ignored
/// so tests can race on it safely.
pub fn setup(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .try_init(),
    };

    if let Err(error) = result {
        tracing::debug!(?error, "global logger was already installed");
    }
}
