//! Environment of the payment gateway: logger, flow metrics, environment
//! awareness.

pub mod logger;
pub mod types;

pub use tracing::{self, instrument};
pub use tracing_actix_web;
pub use types::{Flow, FlowMetric};

/// Version of the running binary, from the crate metadata.
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
