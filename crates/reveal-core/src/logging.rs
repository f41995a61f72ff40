#![forbid(unsafe_code)]

//! JSON structured logging for hosts that do not install their own
//! subscriber.
//!
//! Filtering follows `RUST_LOG`; without it, `info` and above are emitted.
//! Per-sample events are logged at `trace`, session lifecycle at `debug`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Install a global JSON subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_json_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .try_init()
}
