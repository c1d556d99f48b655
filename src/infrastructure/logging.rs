//! Logging initialization.
//!
//! Console logging via tracing-subscriber, filterable through `RUST_LOG`
//! with an info-level default.

use tracing_subscriber::EnvFilter;

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    // try_init: tests may install their own subscriber first
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
