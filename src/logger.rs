//
// logger.rs
// Dcm2Png-rs
//
// Installs the tracing subscriber. Diagnostics go to stderr so stdout only carries the conversion report.
//
// Thales Matheus Mendonça Santos - November 2025

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` overrides the default `warn` level.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // A second init (e.g. from tests) is not an error worth surfacing.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
