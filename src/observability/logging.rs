//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once, from `main`
//! - Translate `--quiet` / `-v` into an `EnvFilter` directive
//!
//! `RUST_LOG` always wins over the configured verbosity.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

/// Filter directive derived from the observability settings.
pub fn default_directive(config: &ObservabilityConfig) -> String {
    if let Some(filter) = &config.filter {
        return filter.clone();
    }
    if config.quiet {
        return "error".to_string();
    }
    match config.verbosity {
        0 => "tls13_demo_server=info".to_string(),
        1 => "tls13_demo_server=debug,rustls=info".to_string(),
        _ => "tls13_demo_server=trace,rustls=debug".to_string(),
    }
}

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(config).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
