use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "qrcheck=debug";

/// Install the global subscriber, safe to call more than once
pub fn init() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        // forward `log` records from dependencies
        if let Err(error) = tracing_log::LogTracer::init() {
            eprintln!("unable to forward log records: {error}");
        }

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_ansi(false));

        if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("unable to set global logger: {error}");
        }
    });
}
