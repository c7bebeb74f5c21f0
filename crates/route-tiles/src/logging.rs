use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Setup logging to stderr, keeping stdout free for the output document
pub fn setup_logging() {
    // Set default log level if not set
    if std::env::var("RUST_LOG").is_err() {
        // Safety: single-threaded at startup, before any worker thread is spawned
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::debug!("Logging initialized");
}
