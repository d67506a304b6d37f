//! Logging initialization for the backend.
//!
//! Every binary calls [`init_logging`] exactly once before doing real work;
//! library crates only ever use the `tracing` macros and stay ignorant of
//! where log lines end up.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging system.
///
/// Sets up `tracing` with:
/// - Human-readable output to stderr, or single-line JSON when
///   `TIDEPOOL_LOG_FORMAT=json` is set
/// - Log level from `RUST_LOG` if present, otherwise the provided default
///
/// # Example
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("server started");
/// ```
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json = std::env::var("TIDEPOOL_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .flatten_event(true)
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    }
}
