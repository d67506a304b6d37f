//! Configuration and logging bootstrap for the Tidepool backend.
//!
//! Services load a [`Config`] once at startup (compile-time defaults,
//! optional JSON file, environment overrides) and call [`init_logging`]
//! before anything else emits a `tracing` event.

mod config;
mod error;
mod logging;

pub use config::{Config, DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS};
pub use error::{ConfigError, ConfigResult};
pub use logging::init_logging;
