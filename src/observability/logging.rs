//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::errors::{KeywheelError, Result};

/// Initialize the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` (default `info`); set
/// `KEYWHEEL_LOG_FORMAT=json` for JSON output. Embedders that install their
/// own subscriber should skip this and the error from the double
/// installation tells them so.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("KEYWHEEL_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if json { builder.json().try_init() } else { builder.try_init() };

    result.map_err(|e| KeywheelError::config(format!("Failed to initialize tracing: {}", e)))
}
