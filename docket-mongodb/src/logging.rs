//! Logging setup.
//!
//! All internal events go through `tracing`. Applications that already
//! install a subscriber need nothing from this module; the rest can call
//! [`init`] once at startup.
//!
//! # Environment Variables
//!
//! - `DOCKET_DEBUG=true` (or `1`, `yes`) - Enable debug logging
//! - `DOCKET_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `DOCKET_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! Terminal operations log the collection and translated filter at `debug`;
//! store calls log at `trace`.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `DOCKET_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("DOCKET_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The configured log level.
///
/// `DOCKET_LOG_LEVEL` wins when it names a level; otherwise "debug" when
/// `DOCKET_DEBUG` is set and "warn" when it is not.
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };

    match env::var("DOCKET_LOG_LEVEL") {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// The configured output format; defaults to "json".
pub fn get_log_format() -> &'static str {
    env::var("DOCKET_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Install a global subscriber for docket's events.
///
/// Does nothing unless `DOCKET_DEBUG` or `DOCKET_LOG_LEVEL` is set, or
/// when the `tracing-subscriber` feature is off. Later calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("DOCKET_LOG_LEVEL").is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(format!("docket={},docket_mongodb={}", level, level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            let result = match get_log_format() {
                "json" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .try_init(),
                "compact" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .try_init(),
                _ => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .try_init(),
            };

            if result.is_ok() {
                tracing::info!(level = level, format = get_log_format(), "docket logging initialized");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_settings_from_environment() {
        // SAFETY: the only test in this crate that touches these variables.
        unsafe {
            env::remove_var("DOCKET_DEBUG");
            env::remove_var("DOCKET_LOG_LEVEL");
            env::remove_var("DOCKET_LOG_FORMAT");
        }
        assert!(!is_debug_enabled());
        assert_eq!(get_log_level(), "warn");
        assert_eq!(get_log_format(), "json");

        unsafe {
            env::set_var("DOCKET_DEBUG", "yes");
        }
        assert!(is_debug_enabled());
        assert_eq!(get_log_level(), "debug");

        unsafe {
            env::set_var("DOCKET_LOG_LEVEL", "TRACE");
            env::set_var("DOCKET_LOG_FORMAT", "compact");
        }
        assert_eq!(get_log_level(), "trace");
        assert_eq!(get_log_format(), "compact");

        unsafe {
            env::remove_var("DOCKET_DEBUG");
            env::remove_var("DOCKET_LOG_LEVEL");
            env::remove_var("DOCKET_LOG_FORMAT");
        }
    }
}
