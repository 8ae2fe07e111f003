//! Structured logging for the terrain pipeline.
//!
//! Provides structured, filterable logging via the `tracing` ecosystem.
//! Console output carries timestamps, module paths, and severity levels,
//! and integrates with the configuration system for runtime level control.

use orogen_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber for the terrain pipeline.
///
/// Sets up console logging with timestamps, module paths, and severity
/// levels. The filter comes from `RUST_LOG` when set, otherwise from
/// `config.output.log_level`, otherwise a default of `info`.
///
/// # Examples
///
/// ```no_run
/// use orogen_log::init_logging;
/// use orogen_config::Config;
///
/// // Basic initialization
/// init_logging(None);
///
/// // With config override
/// let config = Config::default();
/// init_logging(Some(&config));
/// ```
pub fn init_logging(config: Option<&Config>) {
    let filter_str = match config {
        Some(config) if !config.output.log_level.is_empty() => config.output.log_level.clone(),
        _ => "info".to_string(),
    };

    // RUST_LOG wins over the configured level
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// Create an `EnvFilter` with the default filter string.
///
/// Enables `info` level for all targets. Useful for testing and for
/// consistent default behavior.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info")
}
