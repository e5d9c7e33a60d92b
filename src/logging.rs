/*!
 * Logging and tracing initialization
 */

use crate::config::BaggerConfig;
use crate::error::{Error, Result};
use std::fs::File;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured logging from configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_logging(config: &BaggerConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(format!("bagger={}", config.log_level.to_tracing_level()))
        })
        .map_err(|e| Error::config(format!("failed to create log filter: {}", e)))?;

    if let Some(log_path) = &config.log_file {
        let file = File::create(log_path)
            .map_err(|e| Error::config(format!("failed to create log file: {}", e)))?;
        let layer = fmt::layer()
            .with_writer(file)
            .with_target(true)
            .with_ansi(false);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .init();
    } else {
        let layer = fmt::layer().with_target(true).compact();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .init();
    }

    Ok(())
}

#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bagger=debug"));
        let layer = fmt::layer().with_test_writer().with_target(false).compact();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
            .ok();
    });
}
