//! Tracing subscriber setup for the `relayctx` binary.
//!
//! `RUST_LOG` takes precedence over `logging.level`. Logs go to stderr so
//! command output on stdout stays machine-readable.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// The filter directive in effect for `config`.
pub fn filter_directive(config: &LoggingConfig, rust_log: Option<String>) -> String {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| config.level.clone())
}

pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let directive = filter_directive(config, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| anyhow!("Invalid log filter '{}': {}", directive, e))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format.as_str() {
        "json" => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .try_init(),
        "compact" => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        _ => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init(),
    };
    result.map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_wins() {
        let config = LoggingConfig::default();
        assert_eq!(
            filter_directive(&config, Some("context_relay=debug".into())),
            "context_relay=debug"
        );
        assert_eq!(filter_directive(&config, Some("  ".into())), "info");
        assert_eq!(filter_directive(&config, None), "info");
    }
}
