//! Tracing subscriber setup.
//!
//! Log lines go to stderr so rendered pages and `--json` output on stdout
//! stay clean. `RUST_LOG` wins over `[logging].filter`; `--verbose` wins
//! over both.

use anyhow::{anyhow, Context, Result};
use std::env;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Pick the filter directive from `verbose`, `RUST_LOG`, then the config.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        return "merger_dashboard=debug,mdash=debug,warn".to_string();
    }
    env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| config.filter.clone())
}

pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let directive = filter_directive(config, verbose);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter: {}", directive))?
        .add_directive(
            "hyper=warn"
                .parse()
                .unwrap_or_else(|_| tracing::Level::WARN.into()),
        );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_overrides_config() {
        let config = LoggingConfig {
            filter: "error".to_string(),
        };
        assert!(filter_directive(&config, true).contains("debug"));
    }

    #[test]
    fn config_filter_parses() {
        assert!(EnvFilter::try_new(LoggingConfig::default().filter).is_ok());
    }
}
