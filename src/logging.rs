//! Tracing subscriber setup for binaries and scripts embedding this crate

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::MonitoringConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the built-in filter. Fails if a
/// subscriber is already installed.
pub fn init_tracing(verbose: bool, json: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }

    Ok(())
}

/// Install the subscriber described by the `[monitoring]` section
pub fn init_from_config(config: &MonitoringConfig) -> anyhow::Result<()> {
    init_tracing(config.verbose, config.json_logs)
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "ledger_submit=debug,info"
    } else {
        "ledger_submit=info,warn"
    }
}
