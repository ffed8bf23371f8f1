//! Logging setup.
//!
//! The filter sits behind a reload layer: logging works with the default
//! filter (`RUST_LOG`, else `info`) while the config file is read, and the
//! configured `log.level` replaces it afterwards.

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

pub type LogHandle = reload::Handle<EnvFilter, Registry>;

pub fn init() -> LogHandle {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
    handle
}

/// Replace the active filter. `RUST_LOG`, when set, still wins.
pub fn apply_level(handle: &LogHandle, level: &str) -> anyhow::Result<()> {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return Ok(());
    }
    let filter = EnvFilter::try_new(level).with_context(|| format!("invalid log level {:?}", level))?;
    handle.reload(filter).context("reload log filter")?;
    Ok(())
}
