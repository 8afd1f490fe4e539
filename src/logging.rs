//! Tracing subscriber setup for the binary.

use crate::domain::error::IndexError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub const DEFAULT_LEVEL: &str = "info";

/// Explicit `level` wins over `RUST_LOG`; with neither, `info` is used.
pub fn build_filter(level: Option<&str>) -> Result<EnvFilter, IndexError> {
    match level {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| IndexError::invalid("logging", "level", e.to_string())),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))),
    }
}

/// Installs the global subscriber, writing to stderr. A second call keeps
/// the first subscriber.
pub fn init_tracing(level: Option<&str>) -> Result<(), IndexError> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(build_filter(level)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}
