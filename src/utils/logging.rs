//! Logging setup using the `tracing` crate.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::utils::error::{Error, Result};

/// Initialize the global tracing subscriber.
///
/// `verbose` raises the default filter from `info` to `debug`; the
/// `RUST_LOG` environment variable overrides both.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logger: {e}")))?;

    Ok(())
}
