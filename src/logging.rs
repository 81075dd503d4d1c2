//! Tracing setup for the command-line binary
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary.

use crate::error::{RegistryError, Result};
use std::io;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a stderr fmt subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(format!(
                "docker_manifest_headers={level},manifest_headers={level}"
            ))
        })
        .map_err(|e| RegistryError::Config(format!("Failed to create tracing filter: {e}")))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbose),
        )
        .try_init()
        .map_err(|e| RegistryError::Config(format!("Failed to install tracing subscriber: {e}")))
}
