//! Logging setup: the same timestamped lines go to the console and to the
//! run's log file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. The log file is appended to, so repeated
/// runs accumulate in one file. Filtering follows `RUST_LOG`, default `info`.
///
/// Only the first call installs anything; later calls are no-ops.
pub fn init(log_file: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false).with_target(false))
        .try_init();
    Ok(())
}
