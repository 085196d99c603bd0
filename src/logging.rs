/// Log setup.
///
/// The terminal is in raw alternate-screen mode while the game runs, so
/// log lines go to a file, never to stderr. No `[logging] file` in the
/// config means no subscriber is installed at all. `RUST_LOG` overrides
/// the configured level.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the file subscriber. Returns Ok(false) when logging is off.
/// A subscriber that is already installed is left in place.
pub fn init(cfg: &LoggingConfig) -> io::Result<bool> {
    let path = match &cfg.file {
        Some(p) => p,
        None => return Ok(false),
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .ok();

    Ok(true)
}
