//! Tracing subscriber setup
//!
//! The library only emits `tracing` events. Binaries call [`init_logging`] once at startup.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber
///
/// `RUST_LOG` wins over `config.level` when set. Returns `false` if a global subscriber
/// was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    let layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_filter(filter())
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .json()
            .with_filter(filter())
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init().is_ok()
}
