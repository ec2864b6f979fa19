//! Process-wide `tracing` subscriber.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{LogFormat, LogSettings};

/// Installs the global subscriber. `RUST_LOG` overrides `log.filter` when set.
///
/// Returns an error if a subscriber is already installed.
pub fn init(settings: &LogSettings) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.filter));
    let registry = tracing_subscriber::registry().with(filter);

    match settings.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
    }
}
