use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// # Errors
/// An invalid filter directive, or a subscriber already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let (json, plain) = if config.json {
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true);
        (Some(layer), None)
    } else {
        (None, Some(fmt::layer().with_target(true)))
    };

    tracing_subscriber::registry()
        .with(json)
        .with(plain)
        .with(filter)
        .try_init()?;

    tracing::debug!(level = %config.level, json = config.json, "logging initialized");
    Ok(())
}
