//! Structured logging setup.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build tracing filter directives from the logging configuration.
///
/// The base level applies to the whole crate; component levels narrow
/// individual modules, e.g. `{"probe": "debug"}` becomes `rudder::probe=debug`.
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut directives = vec![config.level.clone()];

    if let Some(components) = &config.component_levels {
        let mut entries: Vec<_> = components.iter().collect();
        entries.sort();
        for (component, level) in entries {
            directives.push(format!("rudder::{}={}", component, level));
        }
    }

    directives.join(",")
}

/// Initialize tracing based on configuration.
///
/// `RUST_LOG` takes precedence over the configured directives when set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}
