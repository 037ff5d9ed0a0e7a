//! Logging and observability
//!
//! Structured logging via tracing-subscriber with text or JSON formatting,
//! selected at runtime through CLI flags or environment variables. All log
//! output goes to stderr so stdout stays clean for command output.

use anyhow::Result;
use std::{io, sync::Once};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the logging system.
///
/// Safe to call multiple times; subsequent calls are no-ops.
///
/// ## Arguments
/// * `format` - `None` or `"text"` for human-readable output, `"json"` for
///   structured JSON
///
/// ## Environment variables
/// * `COMFYDOCK_LOG_FORMAT` - output format when `format` is `None`
/// * `COMFYDOCK_LOG` - logging filter, e.g. `comfydock_core=debug`
/// * `RUST_LOG` - standard fallback filter
pub fn init(format: Option<&str>) -> Result<()> {
    init_with_level(format, None)
}

/// Initialize the logging system with an explicit default level.
///
/// The level is used when neither `COMFYDOCK_LOG` nor `RUST_LOG` is set;
/// environment filters always win so users can scope logging per module.
pub fn init_with_level(format: Option<&str>, level: Option<&str>) -> Result<()> {
    INIT.call_once(|| {
        let filter = create_env_filter(level);

        let env_format = std::env::var("COMFYDOCK_LOG_FORMAT").ok();
        let effective_format = format.or(env_format.as_deref()).unwrap_or("text");

        match effective_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_writer(io::stderr),
                    )
                    .with(filter)
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(fmt::layer().with_target(true).with_writer(io::stderr))
                    .with(filter)
                    .init();
            }
        }

        tracing::debug!("Logging initialized with format: {}", effective_format);
    });

    Ok(())
}

fn create_env_filter(level: Option<&str>) -> EnvFilter {
    if let Ok(filter) = std::env::var("COMFYDOCK_LOG") {
        EnvFilter::new(filter)
    } else if let Ok(filter) = std::env::var("RUST_LOG") {
        EnvFilter::new(filter)
    } else {
        EnvFilter::new(level.unwrap_or("warn"))
    }
}
