//! Logging and observability
//!
//! Structured logging via `tracing`, in either human-readable text or JSON,
//! selected at runtime through arguments or environment variables.
//!
//! All logging output is directed to stderr so that stdout stays clean for the
//! command running under the fixture.

use anyhow::Result;
use std::{io, sync::Once};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the logging system with an optional format specification
///
/// Safe to call multiple times; only the first call installs a subscriber.
///
/// ## Arguments
///
/// * `format` - `None` or `"text"` for human-readable output, `"json"` for
///   one JSON object per event
///
/// ## Environment Variables
///
/// * `FIXTURED_LOG_FORMAT` - Format used when `format` is `None`
/// * `FIXTURED_LOG` - Filter directives, takes precedence over `RUST_LOG`
/// * `RUST_LOG` - Standard filter, used as fallback (default `info`)
pub fn init(format: Option<&str>) -> Result<()> {
    INIT.call_once(|| {
        let filter = create_env_filter();

        let env_format = std::env::var("FIXTURED_LOG_FORMAT").ok();
        let effective_format = format.or(env_format.as_deref()).unwrap_or("text");

        match effective_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_span_events(fmt::format::FmtSpan::CLOSE)
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

/// Create an EnvFilter based on environment variables
fn create_env_filter() -> EnvFilter {
    if let Ok(spec) = std::env::var("FIXTURED_LOG") {
        EnvFilter::try_new(&spec).unwrap_or_else(|_| {
            eprintln!(
                "Invalid FIXTURED_LOG specification '{}', using default 'info'",
                spec
            );
            EnvFilter::new("info")
        })
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Check if logging has been initialized
pub fn is_initialized() -> bool {
    INIT.is_completed()
}
