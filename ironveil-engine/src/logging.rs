//! Structured logging setup
//!
//! Hosts embedding the engine own the subscriber; this module is a
//! convenience for binaries and integration tests that want the standard
//! filter and formats without wiring tracing-subscriber themselves.

use tracing_subscriber::{
    filter::EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: String,
    pub detailed: bool,
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            level: "info".to_string(),
            detailed: false,
            include_target: false,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Initialize the logging system.
///
/// Respects `RUST_LOG` when set, otherwise scopes the configured level to
/// this crate and warnings elsewhere.
pub fn init_logging(config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ironveil_engine={},warn", config.level)));

    let span_events = if config.detailed {
        FmtSpan::FULL
    } else {
        FmtSpan::NONE
    };

    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(config.include_target)
                .with_span_events(span_events);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_target(config.include_target)
                .with_span_events(span_events);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}
