//! Observability Setup
//!
//! Initializes the tracing subscriber for applications embedding the
//! engine. The engine itself only emits `tracing` events; hosts that
//! already install their own subscriber can ignore this module entirely.
//!
//! # Usage
//!
//! ```ignore
//! use rampart::observability::{self, ObservabilityConfig};
//!
//! observability::init(&ObservabilityConfig::from_env())?;
//! ```

use std::env;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for development
    #[default]
    Pretty,
    /// JSON format for production/log aggregation
    Json,
    /// Compact single-line format
    Compact,
}

impl LogFormat {
    /// Parse from a loosely-formatted string
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" | "human" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log output format
    pub log_format: LogFormat,

    /// Log level filter (e.g. "info", "rampart=debug,info")
    pub log_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `LOG_FORMAT`: "pretty", "json", or "compact" (default: "pretty")
    /// - `LOG_FILTER`: EnvFilter directive string (default: "info")
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let log_format = env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| LogFormat::from_str_loose(&s))
            .unwrap_or(defaults.log_format);

        let log_filter = env::var("LOG_FILTER").unwrap_or(defaults.log_filter);

        Self {
            log_format,
            log_filter,
        }
    }

    /// Create a new builder for programmatic configuration
    pub fn builder() -> ObservabilityConfigBuilder {
        ObservabilityConfigBuilder::default()
    }
}

/// Builder for [`ObservabilityConfig`]
#[derive(Debug, Default)]
pub struct ObservabilityConfigBuilder {
    config: ObservabilityConfig,
}

impl ObservabilityConfigBuilder {
    /// Set the log output format
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.log_format = format;
        self
    }

    /// Set the log filter directive string
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = filter.into();
        self
    }

    /// Build the final configuration
    pub fn build(self) -> ObservabilityConfig {
        self.config
    }
}

/// Subscriber initialization failure
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    /// The filter directive string did not parse
    #[error("invalid log filter: {0}")]
    Filter(String),

    /// The subscriber could not be installed
    #[error("failed to init tracing: {0}")]
    Init(String),
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured filter. Fails when a
/// global subscriber is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<(), ObservabilityError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| ObservabilityError::Filter(e.to_string()))?;

    let subscriber = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .try_init()
                .map_err(|e| ObservabilityError::Init(e.to_string()))?;
        }
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .try_init()
                .map_err(|e| ObservabilityError::Init(e.to_string()))?;
        }
        LogFormat::Compact => {
            subscriber
                .with(fmt::layer().compact().with_target(true))
                .try_init()
                .map_err(|e| ObservabilityError::Init(e.to_string()))?;
        }
    }

    Ok(())
}
