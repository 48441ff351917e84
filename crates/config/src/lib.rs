//! Typed configuration for the users service.
//!
//! Values come from an optional TOML file layered under `USERS__*`
//! environment variables; every key has a default so the service starts
//! with no file at all.

pub mod models;
pub mod validation;

pub use models::{
    AppConfig, AuthConfig, DatabaseBackend, DatabaseConfig, DeploymentEnvironment, LogConfig,
    LogLevel, MetricsConfig, ObservabilityConfig, OutputFormat, ServerConfig,
    DEFAULT_EXCLUDED_PATHS,
};
pub use validation::{ConfigValidator, ValidationUtils};

/// Configuration error type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration error enumeration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File error: {0}")]
    File(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Configuration(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
