use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    database::DatabaseConfig,
    logging::LogConfig,
    observability::{MetricsConfig, ObservabilityConfig},
    server::{AuthConfig, ServerConfig},
};
use crate::validation::ConfigValidator;

const DEFAULT_CONFIG_PATHS: &[&str] = &["config/users-service.toml", "users-service.toml"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub metrics: MetricsConfig,
    pub observability: ObservabilityConfig,
    pub logging: LogConfig,
}

impl AppConfig {
    /// Loads configuration from `config_path` (or the first default path that
    /// exists), then applies `USERS__SECTION__KEY` environment overrides.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("Configuration file not found: {path}"));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("USERS")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("observability.excluded_paths")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.observability.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatabaseBackend, DeploymentEnvironment, OutputFormat};
    use std::io::Write;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address, "0.0.0.0:3001");
        assert_eq!(config.database.backend, DatabaseBackend::Memory);
        assert_eq!(config.auth.jwt_expires_in, "1h");
        assert_eq!(config.observability.service_name, "users-service");
    }

    #[test]
    fn test_app_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_from_partial_toml() {
        let toml_str = r#"
[server]
bind_address = "127.0.0.1:9000"
environment = "production"

[database]
backend = "postgres"
url = "postgresql://localhost/users"

[observability]
excluded_paths = ["/health", "/internal"]

[logging]
format = "compact"
"#;

        let config = AppConfig::from_toml(toml_str).expect("Failed to parse TOML");
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.server.environment, DeploymentEnvironment::Production);
        assert_eq!(config.server.simulated_latency_ms, 700);
        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.observability.excluded_paths, vec!["/health", "/internal"]);
        assert_eq!(config.logging.format, OutputFormat::Compact);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let toml_str = r#"
[database]
backend = "postgres"
"#;
        assert!(AppConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("Failed to create temp file");
        writeln!(
            file,
            r#"
[auth]
jwt_secret = "file-secret"
jwt_expires_in = "30m"

[metrics]
username = "prometheus"
password = "scrape"
"#
        )
        .expect("Failed to write config");

        let path = file.path().to_str().expect("utf-8 path");
        let config = AppConfig::load(Some(path)).expect("Failed to load config");

        assert_eq!(config.auth.jwt_secret, "file-secret");
        assert_eq!(config.auth.jwt_expires_in, "30m");
        assert_eq!(config.metrics.credentials(), Some(("prometheus", "scrape")));
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(AppConfig::load(Some("/definitely/not/here.toml")).is_err());
    }

    #[test]
    fn test_toml_round_trip_keeps_exclusions() {
        let config = AppConfig::default();
        let rendered = config.to_toml().expect("Failed to render TOML");
        let parsed = AppConfig::from_toml(&rendered).expect("Failed to parse rendered TOML");
        assert_eq!(
            parsed.observability.excluded_paths,
            config.observability.excluded_paths
        );
    }
}
