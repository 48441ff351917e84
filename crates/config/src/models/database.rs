use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    /// Process-local store, lost on restart.
    #[default]
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Memory,
            url: None,
            max_connections: 10,
            min_connections: 1,
            connection_timeout_seconds: 30,
            run_migrations: true,
        }
    }
}

impl ConfigValidator for DatabaseConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        if self.backend == DatabaseBackend::Postgres {
            let url = self.url.as_deref().unwrap_or_default();
            ValidationUtils::validate_not_empty(url, "database.url")?;

            if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                return Err(crate::ConfigError::Validation(
                    "database.url must start with postgresql:// or postgres://".to_string(),
                ));
            }
        }

        ValidationUtils::validate_count(self.max_connections as usize, "database.max_connections")?;

        if self.min_connections > self.max_connections {
            return Err(crate::ConfigError::Validation(
                "database.min_connections must be less than or equal to max_connections"
                    .to_string(),
            ));
        }

        ValidationUtils::validate_timeout_seconds(
            self.connection_timeout_seconds,
            "database.connection_timeout_seconds",
        )
    }
}
