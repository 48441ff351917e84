use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

/// Maintenance endpoints that are neither measured nor traced.
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &[
    "/health",
    "/healthcheck",
    "/health-check",
    "/metrics",
    "/api-docs",
    "/swagger",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub service_name: String,
    pub tracing_enabled: bool,
    pub otlp_endpoint: String,
    pub excluded_paths: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "users-service".to_string(),
            tracing_enabled: true,
            otlp_endpoint: "http://localhost:4318/v1/traces".to_string(),
            excluded_paths: DEFAULT_EXCLUDED_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl ConfigValidator for ObservabilityConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.service_name, "observability.service_name")?;

        if self.tracing_enabled {
            ValidationUtils::validate_not_empty(&self.otlp_endpoint, "observability.otlp_endpoint")?;
        }

        if let Some(path) = self.excluded_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(crate::ConfigError::Validation(format!(
                "observability.excluded_paths entry '{path}' must start with '/'"
            )));
        }

        Ok(())
    }
}

/// Basic-auth credentials protecting `GET /metrics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl MetricsConfig {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}
