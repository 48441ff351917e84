use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

/// Deployment environment; `Development` relaxes the metrics endpoint guard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentEnvironment {
    #[default]
    Development,
    Production,
}

impl DeploymentEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, DeploymentEnvironment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentEnvironment::Development => "development",
            DeploymentEnvironment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub environment: DeploymentEnvironment,
    pub cors_enabled: bool,
    /// Artificial delay applied by `GET /users/simulate-latency`.
    pub simulated_latency_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            environment: DeploymentEnvironment::Development,
            cors_enabled: true,
            simulated_latency_ms: 700,
        }
    }
}

impl ConfigValidator for ServerConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_bind_address(&self.bind_address, "server.bind_address")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Token lifetime such as `30m`, `1h` or `7d`.
    pub jwt_expires_in: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-this-secret-in-production".to_string(),
            jwt_expires_in: "1h".to_string(),
        }
    }
}

impl ConfigValidator for AuthConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.jwt_secret, "auth.jwt_secret")?;
        ValidationUtils::validate_not_empty(&self.jwt_expires_in, "auth.jwt_expires_in")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_deserialization() {
        let env: DeploymentEnvironment = serde_json::from_str("\"production\"").unwrap();
        assert!(env.is_production());
        let env: DeploymentEnvironment = serde_json::from_str("\"development\"").unwrap();
        assert!(!env.is_production());
        assert_eq!(env.as_str(), "development");
        assert_eq!(DeploymentEnvironment::Production.as_str(), "production");
    }

    #[test]
    fn test_auth_config_rejects_blank_secret() {
        let config = AuthConfig {
            jwt_secret: "  ".to_string(),
            ..AuthConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
