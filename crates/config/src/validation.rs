use crate::{ConfigError, ConfigResult};

/// Implemented by every configuration section.
pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

pub struct ValidationUtils;

impl ValidationUtils {
    pub fn validate_not_empty(value: &str, field: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{field} must not be empty")));
        }
        Ok(())
    }

    pub fn validate_count(value: usize, field: &str) -> ConfigResult<()> {
        if value == 0 {
            return Err(ConfigError::Validation(format!(
                "{field} must be greater than 0"
            )));
        }
        Ok(())
    }

    pub fn validate_timeout_seconds(value: u64, field: &str) -> ConfigResult<()> {
        if value == 0 || value > 3600 {
            return Err(ConfigError::Validation(format!(
                "{field} must be between 1 and 3600 seconds"
            )));
        }
        Ok(())
    }

    pub fn validate_http_url(value: &str, field: &str) -> ConfigResult<()> {
        Self::validate_not_empty(value, field)?;
        if !(value.starts_with("http://") || value.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "{field} must be an http(s) URL"
            )));
        }
        Ok(())
    }

    pub fn validate_bind_address(value: &str, field: &str) -> ConfigResult<()> {
        Self::validate_not_empty(value, field)?;
        match value.rsplit_once(':') {
            Some((_, port)) if port.parse::<u16>().is_ok() => Ok(()),
            _ => Err(ConfigError::Validation(format!(
                "{field} must have the form host:port"
            ))),
        }
    }
}
