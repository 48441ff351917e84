//! Request payloads accepted by the users and auth endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "name should not be empty"))]
    pub name: String,
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(length(
        min = 8,
        message = "password must be longer than or equal to 8 characters"
    ))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, message = "name must be at least 3 characters long"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "password must be at least 8 characters long"))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(length(
        min = 8,
        message = "password must be longer than or equal to 8 characters"
    ))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let valid = CreateUserRequest {
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            password: "hopper123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = CreateUserRequest {
            name: String::new(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_update_request_only_checks_present_fields() {
        assert!(UpdateUserRequest::default().validate().is_ok());

        let short_name = UpdateUserRequest {
            name: Some("Al".to_string()),
            ..UpdateUserRequest::default()
        };
        assert!(short_name.validate().is_err());
    }

    #[test]
    fn test_login_request_requires_email() {
        let request = LoginRequest {
            email: "nobody".to_string(),
            password: "password123".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
