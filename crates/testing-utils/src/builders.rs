//! Test data builders with sensible defaults.

use chrono::Utc;
use users_domain::{CreateUserRequest, User};

pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            user: User {
                id: 1,
                name: "Test User".to_string(),
                email: "test@example.com".to_string(),
                password_hash: String::new(),
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.user.id = id;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.user.name = name.to_string();
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.user.email = email.to_string();
        self
    }

    pub fn with_password_hash(mut self, password_hash: &str) -> Self {
        self.user.password_hash = password_hash.to_string();
        self
    }

    pub fn build(self) -> User {
        self.user
    }
}

impl Default for UserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration payload that passes validation.
pub fn create_user_request(email: &str) -> CreateUserRequest {
    CreateUserRequest {
        name: "Test User".to_string(),
        email: email.to_string(),
        password: "password123".to_string(),
    }
}
