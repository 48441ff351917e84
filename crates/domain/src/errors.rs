use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn user_not_found(id: i64) -> Self {
        Self::NotFound(format!("User with identifier {id} not found"))
    }

    pub fn email_taken(email: &str) -> Self {
        Self::Conflict(format!("User with email '{email}' already exists"))
    }

    pub fn storage<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Storage(err.into())
    }

    /// Client-caused failures; everything else is an application fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, DomainError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            DomainError::user_not_found(42).to_string(),
            "User with identifier 42 not found"
        );
        assert_eq!(
            DomainError::email_taken("a@b.io").to_string(),
            "User with email 'a@b.io' already exists"
        );
        assert_eq!(DomainError::InvalidCredentials.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_storage_is_not_client_error() {
        let err = DomainError::storage(anyhow::anyhow!("connection reset"));
        assert!(!err.is_client_error());
        assert!(DomainError::user_not_found(1).is_client_error());
    }
}
