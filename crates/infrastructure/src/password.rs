use async_trait::async_trait;
use users_domain::{DomainError, DomainResult, PasswordHasher};

/// bcrypt password hashing. Each hash and verify runs on tokio's blocking
/// pool.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Lower costs are only meant for tests.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &str) -> DomainResult<String> {
        let cost = self.cost;
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| DomainError::storage(anyhow::anyhow!("Password hashing task failed: {e}")))?
            .map_err(|e| DomainError::storage(anyhow::anyhow!("Failed to hash password: {e}")))
    }

    async fn verify(&self, password: &str, hash: &str) -> DomainResult<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();

        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| DomainError::storage(anyhow::anyhow!("Password verification task failed: {e}")))?;
        Ok(verified.unwrap_or(false))
    }
}
