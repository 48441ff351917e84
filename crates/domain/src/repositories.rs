//! 领域仓储抽象
//!
//! 定义数据访问的抽象接口，遵循依赖倒置原则

use async_trait::async_trait;

use crate::entities::{NewUser, User, UserChanges};
use crate::errors::DomainResult;

/// 用户仓储抽象
///
/// Implementations report a unique-email violation as `DomainError::Conflict`
/// and any other backend failure as `DomainError::Storage`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> DomainResult<User>;
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn find_all(&self) -> DomainResult<Vec<User>>;
    /// Returns `None` when no user has the given id.
    async fn update(&self, id: i64, changes: UserChanges) -> DomainResult<Option<User>>;
    async fn delete(&self, id: i64) -> DomainResult<bool>;
}

/// 密码哈希抽象；实现方负责把CPU密集的计算移出异步工作线程
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> DomainResult<String>;
    async fn verify(&self, password: &str, hash: &str) -> DomainResult<bool>;
}
