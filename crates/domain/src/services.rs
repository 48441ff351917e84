//! # 领域服务模块
//!
//! 用户注册、查询、更新、删除以及凭据校验的业务规则。
//! 服务本身不保存状态，依赖仓储获取数据，密码哈希通过 [`PasswordHasher`] 注入。

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::entities::{NewUser, User, UserChanges};
use crate::errors::{DomainError, DomainResult};
use crate::repositories::{PasswordHasher, UserRepository};
use crate::requests::{CreateUserRequest, UpdateUserRequest};

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repository, hasher }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: CreateUserRequest) -> DomainResult<User> {
        if self.repository.find_by_email(&request.email).await?.is_some() {
            return Err(DomainError::email_taken(&request.email));
        }

        let password_hash = self.hasher.hash(&request.password).await?;
        let user = self
            .repository
            .create(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
            })
            .await?;

        debug!(user_id = user.id, "user registered");
        Ok(user)
    }

    pub async fn list(&self) -> DomainResult<Vec<User>> {
        self.repository.find_all().await
    }

    pub async fn get(&self, id: i64) -> DomainResult<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: UpdateUserRequest) -> DomainResult<User> {
        let current = self.get(id).await?;

        if let Some(email) = request.email.as_deref() {
            if email != current.email && self.repository.find_by_email(email).await?.is_some() {
                return Err(DomainError::email_taken(email));
            }
        }

        let password_hash = match request.password.as_deref() {
            Some(password) => Some(self.hasher.hash(password).await?),
            None => None,
        };

        let changes = UserChanges {
            name: request.name,
            email: request.email,
            password_hash,
        };
        if changes.is_empty() {
            return Ok(current);
        }

        self.repository
            .update(id, changes)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    pub async fn delete(&self, id: i64) -> DomainResult<()> {
        if self.repository.delete(id).await? {
            Ok(())
        } else {
            Err(DomainError::user_not_found(id))
        }
    }

    /// Resolves a user from login credentials. Unknown email and wrong
    /// password are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> DomainResult<User> {
        let Some(user) = self.repository.find_by_email(email).await? else {
            return Err(DomainError::InvalidCredentials);
        };

        if self.hasher.verify(password, &user.password_hash).await? {
            Ok(user)
        } else {
            Err(DomainError::InvalidCredentials)
        }
    }
}
