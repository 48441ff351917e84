use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use users_domain::{DomainError, DomainResult, NewUser, User, UserChanges, UserRepository};

#[derive(Default)]
struct Store {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

impl Store {
    fn email_owner(&self, email: &str) -> Option<i64> {
        self.users
            .values()
            .find(|user| user.email == email)
            .map(|user| user.id)
    }
}

/// Process-local user store with the same uniqueness rules as the
/// PostgreSQL schema. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: RwLock<Store>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let mut store = self.store.write().await;
        if store.email_owner(&user.email).is_some() {
            return Err(DomainError::email_taken(&user.email));
        }

        store.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: store.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .email_owner(email)
            .and_then(|id| store.users.get(&id).cloned()))
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        Ok(self.store.read().await.users.values().cloned().collect())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> DomainResult<Option<User>> {
        let mut store = self.store.write().await;
        if let Some(email) = changes.email.as_deref() {
            if store.email_owner(email).is_some_and(|owner| owner != id) {
                return Err(DomainError::email_taken(email));
            }
        }

        let Some(user) = store.users.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(user);
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> DomainResult<bool> {
        Ok(self.store.write().await.users.remove(&id).is_some())
    }
}
