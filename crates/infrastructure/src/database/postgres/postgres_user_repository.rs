use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use users_domain::{DomainError, DomainResult, NewUser, User, UserChanges, UserRepository};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique violation on the email column to a conflict for `email`.
fn map_write_error(err: sqlx::Error, email: Option<&str>) -> DomainError {
    match (&err, email) {
        (sqlx::Error::Database(db_err), Some(email))
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
        {
            DomainError::email_taken(email)
        }
        _ => DomainError::storage(err),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, Some(&user.email)))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(row.map(User::from))
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> DomainResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, changes.email.as_deref()))?;

        Ok(row.map(User::from))
    }

    async fn delete(&self, id: i64) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        Ok(result.rows_affected() > 0)
    }
}
