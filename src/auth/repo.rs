use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{NewUser, User};
use crate::db::StoreResult;

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Find a user by exact username.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Find a user by primary key.
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// True when either the username or the email is already registered.
    async fn username_or_email_taken(&self, username: &str, email: &str) -> StoreResult<bool>;

    /// Insert a new user. Duplicate username/email yields `StoreError::UniqueViolation`.
    async fn create(&self, user: NewUser) -> StoreResult<User>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> StoreResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users WHERE username = $1 OR email = $2
            )
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }
}
