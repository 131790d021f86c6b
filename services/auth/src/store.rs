//! Credential store
//!
//! Persists per-user credentials (username, password hash, salt). The trait
//! is the seam between the auth service and the database so the registration
//! and login flows can be exercised against an in-memory double.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::models::{NewUser, User};

/// Store for user credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user by normalized (lowercase) username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Check whether a normalized username is already taken
    async fn username_exists(&self, username: &str) -> Result<bool>;

    /// Persist a new user
    async fn create(&self, new_user: &NewUser) -> Result<User>;
}

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new credential store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, password_salt, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let user = User {
                    id: row.get("id"),
                    username: row.get("username"),
                    password_hash: row.get("password_hash"),
                    password_salt: row.get("password_salt"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                };
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.username);

        // The users.username unique index backs up the pre-insert check.
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, password_salt)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, password_salt, created_at, updated_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(&new_user.password_salt)
        .fetch_one(&self.pool)
        .await?;

        let user = User {
            id: row.get("id"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            password_salt: row.get("password_salt"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        };

        Ok(user)
    }
}
