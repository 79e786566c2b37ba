//! API-key users

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::error::{AppError, Result};

/// Username given to the account created from `BOOTSTRAP_API_KEY`
pub const BOOTSTRAP_USERNAME: &str = "admin";

/// User record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: String,
}

/// Hex SHA-256 digest stored in place of an API key
pub fn hash_api_key(api_key: &str) -> String {
    hex::encode(Sha256::digest(api_key.as_bytes()))
}

/// User repository
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, is_active, is_admin, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Look up the user owning `api_key`, active or not
    pub async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, is_active, is_admin, created_at
            FROM users
            WHERE api_key_hash = ?
            "#,
        )
        .bind(hash_api_key(api_key))
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Create an active user holding `api_key`
    pub async fn create(&self, username: &str, api_key: &str, is_admin: bool) -> Result<User> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, api_key_hash, is_active, is_admin, created_at)
            VALUES (?, ?, 1, ?, ?)
            "#,
        )
        .bind(username)
        .bind(hash_api_key(api_key))
        .bind(is_admin)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.get(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created user".to_string()))
    }

    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Create the admin account if the table is empty.
    ///
    /// Returns the new user, or `None` when users already exist.
    pub async fn ensure_bootstrap_user(&self, api_key: &str) -> Result<Option<User>> {
        if self.count().await? > 0 {
            return Ok(None);
        }

        let user = self.create(BOOTSTRAP_USERNAME, api_key, true).await?;
        tracing::info!(user_id = user.id, username = %user.username, "Created bootstrap admin user");
        Ok(Some(user))
    }
}
