//! API-key authentication
//!
//! `require_api_key` runs as route middleware in front of every endpoint except
//! health. It resolves the presented key to a [`CurrentUser`] and inserts it
//! into the request extensions; handlers take it with `Extension<CurrentUser>`.

use async_trait::async_trait;
use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Authenticated caller of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// Maps an API key to the active user that owns it
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `None` for unknown or inactive keys
    async fn resolve(&self, api_key: &str) -> Result<Option<CurrentUser>>;
}

/// Resolver backed by the `users` table
#[derive(Clone)]
pub struct SqliteIdentityResolver {
    pool: SqlitePool,
}

impl SqliteIdentityResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityResolver for SqliteIdentityResolver {
    async fn resolve(&self, api_key: &str) -> Result<Option<CurrentUser>> {
        let user = UserRepository::new(&self.pool).find_by_api_key(api_key).await?;

        Ok(user.filter(|u| u.is_active).map(|u| CurrentUser {
            id: u.id,
            username: u.username,
            is_admin: u.is_admin,
        }))
    }
}

#[derive(Deserialize)]
struct ApiKeyQuery {
    api_key: Option<String>,
}

/// Pull the API key from the `X-API-Key` header, a bearer token, or the
/// `api_key` query parameter, in that order.
fn presented_key(request: &Request) -> Option<String> {
    let headers = request.headers();
    let non_empty = |value: &str| {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    };

    if let Some(key) = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(non_empty)
    {
        return Some(key);
    }

    if let Some(key) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(non_empty)
    {
        return Some(key);
    }

    Query::<ApiKeyQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.api_key)
        .as_deref()
        .and_then(non_empty)
}

/// Authentication middleware
pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let api_key = presented_key(&request)
        .ok_or_else(|| AppError::Unauthorized("API key required".to_string()))?;

    let user = state.resolver().resolve(&api_key).await?.ok_or_else(|| {
        tracing::warn!(path = %request.uri().path(), "Rejected invalid or inactive API key");
        AppError::Unauthorized("Invalid or inactive API key".to_string())
    })?;

    tracing::debug!(user_id = user.id, username = %user.username, "Authenticated request");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
