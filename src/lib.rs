//! PDF Engine Server
//!
//! An API-key authenticated web service that merges, splits, rasterizes,
//! inspects and compresses uploaded PDFs, recording each operation as a job.
//!
//! # Modules
//!
//! - `pdf`: lopdf-based operation engine
//! - `storage`: two-zone local file store
//! - `db`: SQLite job ledger and users
//! - `processing`: job orchestration and status queries
//! - `routes`: axum HTTP surface

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod pdf;
pub mod processing;
pub mod routes;
pub mod state;
pub mod storage;
pub mod validation;

use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .merge(routes::files::router())
        .merge(routes::operations::router())
        .merge(routes::jobs::router())
        .merge(routes::admin::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    let api = Router::new()
        .merge(routes::health::router())
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
