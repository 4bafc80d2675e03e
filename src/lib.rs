//! leafling - plant-care tracking backend
//!
//! Users register, upload plant photos, receive AI-driven species and
//! disease identification, log care events, and receive AI-generated
//! care-tip summaries. Identification and care-tip results are cached in
//! the database and reused until their inputs change.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{PlantIdentifier, TipGenerator};

/// Request body limit; image payloads arrive base64-encoded in JSON
const BODY_LIMIT_BYTES: usize = 15 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Resolved configuration
    pub config: Arc<Config>,
    /// Identification provider client
    pub identifier: Arc<dyn PlantIdentifier>,
    /// Text-generation provider client
    pub tip_generator: Arc<dyn TipGenerator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        config: Config,
        identifier: Arc<dyn PlantIdentifier>,
        tip_generator: Arc<dyn TipGenerator>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            identifier,
            tip_generator,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(api::plants::routes())
        .merge(api::logs::routes())
        .merge(api::images::routes())
        .merge(api::ai::routes())
        .merge(api::users::protected_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_auth,
        ));

    Router::new()
        .merge(api::auth::routes())
        .merge(api::health::routes())
        .merge(api::users::public_routes())
        .merge(protected)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
