use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    catalog::CatalogPaths,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    models::RecommendationSession,
    services::{RecommendationEngine, ThumbnailProvider},
};

pub mod catalog;
pub mod evaluation;
pub mod recommendations;
pub mod titles;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub thumbnails: Arc<dyn ThumbnailProvider>,
    /// Candidate sets awaiting refinement, keyed by session id
    pub sessions: Arc<RwLock<HashMap<Uuid, RecommendationSession>>>,
    pub catalog_paths: CatalogPaths,
    /// Upper bound on the count a single request may ask for
    pub max_recommendations: usize,
}

impl AppState {
    pub fn new(
        engine: Arc<RecommendationEngine>,
        thumbnails: Arc<dyn ThumbnailProvider>,
        catalog_paths: CatalogPaths,
        max_recommendations: usize,
    ) -> Self {
        Self {
            engine,
            thumbnails,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            catalog_paths,
            max_recommendations,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/titles", get(titles::titles_by_tier))
        .route("/autocomplete", get(titles::autocomplete))
        .route("/recommendations", post(recommendations::recommend))
        .route(
            "/recommendations/:session_id/refine",
            post(recommendations::refine),
        )
        .route("/catalog/reload", post(catalog::reload))
        .route("/evaluate", post(evaluation::evaluate))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
