use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{request_id_middleware, request_span},
    services::{EnrichmentPipeline, IdentityService, SessionRecorder},
};

pub mod auth;
pub mod extract;
pub mod history;
pub mod movies;

/// Services shared by every handler
pub struct AppState {
    pub identity: IdentityService,
    pub pipeline: EnrichmentPipeline,
    pub recorder: SessionRecorder,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::very_permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(request_span)),
        )
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/movies/recommend", post(movies::recommend))
        .route("/movies/browse", get(movies::browse))
        .route("/movies/provider/:name", get(movies::by_provider))
        .route("/movies/:media_type/:id", get(movies::detail))
        .route("/history", get(history::list))
}

/// Liveness probe
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "API is running" })))
}
