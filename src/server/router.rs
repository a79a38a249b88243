use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{documents, health, study};
use crate::state::AppState;

/// Builds the application router.
///
/// The core has no knowledge of HTTP; these routes are a thin translation
/// layer over `RagService`, with typed errors mapped to status codes by
/// `ApiError::into_response`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/status", get(health::status))
        .route("/api/documents", post(documents::ingest))
        .route("/api/documents/count", get(documents::count))
        .route("/api/search", get(documents::search))
        .route("/api/explain", post(study::explain))
        .route("/api/quiz", post(study::quiz))
        .route("/api/chat", post(study::chat))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}
