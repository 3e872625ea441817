//! Axum router construction for the SOW API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// See [`handlers`] for the endpoint table. CORS allows any origin so
/// browser tooling can call the API directly.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // SOW versions
        .route("/api/sow", post(handlers::store_sow))
        .route("/api/sow/{lead_id}/latest", get(handlers::get_latest))
        .route("/api/sow/{lead_id}/versions", get(handlers::list_versions))
        .route("/api/sow/{lead_id}/document", get(handlers::get_document))
        // Records across leads
        .route("/api/records", get(handlers::list_records))
        .route("/api/records/{id}", get(handlers::get_record))
        // Meeting answers
        .route("/api/meetings", post(handlers::store_meeting_answers))
        .route(
            "/api/meetings/{meeting_id}/answers",
            get(handlers::get_meeting_answers),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
