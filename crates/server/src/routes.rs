use std::sync::Arc;

use axum::{http::StatusCode, routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::{metrics, premium::RegistryService};

pub mod premium;

pub const LIVENESS_TEXT: &str = "API Premium Email Manager is running. Made with <3";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RegistryService>,
}

pub async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics_text() -> (StatusCode, String) {
    match metrics::encode_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Build the full application router: liveness/ops routes and the registry API.
pub fn build_router(registry: Arc<RegistryService>, cors: CorsLayer) -> Router {
    let state = AppState { registry };

    // Public routes (liveness + ops)
    let public = Router::new()
        .route("/", get(liveness))
        .route("/health", get(health))
        .route("/metrics", get(metrics_text));

    // Registry routes; mutating ones check the api key in the service layer
    let registry_routes = Router::new()
        .route("/add/premium", get(premium::add_premium))
        .route("/delete/premium", get(premium::delete_premium))
        .route("/list/email/premium.json", get(premium::list_premium));

    public
        .merge(registry_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
