// crates/bizclass-server/src/web/mod.rs
// HTTP surface for the classifier

pub mod api;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::web::state::AppState;

/// Create the web server router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .route("/classify", post(api::classify))
        .route("/classify/fast", post(api::classify_fast))
        .route("/stats", get(api::stats))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(api::health))
        .nest("/api", api_router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
