// crates/bizclass-server/src/web/api.rs
// REST API handlers

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bizclass_types::{ApiResponse, ClassificationRequest, ClassifyResponse};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::db::PoolStatus;
use crate::error::ClassifierError;
use crate::ml::ModelVariant;
use crate::stats::StatsSnapshot;
use crate::web::state::AppState;

// ═══════════════════════════════════════
// HEALTH
// ═══════════════════════════════════════

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.service.stats();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "ml_enabled": state.service.has_ml(),
        "ml_circuit": stats.ml_circuit,
    }))
}

// ═══════════════════════════════════════
// CLASSIFY
// ═══════════════════════════════════════

pub async fn classify(
    State(state): State<AppState>,
    Json(request): Json<ClassificationRequest>,
) -> Response {
    run_classification(&state, request, ModelVariant::Full).await
}

/// Same pipeline with the low-latency ML model
pub async fn classify_fast(
    State(state): State<AppState>,
    Json(request): Json<ClassificationRequest>,
) -> Response {
    run_classification(&state, request, ModelVariant::Fast).await
}

async fn run_classification(
    state: &AppState,
    request: ClassificationRequest,
    variant: ModelVariant,
) -> Response {
    let token = CancellationToken::new();
    // Axum drops this future when the client disconnects
    let _cancel_on_drop = token.clone().drop_guard();

    match state.service.classify(request, variant, &token).await {
        Ok(response) => (StatusCode::OK, Json(ApiResponse::ok(response))).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                warn!(error = %e, "Classification failed");
            }
            (
                status,
                Json(ApiResponse::<ClassifyResponse>::err(e.to_user_string())),
            )
                .into_response()
        }
    }
}

fn status_for(err: &ClassifierError) -> StatusCode {
    match err {
        ClassifierError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ClassifierError::Cancelled => StatusCode::REQUEST_TIMEOUT,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

// ═══════════════════════════════════════
// STATS
// ═══════════════════════════════════════

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub service: StatsSnapshot,
    pub database: Option<PoolStatus>,
}

pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(StatsResponse {
        service: state.service.stats(),
        database: state.pool.as_ref().map(|pool| pool.status()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&ClassifierError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&ClassifierError::Cancelled), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            status_for(&ClassifierError::Store("down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
