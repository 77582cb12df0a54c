// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ENDPOINT HANDLERS - health, patterns, query, reload
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use super::types::*;
use super::AppState;
use crate::corpus;
use crate::registry::RegistrySnapshot;
use crate::service::QueryError;

// ── GET /health ─────────────────────────────────

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: crate::VERSION.into(),
        patterns: state.service.snapshot().len(),
    })
}

// ── GET /patterns ───────────────────────────────

/// Lista o corpus carregado (resumos, sem templates de código)
pub async fn list_patterns(State(state): State<Arc<AppState>>) -> Json<PatternsResponse> {
    let snapshot = state.service.snapshot();
    Json(PatternsResponse {
        patterns: snapshot
            .patterns()
            .iter()
            .map(PatternSummary::from_pattern)
            .collect(),
        built_at: snapshot.built_at(),
    })
}

// ── POST /query ─────────────────────────────────

/// Recomendações ranqueadas para uma query
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QueryRequest>,
) -> Response {
    match state.service.respond(&body.into_query()) {
        Ok(response) => Json(response).into_response(),
        Err(QueryError::InvalidQuery) => error_response(
            StatusCode::BAD_REQUEST,
            "text and code_excerpt are both empty",
        ),
        Err(QueryError::DeadlineExceeded) => error_response(
            StatusCode::GATEWAY_TIMEOUT,
            "query processing exceeded the configured deadline",
        ),
    }
}

// ── POST /reload ────────────────────────────────

/// Recarrega o corpus da fonte configurada
///
/// Validação falha → snapshot antigo permanece servindo; o erro vai na
/// resposta.
pub async fn reload(State(state): State<Arc<AppState>>) -> Response {
    match corpus::load_snapshot(state.source.as_ref()).await {
        Ok(snapshot) => {
            let info = ReloadResponse {
                patterns: snapshot.len(),
                indexed_tokens: snapshot.indexed_tokens(),
                built_at: snapshot.built_at(),
            };
            swap_snapshot(&state, snapshot);
            Json(info).into_response()
        }
        Err(e) => {
            log::error!("✗ reload falhou, snapshot anterior mantido: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("corpus reload failed: {}", e),
            )
        }
    }
}

fn swap_snapshot(state: &AppState, snapshot: RegistrySnapshot) {
    state.service.snapshot_handle().swap(snapshot);
}

// ── Helpers ─────────────────────────────────────

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ApiError {
            error: ApiErrorDetail {
                message: message.into(),
                error_type: "invalid_request_error".into(),
            },
        }),
    )
        .into_response()
}
