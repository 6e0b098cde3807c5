use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use homebuilder_cache::{CacheStats, CleanupReport};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/cache/stats
pub async fn stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// POST /api/cache/cleanup
pub async fn cleanup(State(state): State<AppState>) -> Result<Json<CleanupReport>, AppError> {
    let cache = state.cache.clone();
    let report = tokio::task::spawn_blocking(move || cache.cleanup()).await?;
    Ok(Json(report))
}

/// DELETE /api/cache
pub async fn clear(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let cache = state.cache.clone();
    tokio::task::spawn_blocking(move || cache.clear()).await?;
    Ok(StatusCode::NO_CONTENT)
}
