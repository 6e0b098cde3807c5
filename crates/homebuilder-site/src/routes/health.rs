use axum::extract::State;
use axum::Json;
use homebuilder_cache::CacheStats;
use homebuilder_i18n::LanguageSnapshot;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub i18n: LanguageSnapshot,
    pub cache: CacheStats,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_secs = (chrono::Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        i18n: state.i18n.snapshot(),
        cache: state.cache.stats(),
    })
}
