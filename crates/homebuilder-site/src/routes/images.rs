use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ImageStatus {
    pub id: String,
    pub cached: bool,
}

/// GET /api/images/{*id}
pub async fn get_image(State(state): State<AppState>, Path(id): Path<String>) -> Json<ImageStatus> {
    let cached = state.cache.is_image_cached(&id);
    Json(ImageStatus { id, cached })
}

/// PUT /api/images/{*id}
/// Record that an image has been seen so clients can skip prefetching it.
/// The write-through to storage is blocking file I/O.
pub async fn mark_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImageStatus>, AppError> {
    let cache = state.cache.clone();
    let image = id.clone();
    tokio::task::spawn_blocking(move || cache.add_image_to_cache(image)).await?;
    Ok(Json(ImageStatus { id, cached: true }))
}
