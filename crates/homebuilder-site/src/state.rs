use chrono::{DateTime, Utc};
use homebuilder_cache::CacheStore;
use homebuilder_i18n::LocalizationStore;
use std::sync::Arc;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub i18n: LocalizationStore,
    pub cache: Arc<CacheStore>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(i18n: LocalizationStore, cache: Arc<CacheStore>) -> Self {
        Self {
            i18n,
            cache,
            started_at: Utc::now(),
        }
    }
}
