use axum::extract::{Query, State};
use axum::Json;
use homebuilder_i18n::{Language, LanguageSnapshot, LoadOutcome};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TranslateQuery {
    key: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub key: String,
    pub value: String,
    pub language: Language,
    /// False when `value` is the key itself
    pub resolved: bool,
}

/// GET /api/i18n/translate?key=hero.title1
pub async fn translate(
    State(state): State<AppState>,
    Query(params): Query<TranslateQuery>,
) -> Json<TranslateResponse> {
    let (language, dictionary) = state.i18n.active();
    let value = dictionary.resolve(&params.key).map(str::to_string);
    if dictionary.is_empty() {
        // Starts the background load when nothing is loaded or in flight
        state.i18n.t(&params.key);
    }

    Json(TranslateResponse {
        language,
        resolved: value.is_some(),
        value: value.unwrap_or_else(|| params.key.clone()),
        key: params.key,
    })
}

/// GET /api/i18n/language
pub async fn get_language(State(state): State<AppState>) -> Json<LanguageSnapshot> {
    Json(state.i18n.snapshot())
}

#[derive(Debug, Deserialize)]
pub struct SetLanguageRequest {
    language: String,
}

#[derive(Debug, Serialize)]
pub struct SetLanguageResponse {
    pub outcome: LoadOutcome,
    #[serde(flatten)]
    pub snapshot: LanguageSnapshot,
}

/// PUT /api/i18n/language
pub async fn set_language(
    State(state): State<AppState>,
    Json(body): Json<SetLanguageRequest>,
) -> Result<Json<SetLanguageResponse>, AppError> {
    let language: Language = body
        .language
        .parse()
        .map_err(|e: homebuilder_i18n::UnsupportedLanguage| AppError::BadRequest(e.to_string()))?;

    let outcome = state.i18n.set_language(language).await;
    info!(%language, ?outcome, "Language change requested");

    Ok(Json(SetLanguageResponse {
        outcome,
        snapshot: state.i18n.snapshot(),
    }))
}

#[derive(Debug, Serialize)]
pub struct DictionaryResponse {
    pub language: Language,
    pub dictionary: serde_json::Value,
}

/// GET /api/i18n/dictionary
/// The full dictionary for the active language, for client-side rendering.
pub async fn get_dictionary(State(state): State<AppState>) -> Json<DictionaryResponse> {
    let (language, dictionary) = state.i18n.active();
    Json(DictionaryResponse {
        language,
        dictionary: dictionary.as_value().clone(),
    })
}
