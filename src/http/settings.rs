//! App config, model list and environment editor handlers.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::error::Result;

use super::AppState;

/// `GET /api/config` — the current document, or the hard-coded default when
/// the file is missing or corrupt.
pub async fn get_config(State(state): State<AppState>) -> Json<Value> {
    Json(state.settings.app_config_value())
}

/// `PUT /api/config` — wholesale overwrite, no schema validation beyond
/// JSON parse success.
pub async fn put_config(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    state.settings.save_app_config(&body)?;
    Ok(Json(json!({ "success": true })))
}

/// `GET /api/config/models`
pub async fn get_models(State(state): State<AppState>) -> Json<Value> {
    Json(state.settings.models_value())
}

/// `PUT /api/config/models`
pub async fn put_models(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    state.settings.save_models(&body)?;
    Ok(Json(json!({ "success": true })))
}

/// `GET /api/config/env` — selected environment values, credential masked.
pub async fn get_env(State(state): State<AppState>) -> Json<Value> {
    Json(state.env_editor.snapshot())
}

/// `PUT /api/config/env` — rewrite `.env` entries, skipping masked values,
/// and reinitialize the AI client when its key changed.
pub async fn put_env(
    State(state): State<AppState>,
    Json(body): Json<BTreeMap<String, String>>,
) -> Result<Json<Value>> {
    let changed = state.env_editor.apply_updates(&body)?;

    if changed.iter().any(|key| key == "OPENROUTER_API_KEY") {
        state.ai.reinit();
        log::info!("AI client reinitialized after key update");
    }

    Ok(Json(json!({ "success": true })))
}
