//! File-group and prompt-template handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{CodepromptError, Result};
use crate::store::{FileGroup, PromptTemplate};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub files: Option<Vec<String>>,
}

/// `POST /file-groups`
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<Json<Value>> {
    let (Some(name), Some(filename), Some(files)) =
        (request.name, request.filename, request.files)
    else {
        return Err(CodepromptError::InvalidInput("Missing fields".to_string()));
    };

    let id = state.groups.save(&name, &filename, files)?;
    Ok(Json(json!({ "message": "Saved", "id": id })))
}

/// `GET /file-groups`
pub async fn list_groups(State(state): State<AppState>) -> Result<Json<Vec<FileGroup>>> {
    Ok(Json(state.groups.list()?))
}

/// `DELETE /file-groups/:name`
pub async fn delete_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>> {
    state.groups.delete(&name)?;
    Ok(Json(json!({ "message": "Deleted" })))
}

/// `GET /prompt-templates`
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<PromptTemplate>>> {
    Ok(Json(state.templates.load()?))
}
