//! Upload, preview, reopen and extraction handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::archive::{self, OpenArchive};
use crate::error::{CodepromptError, Result};
use crate::extract::merge_files;
use crate::fetch;
use crate::important::identify_important_files;
use crate::tree::{build_file_structure, FileStructure};

use super::{session_id_from_headers, AppState};

/// Shape shared by upload and reopen responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub file_structure: FileStructure,
    pub filename: String,
    pub important_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

fn describe_archive(data: Vec<u8>, filename: String, size: Option<usize>) -> Result<ProjectView> {
    let archive = archive::open_archive(data)?;
    let entries = archive::entry_paths(&archive);
    Ok(ProjectView {
        file_structure: build_file_structure(&entries),
        important_files: identify_important_files(&entries),
        filename,
        size,
    })
}

/// `POST /upload` — multipart with either a `zipFile` or a `url`
/// (plus optional `branch` for GitHub clones).
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ProjectView>> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut url: Option<String> = None;
    let mut branch = "main".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CodepromptError::InvalidInput(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "zipFile" => {
                let filename = field.file_name().unwrap_or("upload.zip").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| CodepromptError::InvalidInput(format!("Failed to read field: {}", e)))?;
                file = Some((filename, data.to_vec()));
            }
            "url" => {
                url = Some(field.text().await.map_err(|e| {
                    CodepromptError::InvalidInput(format!("Failed to read field: {}", e))
                })?);
            }
            "branch" => {
                let value = field.text().await.map_err(|e| {
                    CodepromptError::InvalidInput(format!("Failed to read field: {}", e))
                })?;
                if !value.is_empty() {
                    branch = value;
                }
            }
            _ => {}
        }
    }

    let (filename, buffer) = if let Some((filename, buffer)) = file {
        (filename, buffer)
    } else if let Some(url) = url {
        if url.contains("github.com") {
            // A logged-in user's token makes private repos clonable
            let token = session_id_from_headers(&headers)
                .and_then(|sid| state.sessions.get(&sid))
                .and_then(|s| s.access_token);
            let buffer = fetch::fetch_github_repo(&url, &branch, token.as_deref()).await?;
            (fetch::filename_from_repo_url(&url), buffer)
        } else {
            let buffer = fetch::fetch_url(&state.http, &url).await?;
            (fetch::filename_from_url(&url), buffer)
        }
    } else {
        return Err(CodepromptError::InvalidInput(
            "No file or URL provided".to_string(),
        ));
    };

    // Size cap comes from the editable app config, checked before the
    // archive is persisted
    let max_mb = state.settings.app_settings().max_file_size_mb;
    if buffer.len() as u64 > max_mb * 1024 * 1024 {
        return Err(CodepromptError::TooLarge {
            size_mb: (buffer.len() as f64 / 1024.0 / 1024.0).round() as u64,
            max_mb,
        });
    }

    state.archives.save(&filename, &buffer).await?;
    log::info!("Stored project {} ({} bytes)", filename, buffer.len());

    let size = buffer.len();
    let view = describe_archive(buffer, filename, Some(size))?;
    Ok(Json(view))
}

/// `GET /reopen/:filename` — re-describe a stored archive.
pub async fn reopen(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ProjectView>> {
    let data = state.archives.read(&filename).await?;
    let view = describe_archive(data, filename, None)?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: String,
}

/// `GET /file-preview/:filename/*filepath`
pub async fn file_preview(
    State(state): State<AppState>,
    Path((filename, filepath)): Path<(String, String)>,
) -> Result<Json<ContentResponse>> {
    let data = state.archives.read(&filename).await?;
    let mut archive = archive::open_archive(data)?;
    let content = archive::read_entry_text(&mut archive, &filepath)
        .ok_or_else(|| CodepromptError::NotFound("File not found in ZIP".to_string()))?;
    Ok(Json(ContentResponse { content }))
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub filename: Option<String>,
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub summarize: bool,
}

/// `POST /extract` — merge selected entries into one text document.
pub async fn extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ContentResponse>> {
    let (Some(filename), Some(files)) = (request.filename, request.files) else {
        return Err(CodepromptError::InvalidInput(
            "Missing filename or file list".to_string(),
        ));
    };

    let data = state.archives.read(&filename).await?;
    let mut archive: OpenArchive = archive::open_archive(data)?;
    let content = merge_files(&files, request.summarize, |path| {
        archive::read_entry_text(&mut archive, path)
    });

    Ok(Json(ContentResponse { content }))
}

/// `GET /uploads` — stored archive filenames.
pub async fn list_uploads(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.archives.list().await?))
}

/// `DELETE /upload/:filename`
pub async fn delete_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.archives.delete(&filename).await?;
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
