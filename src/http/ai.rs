//! AI chat, analysis and agent handlers.

use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::archive;
use crate::chat::prompt::{
    assemble_messages, detect_file_mentions, smart_system_prompt, BASE_SYSTEM_PROMPT,
};
use crate::chat::{
    agent_catalog, agent_system_prompt, analysis_system_prompt, ChatMessage, StoredMessage, Usage,
};
use crate::error::{CodepromptError, Result};
use crate::tree::{build_file_structure, render_tree_text};

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    pub model: Option<String>,
    pub context_files: Option<String>,
    pub project_id: Option<String>,
    #[serde(default)]
    pub enable_cache: bool,
    #[serde(default)]
    pub smart: bool,
    /// Archive whose tree feeds the smart system prompt.
    pub filename: Option<String>,
    /// Paths the client already holds in context; mentions of these are not
    /// suggested again.
    #[serde(default)]
    pub context_paths: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub cached: bool,
    pub suggested_files: Vec<String>,
}

/// `POST /api/ai/chat`
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    if !state.ai.enabled() {
        return Err(CodepromptError::AiDisabled);
    }

    let message = request
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| CodepromptError::InvalidInput("Message is required".to_string()))?;

    let history = match &request.project_id {
        Some(project_id) => state.history.for_project(project_id).await?,
        None => Vec::new(),
    };

    // Smart mode reads the archive to embed its tree in the instruction and
    // to know which reply mentions are real files
    let mut available_files = Vec::new();
    let system_prompt = if request.smart {
        let filename = request.filename.as_deref().ok_or_else(|| {
            CodepromptError::InvalidInput("Smart chat requires a project filename".to_string())
        })?;
        let data = state.archives.read(filename).await?;
        let opened = archive::open_archive(data)?;
        available_files = archive::entry_paths(&opened);
        let tree_text = render_tree_text(&build_file_structure(&available_files));
        smart_system_prompt(&tree_text, &available_files)
    } else {
        BASE_SYSTEM_PROMPT.to_string()
    };

    let messages = assemble_messages(
        &system_prompt,
        request.context_files.as_deref(),
        request.enable_cache,
        &history,
        &message,
    );

    let outcome = state.ai.chat(&messages, request.model.as_deref()).await?;

    if let Some(project_id) = &request.project_id {
        state.history.append(project_id, "user", &message, None).await?;
        state
            .history
            .append(project_id, "assistant", &outcome.content, Some(&outcome.model))
            .await?;
    }

    let suggested_files = if request.smart {
        let in_context: HashSet<String> = request.context_paths.into_iter().collect();
        detect_file_mentions(&outcome.content, &available_files, &in_context)
    } else {
        Vec::new()
    };

    let cached = outcome.usage.as_ref().is_some_and(Usage::cache_hit);
    Ok(Json(ChatResponse {
        response: outcome.content,
        model: outcome.model,
        usage: outcome.usage,
        cached,
        suggested_files,
    }))
}

/// `GET /api/ai/chat/:project_id` — stored history.
pub async fn chat_history(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<StoredMessage>>> {
    Ok(Json(state.history.for_project(&project_id).await?))
}

/// `GET /api/ai/models` — the configured model list (empty on store
/// failure).
pub async fn list_models(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::to_value(state.settings.model_entries()).unwrap_or_else(|_| json!([])))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub analysis_type: Option<String>,
}

/// `POST /api/ai/analyze` — one-shot project analysis.
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<Value>> {
    if !state.ai.enabled() {
        return Err(CodepromptError::AiDisabled);
    }
    let content = request
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CodepromptError::InvalidInput("Content required".to_string()))?;

    let kind = request.analysis_type.as_deref().unwrap_or("general");
    let messages = vec![
        ChatMessage::text("system", analysis_system_prompt(kind)),
        ChatMessage::text("user", format!("Project Code:\n\n{}", content)),
    ];

    let outcome = state.ai.chat(&messages, None).await?;
    Ok(Json(json!({
        "analysis": outcome.content,
        "model": outcome.model,
        "usage": outcome.usage,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    pub content: Option<String>,
}

/// `POST /api/ai/agent/:agent_type` — canned agent run.
pub async fn run_agent(
    State(state): State<AppState>,
    Path(agent_type): Path<String>,
    Json(request): Json<AgentRequest>,
) -> Result<Json<Value>> {
    if !state.ai.enabled() {
        return Err(CodepromptError::AiDisabled);
    }
    let content = request
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CodepromptError::InvalidInput("Content required".to_string()))?;

    let messages = vec![
        ChatMessage::text("system", agent_system_prompt(&agent_type)),
        ChatMessage::text("user", content),
    ];

    let outcome = state.ai.chat(&messages, None).await?;
    Ok(Json(json!({
        "result": outcome.content,
        "agent": agent_type,
        "model": outcome.model,
    })))
}

/// `GET /api/ai/agents` — static agent descriptors.
pub async fn list_agents() -> Json<Value> {
    Json(serde_json::to_value(agent_catalog()).unwrap_or_else(|_| json!([])))
}
