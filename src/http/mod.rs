//! HTTP surface: application state, router and request handlers.

pub mod ai;
pub mod auth;
pub mod groups;
pub mod settings;
pub mod uploads;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::archive::ArchiveStore;
use crate::auth::{GithubOauth, SessionStore};
use crate::chat::{ChatClient, ChatHistory};
use crate::config::Config;
use crate::envfile::EnvEditor;
use crate::error::Result;
use crate::store::{GroupStore, SettingsStore, TemplateStore};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "codeprompt_sid";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub archives: Arc<ArchiveStore>,
    pub groups: Arc<GroupStore>,
    pub templates: Arc<TemplateStore>,
    pub settings: Arc<SettingsStore>,
    pub env_editor: Arc<EnvEditor>,
    pub ai: Arc<ChatClient>,
    pub history: Arc<ChatHistory>,
    pub sessions: Arc<dyn SessionStore>,
    pub oauth: Arc<GithubOauth>,
    pub http: reqwest::Client,
}

/// Create the axum router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        // File upload & management
        .route("/upload", post(uploads::upload))
        .route("/upload/:filename", delete(uploads::delete_upload))
        .route("/uploads", get(uploads::list_uploads))
        .route("/file-preview/:filename/*filepath", get(uploads::file_preview))
        .route("/reopen/:filename", get(uploads::reopen))
        .route("/extract", post(uploads::extract))
        // File groups & prompt templates
        .route(
            "/file-groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route("/file-groups/:name", delete(groups::delete_group))
        .route("/prompt-templates", get(groups::list_templates))
        // App config
        .route(
            "/api/config",
            get(settings::get_config).put(settings::put_config),
        )
        .route(
            "/api/config/models",
            get(settings::get_models).put(settings::put_models),
        )
        .route(
            "/api/config/env",
            get(settings::get_env).put(settings::put_env),
        )
        // AI chat, analysis & agents
        .route("/api/ai/chat", post(ai::chat))
        .route("/api/ai/chat/:project_id", get(ai::chat_history))
        .route("/api/ai/models", get(ai::list_models))
        .route("/api/ai/analyze", post(ai::analyze))
        .route("/api/ai/agent/:agent_type", post(ai::run_agent))
        .route("/api/ai/agents", get(ai::list_agents))
        // GitHub OAuth & repos
        .route("/auth/github", get(auth::login))
        .route("/auth/github/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout))
        .route("/api/auth/status", get(auth::status))
        .route("/api/repos", get(auth::list_repos))
        // The live size cap is enforced per-upload against the app config;
        // this outer limit only bounds what axum will buffer at all.
        .layer(DefaultBodyLimit::max(256 * 1024 * 1024))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

/// Run the HTTP server until shutdown.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = format!("127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        crate::error::CodepromptError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to bind to {}: {}", addr, e),
        ))
    })?;
    log::info!("Codeprompt server running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(crate::error::CodepromptError::Io)?;

    Ok(())
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "codeprompt",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Extract the session id from the Cookie header.
pub(crate) fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get("cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Build the Set-Cookie value for a session id (one week max-age).
pub(crate) fn session_cookie(id: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800",
        SESSION_COOKIE, id
    )
}

/// Attach a Set-Cookie header to a response.
pub(crate) fn with_session_cookie(mut response: Response, id: &str) -> Response {
    if let Ok(value) = axum::http::HeaderValue::from_str(&session_cookie(id)) {
        response
            .headers_mut()
            .append(axum::http::header::SET_COOKIE, value);
    }
    response
}
