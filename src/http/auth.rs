//! GitHub OAuth flow and authenticated API handlers.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Session;
use crate::error::{CodepromptError, Result};

use super::{session_id_from_headers, with_session_cookie, AppState};

/// Existing session for the request cookie, if any.
fn request_session(state: &AppState, headers: &HeaderMap) -> Option<(String, Session)> {
    let sid = session_id_from_headers(headers)?;
    let session = state.sessions.get(&sid)?;
    Some((sid, session))
}

/// `GET /auth/github` — issue a state nonce and redirect to GitHub.
pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    // Reuse the caller's session when the cookie is valid; otherwise start
    // a fresh one
    let (sid, mut session) = match request_session(&state, &headers) {
        Some(existing) => existing,
        None => {
            let sid = state.sessions.create();
            let session = state
                .sessions
                .get(&sid)
                .ok_or_else(|| CodepromptError::Config("Session store lost a new session".to_string()))?;
            (sid, session)
        }
    };

    let nonce = Uuid::new_v4().to_string();
    session.oauth_state = Some(nonce.clone());
    state.sessions.update(&sid, session);

    let url = state.oauth.authorize_url(&nonce)?;
    Ok(with_session_cookie(Redirect::to(&url).into_response(), &sid))
}

/// `GET /auth/github/callback` — CSRF check, then code→token exchange.
///
/// Fails closed: any missing or mismatched state nonce is a client error
/// and no authenticated session is created.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response> {
    let code = params
        .get("code")
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CodepromptError::InvalidInput("Missing authorization code".to_string()))?;
    let presented_state = params.get("state").cloned().unwrap_or_default();

    let (sid, mut session) = request_session(&state, &headers)
        .ok_or_else(|| CodepromptError::InvalidInput("No pending OAuth session".to_string()))?;

    let expected = session.oauth_state.take();
    // Clear the nonce regardless of outcome so it cannot be replayed
    state.sessions.update(&sid, session.clone());

    if expected.as_deref() != Some(presented_state.as_str()) || presented_state.is_empty() {
        return Err(CodepromptError::InvalidInput(
            "OAuth state mismatch".to_string(),
        ));
    }

    let token = state.oauth.exchange_code(code).await?;
    let user = state.oauth.fetch_user(&token).await?;
    log::info!("GitHub login: {}", user.login);

    session.access_token = Some(token);
    session.github_user = Some(user);
    session.oauth_state = None;
    state.sessions.update(&sid, session);

    Ok(Redirect::to("/").into_response())
}

/// `GET /auth/logout` — revoke the session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(sid) = session_id_from_headers(&headers) {
        state.sessions.destroy(&sid);
    }
    Redirect::to("/").into_response()
}

/// `GET /api/auth/status`
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    match request_session(&state, &headers) {
        Some((_, session)) if session.is_authenticated() => Json(json!({
            "authenticated": true,
            "user": session.github_user,
        })),
        _ => Json(json!({ "authenticated": false })),
    }
}

/// `GET /api/repos` — the caller's repositories via their bearer token.
pub async fn list_repos(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let token = request_session(&state, &headers)
        .and_then(|(_, session)| session.access_token)
        .ok_or_else(|| CodepromptError::Unauthorized("Authentication required".to_string()))?;

    Ok(Json(state.oauth.list_repos(&token).await?))
}
