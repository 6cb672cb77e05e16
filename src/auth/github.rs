use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::session::GithubUser;
use crate::config::GithubConfig;
use crate::error::{CodepromptError, Result};

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const API_BASE: &str = "https://api.github.com";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error_description: Option<String>,
}

/// GitHub OAuth web-flow client plus the two API calls the app makes with
/// the resulting token (profile fetch, repository listing).
pub struct GithubOauth {
    http: Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_url: String,
}

impl GithubOauth {
    pub fn new(config: &GithubConfig, redirect_url: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            client_id: std::env::var(&config.client_id_env).ok().filter(|v| !v.is_empty()),
            client_secret: std::env::var(&config.client_secret_env)
                .ok()
                .filter(|v| !v.is_empty()),
            redirect_url,
        }
    }

    pub fn configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(CodepromptError::Config(
                "GitHub OAuth not configured. Set GITHUB_CLIENT_ID and GITHUB_CLIENT_SECRET."
                    .to_string(),
            )),
        }
    }

    /// The authorization redirect target carrying the CSRF state nonce.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let (client_id, _) = self.credentials()?;
        let mut url = url::Url::parse(AUTHORIZE_URL)
            .map_err(|e| CodepromptError::Config(format!("Invalid authorize URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("scope", "repo read:user")
            .append_pair("state", state);
        Ok(url.to_string())
    }

    /// Exchange the callback code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let (client_id, client_secret) = self.credentials()?;

        let response = self
            .http
            .post(TOKEN_URL)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("redirect_uri", &self.redirect_url),
            ])
            .send()
            .await
            .map_err(|e| CodepromptError::Upstream(format!("OAuth token exchange failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CodepromptError::Upstream(format!(
                "OAuth token exchange failed: {}",
                status
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            CodepromptError::Upstream(format!("Failed to parse token response: {}", e))
        })?;

        token.access_token.ok_or_else(|| {
            CodepromptError::Upstream(format!(
                "OAuth token exchange failed: {}",
                token
                    .error_description
                    .unwrap_or_else(|| "no access token in response".to_string())
            ))
        })
    }

    /// Fetch the authenticated user's minimal profile.
    pub async fn fetch_user(&self, token: &str) -> Result<GithubUser> {
        let response = self
            .http
            .get(format!("{}/user", API_BASE))
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "codeprompt")
            .send()
            .await
            .map_err(|e| CodepromptError::Upstream(format!("Profile fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CodepromptError::Upstream(format!(
                "Profile fetch failed: {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CodepromptError::Upstream(format!("Failed to parse profile: {}", e)))
    }

    /// List the caller's repositories, most recently updated first.
    pub async fn list_repos(&self, token: &str) -> Result<Value> {
        let response = self
            .http
            .get(format!("{}/user/repos?per_page=100&sort=updated", API_BASE))
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "codeprompt")
            .send()
            .await
            .map_err(|e| CodepromptError::Upstream(format!("Repo listing failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CodepromptError::Upstream(format!(
                "Repo listing failed: {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CodepromptError::Upstream(format!("Failed to parse repo list: {}", e)))
    }
}
