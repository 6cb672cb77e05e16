use std::sync::RwLock;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::{CodepromptError, Result};

/// One turn in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: MessageContent::Text(content.into()),
        }
    }
}

/// Either a plain string or the structured part list used to attach
/// cache-control markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ContentPart {
    /// A text part tagged for upstream prompt caching.
    pub fn cached_text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
            cache_control: Some(CacheControl {
                kind: "ephemeral".to_string(),
            }),
        }
    }
}

/// Request body for the chat-completions endpoint
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

/// Response body from the chat-completions endpoint
#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Token accounting as reported upstream. `cache_read_input_tokens` is the
/// prompt-cache hit count (absent when the provider does not cache).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

impl Usage {
    pub fn cache_hit(&self) -> bool {
        self.cache_read_input_tokens.unwrap_or(0) > 0
    }
}

/// A completed exchange.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub content: String,
    pub model: String,
    pub usage: Option<Usage>,
}

/// Credentials re-read from the environment on reinit.
#[derive(Debug, Clone)]
struct ClientState {
    api_key: Option<String>,
    default_model: String,
}

/// OpenRouter-compatible chat-completions client.
///
/// Disabled when the API key env var is unset; `reinit` re-reads it so the
/// env editor can bring the client up without a restart.
pub struct ChatClient {
    http: Client,
    base_url: String,
    referer: String,
    title: String,
    api_key_env: String,
    default_model_env: String,
    fallback_model: String,
    state: RwLock<ClientState>,
}

impl ChatClient {
    pub fn new(config: &AiConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        let referer = std::env::var(&config.app_url_env)
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let client = Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            referer,
            title: config.app_title.clone(),
            api_key_env: config.api_key_env.clone(),
            default_model_env: config.default_model_env.clone(),
            fallback_model: config.default_model.clone(),
            state: RwLock::new(ClientState {
                api_key: None,
                default_model: config.default_model.clone(),
            }),
        };
        client.reinit();
        client
    }

    /// Re-read the API key and default model from the environment.
    pub fn reinit(&self) {
        let api_key = std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty());
        let default_model = std::env::var(&self.default_model_env)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.fallback_model.clone());

        let mut state = self.state.write().expect("client state poisoned");
        state.api_key = api_key;
        state.default_model = default_model;
    }

    pub fn enabled(&self) -> bool {
        self.state
            .read()
            .expect("client state poisoned")
            .api_key
            .is_some()
    }

    pub fn default_model(&self) -> String {
        self.state
            .read()
            .expect("client state poisoned")
            .default_model
            .clone()
    }

    /// Send one completion request. Any upstream failure is wrapped into a
    /// single error; there is no automatic retry.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>,
    ) -> Result<ChatOutcome> {
        let (api_key, default_model) = {
            let state = self.state.read().expect("client state poisoned");
            (state.api_key.clone(), state.default_model.clone())
        };
        let api_key = api_key.ok_or(CodepromptError::AiDisabled)?;
        let model = model.filter(|m| !m.is_empty()).unwrap_or(&default_model);

        let request = CompletionRequest {
            model,
            messages,
            temperature: 0.7,
            max_tokens: 4096,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&request)
            .send()
            .await
            .map_err(|e| CodepromptError::Upstream(format!("AI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(CodepromptError::Upstream(format!(
                "AI request failed: {} {}",
                status, body
            )));
        }

        let result: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CodepromptError::Upstream(format!("Failed to parse AI response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                CodepromptError::Upstream("Empty response from AI API".to_string())
            })?;

        Ok(ChatOutcome {
            content,
            model: result.model,
            usage: result.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns distinct env var names; parallel tests must not race
    // on process-wide state
    fn test_config(key_env: &str, model_env: &str) -> AiConfig {
        AiConfig {
            api_key_env: key_env.to_string(),
            default_model_env: model_env.to_string(),
            ..AiConfig::default()
        }
    }

    #[test]
    fn test_disabled_without_key() {
        let client = ChatClient::new(&test_config(
            "CODEPROMPT_TEST_AI_KEY_A",
            "CODEPROMPT_TEST_AI_MODEL_A",
        ));
        assert!(!client.enabled());
        assert_eq!(client.default_model(), "openai/gpt-5.1-codex-mini");
    }

    #[test]
    fn test_reinit_picks_up_key() {
        let client = ChatClient::new(&test_config(
            "CODEPROMPT_TEST_AI_KEY_B",
            "CODEPROMPT_TEST_AI_MODEL_B",
        ));
        assert!(!client.enabled());

        std::env::set_var("CODEPROMPT_TEST_AI_KEY_B", "sk-test");
        std::env::set_var("CODEPROMPT_TEST_AI_MODEL_B", "custom/model");
        client.reinit();
        assert!(client.enabled());
        assert_eq!(client.default_model(), "custom/model");

        std::env::remove_var("CODEPROMPT_TEST_AI_KEY_B");
        std::env::remove_var("CODEPROMPT_TEST_AI_MODEL_B");
    }

    #[test]
    fn test_message_content_wire_shapes() {
        let plain = ChatMessage::text("user", "hi");
        let json = serde_json::to_value(&plain).unwrap();
        assert_eq!(json["content"], "hi");

        let cached = ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![ContentPart::cached_text("ctx")]),
        };
        let json = serde_json::to_value(&cached).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["cache_control"]["type"], "ephemeral");
    }

    #[test]
    fn test_usage_cache_hit() {
        let usage = Usage {
            cache_read_input_tokens: Some(128),
            ..Usage::default()
        };
        assert!(usage.cache_hit());
        assert!(!Usage::default().cache_hit());
    }
}
