use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Every section has serde defaults so the server runs with no config file
/// at all; `config.toml` (or the file named by `CODEPROMPT_CONFIG`) overrides
/// individual values. Secrets are never placed in the file — they are read
/// from the environment via the `*_env` variable names below.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
    pub github: GithubConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Seed value for the editable app-config document; the live cap is read
    /// from that document on every upload.
    pub default_max_upload_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            default_max_upload_mb: default_max_upload_mb(),
        }
    }
}

/// On-disk layout for archives, JSON stores and the chat-history database
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub uploads_dir: PathBuf,
    pub groups_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub config_dir: PathBuf,
    pub db_path: PathBuf,
    pub env_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            groups_dir: PathBuf::from("filegroups"),
            templates_dir: PathBuf::from("prompttemplates"),
            config_dir: PathBuf::from("config"),
            db_path: PathBuf::from("data/chat-history.db"),
            env_file: PathBuf::from(".env"),
        }
    }
}

/// Upstream AI completion API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub default_model_env: String,
    pub default_model: String,
    pub app_url_env: String,
    pub app_title: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            default_model_env: "DEFAULT_AI_MODEL".to_string(),
            default_model: "openai/gpt-5.1-codex-mini".to_string(),
            app_url_env: "APP_URL".to_string(),
            app_title: "Codeprompt".to_string(),
        }
    }
}

/// GitHub OAuth app configuration (optional — auth routes answer with a
/// configuration error when the env vars are unset)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub client_id_env: String,
    pub client_secret_env: String,
    /// Callback URL registered with the OAuth app. Defaults to the local
    /// server's own callback route.
    pub redirect_url: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            client_id_env: "GITHUB_CLIENT_ID".to_string(),
            client_secret_env: "GITHUB_CLIENT_SECRET".to_string(),
            redirect_url: None,
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_mb() -> u64 {
    50
}

impl Config {
    /// Load configuration
    ///
    /// Loads environment variables from .env file (if present) first, so
    /// `PORT`, `MAX_FILE_SIZE_MB` and API keys can live there. Looks for the
    /// config file in this order:
    /// 1. Explicit path passed by the caller (the `--config` flag)
    /// 2. Path specified in CODEPROMPT_CONFIG environment variable
    /// 3. ./config.toml in current directory (optional — defaults apply when
    ///    the file does not exist)
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("CODEPROMPT_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("config.toml"));

        let mut config = if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
            toml::from_str(&config_str)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            Config::default()
        };

        // Environment overrides mirroring the deployment knobs
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }
        if let Ok(mb) = std::env::var("MAX_FILE_SIZE_MB") {
            config.server.default_max_upload_mb = mb
                .parse()
                .with_context(|| format!("Invalid MAX_FILE_SIZE_MB value: {}", mb))?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.default_max_upload_mb == 0 {
            anyhow::bail!("server.default_max_upload_mb must be greater than 0");
        }

        if self.ai.base_url.is_empty() {
            anyhow::bail!("ai.base_url must not be empty");
        }

        Ok(())
    }

    /// Effective OAuth callback URL
    pub fn oauth_redirect_url(&self) -> String {
        self.github.redirect_url.clone().unwrap_or_else(|| {
            format!("http://localhost:{}/auth/github/callback", self.server.port)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        std::env::remove_var("PORT");
        std::env::remove_var("MAX_FILE_SIZE_MB");
        std::env::remove_var("CODEPROMPT_CONFIG");
    }

    #[test]
    fn test_defaults_without_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");

        let config = Config::load(Some(&missing)).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.default_max_upload_mb, 50);
        assert_eq!(config.ai.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(config.storage.uploads_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_load_from_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[server]
port = 9090

[storage]
uploads_dir = "blobs"

[ai]
app_title = "Test Title"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&config_path)).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.storage.uploads_dir, PathBuf::from("blobs"));
        assert_eq!(config.ai.app_title, "Test Title");
        // Untouched sections keep their defaults
        assert_eq!(config.server.default_max_upload_mb, 50);
        assert_eq!(config.storage.db_path, PathBuf::from("data/chat-history.db"));
    }

    #[test]
    fn test_env_overrides() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");

        std::env::set_var("PORT", "3000");
        std::env::set_var("MAX_FILE_SIZE_MB", "10");
        let config = Config::load(Some(&missing)).unwrap();
        clear_env();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.default_max_upload_mb, 10);
    }

    #[test]
    fn test_invalid_port_value() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");

        std::env::set_var("PORT", "not-a-port");
        let result = Config::load(Some(&missing));
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_default_redirect_url() {
        let config = Config::default();
        assert_eq!(
            config.oauth_redirect_url(),
            "http://localhost:8080/auth/github/callback"
        );
    }
}
