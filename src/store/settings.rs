use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// The editable app-config singleton.
///
/// PUT replaces the document wholesale; unknown fields round-trip untouched
/// because the HTTP layer stores the raw JSON value. This typed view exists
/// for the places the server itself reads (the upload size cap, the default
/// model), with defaults applied field-by-field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    #[serde(rename = "maxFileSizeMB")]
    pub max_file_size_mb: u64,
    pub default_model: String,
    pub enable_cache: bool,
    pub auto_select_important: bool,
    pub stream_responses: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            default_model: "openai/gpt-5.1-codex-mini".to_string(),
            enable_cache: true,
            auto_select_important: true,
            stream_responses: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

fn default_models() -> ModelList {
    ModelList {
        models: vec![
            ModelEntry {
                id: "openai/gpt-4.1-mini".to_string(),
                name: "GPT-4.1 Mini".to_string(),
                provider: "OpenAI".to_string(),
                enabled: true,
            },
            ModelEntry {
                id: "openai/gpt-5.1-codex-mini".to_string(),
                name: "GPT-5.1 Codex Mini".to_string(),
                provider: "OpenAI".to_string(),
                enabled: true,
            },
        ],
    }
}

/// The two settings singletons: app config and model list.
///
/// GET semantics return a hard-coded default when the file is missing or
/// corrupt; PUT overwrites wholesale.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    app_path: PathBuf,
    models_path: PathBuf,
}

impl SettingsStore {
    pub fn new(config_dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = config_dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            app_path: dir.join("app-config.json"),
            models_path: dir.join("models.json"),
        })
    }

    /// Seed both documents on first boot. `max_upload_mb` comes from the
    /// server config (MAX_FILE_SIZE_MB) and only applies to the seeded
    /// default — afterwards the document is the source of truth.
    pub fn seed(&self, max_upload_mb: u64) -> Result<()> {
        if !self.app_path.exists() {
            let settings = AppSettings {
                max_file_size_mb: max_upload_mb,
                ..AppSettings::default()
            };
            super::write_json(&self.app_path, &settings)?;
        }
        if !self.models_path.exists() {
            super::write_json(&self.models_path, &default_models())?;
        }
        Ok(())
    }

    /// Raw app-config document for the GET endpoint.
    pub fn app_config_value(&self) -> Value {
        super::read_json(&self.app_path)
            .unwrap_or_else(|_| serde_json::to_value(AppSettings::default()).unwrap_or_default())
    }

    /// Typed app-config view for server-side reads.
    pub fn app_settings(&self) -> AppSettings {
        super::read_json(&self.app_path).unwrap_or_default()
    }

    pub fn save_app_config(&self, value: &Value) -> Result<()> {
        super::write_json(&self.app_path, value)
    }

    /// Raw model-list document for the GET endpoint. Missing or corrupt
    /// files read as an empty list, not the seeded defaults.
    pub fn models_value(&self) -> Value {
        super::read_json(&self.models_path)
            .unwrap_or_else(|_| serde_json::json!({ "models": [] }))
    }

    pub fn model_entries(&self) -> Vec<ModelEntry> {
        super::read_json::<ModelList>(&self.models_path)
            .map(|list| list.models)
            .unwrap_or_default()
    }

    pub fn save_models(&self, value: &Value) -> Result<()> {
        super::write_json(&self.models_path, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_seed_and_typed_read() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path()).unwrap();
        store.seed(25).unwrap();

        let settings = store.app_settings();
        assert_eq!(settings.max_file_size_mb, 25);
        assert_eq!(settings.default_model, "openai/gpt-5.1-codex-mini");
        assert!(settings.enable_cache);

        let models = store.model_entries();
        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|m| m.enabled));
    }

    #[test]
    fn test_put_then_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path()).unwrap();

        let doc = serde_json::json!({
            "maxFileSizeMB": 10,
            "defaultModel": "x/y",
            "enableCache": false,
            "autoSelectImportant": false,
            "streamResponses": false,
            "extraField": "survives"
        });
        store.save_app_config(&doc).unwrap();
        assert_eq!(store.app_config_value(), doc);
        assert_eq!(store.app_settings().max_file_size_mb, 10);
    }

    #[test]
    fn test_missing_files_fall_back() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path()).unwrap();

        let value = store.app_config_value();
        assert_eq!(value["maxFileSizeMB"], 50);
        assert_eq!(store.models_value(), serde_json::json!({ "models": [] }));
        assert!(store.model_entries().is_empty());
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("app-config.json"), "{broken").unwrap();

        assert_eq!(store.app_config_value()["maxFileSizeMB"], 50);
        assert_eq!(store.app_settings().max_file_size_mb, 50);
    }
}
