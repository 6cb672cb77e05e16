//! Flat JSON document persistence: file groups, prompt templates and the
//! two settings singletons. Read/replace semantics only — no partial patch,
//! no schema validation beyond JSON parse success, no file locking.

pub mod groups;
pub mod settings;
pub mod templates;

pub use groups::{FileGroup, GroupStore};
pub use settings::{AppSettings, ModelEntry, SettingsStore};
pub use templates::{PromptTemplate, TemplateStore};

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Read and parse one JSON document.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)
        .map_err(|e| crate::error::CodepromptError::Config(format!(
            "Failed to parse {}: {}",
            path.display(),
            e
        )))?)
}

/// Write one JSON document pretty-printed, replacing any previous content.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| crate::error::CodepromptError::Config(format!("Serialize failed: {}", e)))?;
    std::fs::write(path, text)?;
    Ok(())
}
