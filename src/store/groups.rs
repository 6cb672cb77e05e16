use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CodepromptError, Result};

/// A saved selection of files within one archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileGroup {
    pub name: String,
    pub filename: String,
    pub files: Vec<String>,
    pub created_at: String,
}

/// One JSON document per group under the groups directory, keyed by a
/// sanitized name. Created and deleted by explicit user action; no
/// update-in-place.
#[derive(Debug, Clone)]
pub struct GroupStore {
    dir: PathBuf,
}

/// Collapse anything outside `[a-zA-Z0-9]` to `_` for use as a document key.
pub fn sanitize_group_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

impl GroupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Persist a group and return its document id.
    pub fn save(&self, name: &str, filename: &str, files: Vec<String>) -> Result<String> {
        let id = sanitize_group_name(name);
        let group = FileGroup {
            name: name.to_string(),
            filename: filename.to_string(),
            files,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        super::write_json(&self.dir.join(format!("{}.json", id)), &group)?;
        Ok(id)
    }

    pub fn list(&self) -> Result<Vec<FileGroup>> {
        let mut groups = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                groups.push(super::read_json(&path)?);
            }
        }
        Ok(groups)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.dir.join(format!("{}.json", sanitize_group_name(name)));
        if !path.exists() {
            return Err(CodepromptError::NotFound("Not found".to_string()));
        }
        std::fs::remove_file(path)?;
        Ok(())
    }
}
