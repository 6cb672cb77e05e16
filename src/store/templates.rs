use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub content: String,
}

/// Prompt templates: a single JSON array file, seeded with the defaults on
/// first boot.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
}

fn default_templates() -> Vec<PromptTemplate> {
    [
        (
            "Code Analysis",
            "Please analyze the following code and provide insights on its architecture, design patterns, and potential improvements:\n\n",
        ),
        (
            "Bug Finding",
            "Please review the following code and identify any bugs, security vulnerabilities, or performance issues:\n\n",
        ),
        (
            "Documentation Generator",
            "Please generate comprehensive documentation for the following code including function descriptions, parameters, and usage examples:\n\n",
        ),
        (
            "Code Refactoring",
            "Please suggest refactoring for the following code to improve its readability, maintainability, and performance:\n\n",
        ),
    ]
    .iter()
    .map(|(name, content)| PromptTemplate {
        name: name.to_string(),
        content: content.to_string(),
    })
    .collect()
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join("default-templates.json"),
        })
    }

    /// Write the default template array unless the file already exists.
    pub fn seed(&self) -> Result<()> {
        if !self.path.exists() {
            super::write_json(&self.path, &default_templates())?;
        }
        Ok(())
    }

    /// The stored templates, falling back to the built-in defaults when the
    /// file is missing.
    pub fn load(&self) -> Result<Vec<PromptTemplate>> {
        if self.path.exists() {
            super::read_json(&self.path)
        } else {
            Ok(default_templates())
        }
    }
}
