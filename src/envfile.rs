//! Structured editing of the `.env` file.
//!
//! The document keeps every line — entries and verbatim text (comments,
//! blanks) — in order, so an update rewrites only the `KEY=value` lines it
//! touches and appends the rest. Values equal to the mask sentinel mean
//! "unchanged, do not overwrite" and are skipped.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::Result;

/// Display stand-in for credential values; also the skip sentinel on update.
pub const MASK: &str = "********";

#[derive(Debug, Clone, PartialEq)]
enum EnvLine {
    Entry { key: String, value: String },
    Raw(String),
}

/// An ordered `.env` document with a parse/serialize round trip.
#[derive(Debug, Clone, Default)]
pub struct EnvDocument {
    lines: Vec<EnvLine>,
}

fn is_key(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl EnvDocument {
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| {
                let trimmed = line.trim_start();
                if trimmed.starts_with('#') {
                    return EnvLine::Raw(line.to_string());
                }
                match line.split_once('=') {
                    Some((key, value)) if is_key(key.trim()) => EnvLine::Entry {
                        key: key.trim().to_string(),
                        value: value.to_string(),
                    },
                    _ => EnvLine::Raw(line.to_string()),
                }
            })
            .collect();
        Self { lines }
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                EnvLine::Entry { key, value } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(value);
                }
                EnvLine::Raw(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            EnvLine::Entry { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Replace the first entry for `key`, or append a new one.
    pub fn set(&mut self, key: &str, value: &str) {
        for line in &mut self.lines {
            if let EnvLine::Entry { key: k, value: v } = line {
                if k == key {
                    *v = value.to_string();
                    return;
                }
            }
        }
        self.lines.push(EnvLine::Entry {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
}

/// Reads and rewrites the `.env` file, mirroring updates into the process
/// environment.
#[derive(Debug, Clone)]
pub struct EnvEditor {
    path: PathBuf,
}

impl EnvEditor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<EnvDocument> {
        if self.path.exists() {
            let text = std::fs::read_to_string(&self.path)?;
            Ok(EnvDocument::parse(&text))
        } else {
            Ok(EnvDocument::default())
        }
    }

    /// The environment view shown to the settings UI, with the credential
    /// masked (empty string when unset).
    pub fn snapshot(&self) -> Value {
        let api_key = std::env::var("OPENROUTER_API_KEY").ok();
        serde_json::json!({
            "STORAGE_MODE": std::env::var("STORAGE_MODE").unwrap_or_else(|_| "local".to_string()),
            "OPENROUTER_API_KEY": if api_key.is_some_and(|k| !k.is_empty()) { MASK } else { "" },
            "DEFAULT_AI_MODEL": std::env::var("DEFAULT_AI_MODEL").unwrap_or_default(),
            "MAX_FILE_SIZE_MB": std::env::var("MAX_FILE_SIZE_MB").unwrap_or_else(|_| "50".to_string()),
        })
    }

    /// Apply `KEY=value` updates: masked values are skipped, everything else
    /// is written to the file and mirrored into the process environment.
    /// Returns the keys that were actually changed.
    pub fn apply_updates(&self, updates: &BTreeMap<String, String>) -> Result<Vec<String>> {
        let mut doc = self.load()?;
        let mut changed = Vec::new();

        for (key, value) in updates {
            if value == MASK {
                continue;
            }
            doc.set(key, value);
            std::env::set_var(key, value);
            changed.push(key.clone());
        }

        if !changed.is_empty() {
            std::fs::write(&self.path, doc.serialize())?;
        }

        Ok(changed)
    }
}
