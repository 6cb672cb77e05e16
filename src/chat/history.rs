use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tokio::task;

use crate::error::{CodepromptError, Result};

/// One persisted chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Append/read chat log keyed by project id, backed by SQLite.
pub struct ChatHistory {
    path: PathBuf,
}

impl ChatHistory {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            path: db_path.as_ref().to_path_buf(),
        }
    }

    /// Execute a closure with a database connection in a blocking task
    async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let mut conn = Connection::open(&path).map_err(CodepromptError::Database)?;

            // WAL for concurrent readers, NORMAL sync for speed
            conn.execute_batch(
                "PRAGMA journal_mode = WAL; \
                 PRAGMA synchronous = NORMAL; \
                 PRAGMA foreign_keys = ON;",
            )?;

            f(&mut conn)
        })
        .await
        .map_err(|_e| CodepromptError::Database(rusqlite::Error::InvalidParameterCount(0, 0)))?
    }

    /// Create the schema if it doesn't exist. Called once at startup.
    pub async fn ensure_schema(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.with_connection(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS chat_messages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    project_id TEXT NOT NULL,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL,
                    model TEXT,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );
                CREATE INDEX IF NOT EXISTS idx_chat_messages_project
                    ON chat_messages(project_id, id);",
            )?;
            Ok(())
        })
        .await
    }

    /// Append one turn to a project's log.
    pub async fn append(
        &self,
        project_id: &str,
        role: &str,
        content: &str,
        model: Option<&str>,
    ) -> Result<()> {
        let project_id = project_id.to_string();
        let role = role.to_string();
        let content = content.to_string();
        let model = model.map(str::to_string);
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO chat_messages (project_id, role, content, model)
                 VALUES (?1, ?2, ?3, ?4)",
                params![project_id, role, content, model],
            )?;
            Ok(())
        })
        .await
    }

    /// All turns for a project in insertion order.
    pub async fn for_project(&self, project_id: &str) -> Result<Vec<StoredMessage>> {
        let project_id = project_id.to_string();
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT role, content, model FROM chat_messages
                 WHERE project_id = ?1 ORDER BY id",
            )?;
            let messages = stmt
                .query_map(params![project_id], |row| {
                    Ok(StoredMessage {
                        role: row.get(0)?,
                        content: row.get(1)?,
                        model: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()
                .map_err(CodepromptError::Database)?;
            Ok(messages)
        })
        .await
    }
}
