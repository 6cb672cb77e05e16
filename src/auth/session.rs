use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal GitHub profile kept against a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Server-side session record.
///
/// State machine: unauthenticated (all None) → pending (`oauth_state` set)
/// → authenticated (`access_token` + `github_user` set) → revoked
/// (destroyed). Held only in process memory; lost on restart.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: Option<String>,
    pub github_user: Option<GithubUser>,
    pub oauth_state: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        Self {
            access_token: None,
            github_user: None,
            oauth_state: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Session persistence boundary, injected into request handlers.
///
/// The in-memory implementation below serves a single process; a
/// deployment needing shared sessions can provide another implementation
/// without touching the handlers.
pub trait SessionStore: Send + Sync {
    /// Create a fresh unauthenticated session and return its id.
    fn create(&self) -> String;
    fn get(&self, id: &str) -> Option<Session>;
    /// Replace a session's record. Returns false when the id is unknown.
    fn update(&self, id: &str, session: Session) -> bool;
    fn destroy(&self, id: &str);
}

/// Mutex-guarded in-memory map. The lock is required: handlers run on a
/// multi-threaded runtime.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        sessions.insert(id.clone(), Session::new());
        id
    }

    fn get(&self, id: &str) -> Option<Session> {
        let sessions = self.sessions.lock().expect("session store poisoned");
        sessions.get(id).cloned()
    }

    fn update(&self, id: &str, session: Session) -> bool {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        match sessions.get_mut(id) {
            Some(slot) => {
                *slot = session;
                true
            }
            None => false,
        }
    }

    fn destroy(&self, id: &str) {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        sessions.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_get_update_destroy() {
        let store = MemorySessionStore::new();
        let id = store.create();

        let session = store.get(&id).unwrap();
        assert!(!session.is_authenticated());
        assert!(session.oauth_state.is_none());

        let mut session = session;
        session.oauth_state = Some("nonce".to_string());
        assert!(store.update(&id, session));
        assert_eq!(store.get(&id).unwrap().oauth_state.as_deref(), Some("nonce"));

        store.destroy(&id);
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_update_unknown_id() {
        let store = MemorySessionStore::new();
        assert!(!store.update("ghost", Session::new()));
    }

    #[test]
    fn test_ids_are_unique() {
        let store = MemorySessionStore::new();
        assert_ne!(store.create(), store.create());
    }
}
