//! Session Store
//!
//! Conversation sessions keyed by (application, user, session id). The store
//! owns every session; callers only ever hold shared handles to them.

use crate::event::Content;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Key-value state attached to a session.
pub type SessionState = HashMap<String, Value>;

/// The identifier triple a session is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(app_name: &str, user_id: &str, session_id: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        }
    }
}

/// A single conversation session.
///
/// Identity is immutable; state and history are guarded so that concurrent
/// runs against the same session serialize their updates.
#[derive(Debug)]
pub struct Session {
    key: SessionKey,
    state: Mutex<SessionState>,
    history: Mutex<Vec<Content>>,
}

impl Session {
    fn new(key: SessionKey, initial_state: SessionState) -> Self {
        Self {
            key,
            state: Mutex::new(initial_state),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn id(&self) -> &str {
        &self.key.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.key.user_id
    }

    pub async fn state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn set_state(&self, key: impl Into<String>, value: Value) {
        self.state.lock().await.insert(key.into(), value);
    }

    pub async fn history(&self) -> Vec<Content> {
        self.history.lock().await.clone()
    }

    pub async fn append(&self, content: Content) {
        self.history.lock().await.push(content);
    }
}

/// Defines the contract for any backend that stores sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Exact-key lookup.
    async fn get(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Arc<Session>>>;

    /// Creates a session. If the triple already exists the stored session is
    /// returned untouched and `initial_state` is discarded.
    async fn create(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        initial_state: SessionState,
    ) -> Result<Arc<Session>>;

    /// Removes a session, reporting whether it existed.
    async fn delete(&self, app_name: &str, user_id: &str, session_id: &str) -> Result<bool>;

    /// All sessions of one user within one application.
    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<Arc<Session>>>;
}

/// A process-local `SessionStore` backed by a locked map.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionKey, Arc<Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Arc<Session>>> {
        let key = SessionKey::new(app_name, user_id, session_id);
        Ok(self.sessions.read().await.get(&key).cloned())
    }

    async fn create(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        initial_state: SessionState,
    ) -> Result<Arc<Session>> {
        let key = SessionKey::new(app_name, user_id, session_id);
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Session::new(key, initial_state)));
        Ok(session.clone())
    }

    async fn delete(&self, app_name: &str, user_id: &str, session_id: &str) -> Result<bool> {
        let key = SessionKey::new(app_name, user_id, session_id);
        Ok(self.sessions.write().await.remove(&key).is_some())
    }

    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<Arc<Session>>> {
        let sessions = self.sessions.read().await;
        let mut found: Vec<Arc<Session>> = sessions
            .iter()
            .filter(|(key, _)| key.app_name == app_name && key.user_id == user_id)
            .map(|(_, session)| session.clone())
            .collect();
        found.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(found)
    }
}
