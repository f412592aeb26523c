//! Task Dispatcher
//!
//! Accepts a task, resolves its session, drives the agent runtime to the end
//! of its event stream and returns a normalized [`TaskResponse`]. Failures
//! never escape [`TaskDispatcher::process_task`]; they come back as an
//! error-status response.

use crate::{
    event::Content,
    extract::{EventExtractor, Extraction},
    response::TaskResponse,
    runtime::{AgentRuntime, RuntimeError},
    session::{SessionState, SessionStore},
};
use anyhow::Result;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Context key a caller may use to identify the user.
pub const USER_ID_KEY: &str = "user_id";

/// User assumed when the context does not name one.
pub const DEFAULT_USER_ID: &str = "default_a2a_user";

/// Caller-supplied context accompanying a task.
pub type TaskContext = HashMap<String, Value>;

fn resolve_user_id(context: &TaskContext) -> String {
    context
        .get(USER_ID_KEY)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_USER_ID)
        .to_string()
}

/// Orchestrates one agent's tasks over a shared session store.
pub struct TaskDispatcher {
    app_name: String,
    store: Arc<dyn SessionStore>,
    runtime: Arc<dyn AgentRuntime>,
}

impl TaskDispatcher {
    pub fn new(
        app_name: impl Into<String>,
        store: Arc<dyn SessionStore>,
        runtime: Arc<dyn AgentRuntime>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            store,
            runtime,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Processes one task request. Always produces a response.
    #[instrument(name = "task", skip_all, fields(app = %self.app_name, user_id, session_id))]
    pub async fn process_task(
        &self,
        message: &str,
        context: &TaskContext,
        session_id: Option<&str>,
    ) -> TaskResponse {
        let user_id = resolve_user_id(context);
        let session_id = match session_id.filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                info!(session_id = %id, "Generated new session_id");
                id
            }
        };
        let span = tracing::Span::current();
        span.record("user_id", user_id.as_str());
        span.record("session_id", session_id.as_str());

        match self.execute(&user_id, &session_id, message).await {
            Ok(extraction) => {
                info!(
                    events = extraction.events_seen,
                    has_audio = extraction.audio_url.is_some(),
                    "Task succeeded"
                );
                TaskResponse::success(extraction)
            }
            Err(e) => {
                error!(error = ?e, "Error running agent");
                TaskResponse::failure(&e)
            }
        }
    }

    async fn execute(&self, user_id: &str, session_id: &str, message: &str) -> Result<Extraction> {
        debug!(phase = "resolving_session");
        self.resolve_session(user_id, session_id).await?;
        let request_content = Content::user_text(message);

        debug!(phase = "submitting");
        let mut events = self
            .runtime
            .run(user_id, session_id, request_content)
            .await?;

        debug!(phase = "iterating_events");
        let mut extractor = EventExtractor::new();
        while let Some(event) = events.next().await {
            extractor.observe(&event?);
        }
        Ok(extractor.finish())
    }

    async fn resolve_session(&self, user_id: &str, session_id: &str) -> Result<()> {
        let existing = self
            .store
            .get(&self.app_name, user_id, session_id)
            .await
            .map_err(store_failure)?;
        if existing.is_none() {
            self.store
                .create(&self.app_name, user_id, session_id, SessionState::new())
                .await
                .map_err(store_failure)?;
            info!(%session_id, "Created new session");
        }
        Ok(())
    }
}

fn store_failure(err: anyhow::Error) -> RuntimeError {
    RuntimeError::Store(format!("{:#}", err))
}
