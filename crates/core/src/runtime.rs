//! Agent Runtime Adapter
//!
//! The boundary between the dispatcher and whatever engine actually runs an
//! agent. A runtime turns one input message into a lazy, single-pass stream of
//! [`ExecutionEvent`]s that ends when the submission is complete.

use crate::event::{Content, ExecutionEvent};
use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// The ordered events of one submission.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ExecutionEvent>> + Send>>;

/// Typed failures raised by runtimes. Each variant maps to a stable category
/// name reported to callers as `error_type`.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Session '{0}' does not exist")]
    SessionNotFound(String),
    #[error("LLM request failed: {0}")]
    Llm(String),
    #[error("Tool '{name}' failed: {message}")]
    Tool { name: String, message: String },
    #[error("Tool service error: {0}")]
    ToolService(String),
    #[error("Session store failure: {0}")]
    Store(String),
}

impl RuntimeError {
    /// Category name used in error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::SessionNotFound(_) => "SessionNotFoundError",
            RuntimeError::Llm(_) => "LlmError",
            RuntimeError::Tool { .. } => "ToolError",
            RuntimeError::ToolService(_) => "ToolServiceError",
            RuntimeError::Store(_) => "StoreError",
        }
    }
}

/// An engine capable of running an agent against a stored session.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Submits `new_message` to the session identified by `user_id` and
    /// `session_id`. The returned stream does no work until polled.
    async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        new_message: Content,
    ) -> Result<EventStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_display_and_kind() {
        let err = RuntimeError::Tool {
            name: "get_reddit_news".into(),
            message: "timeout".into(),
        };
        assert_eq!(err.to_string(), "Tool 'get_reddit_news' failed: timeout");
        assert_eq!(err.kind(), "ToolError");
        assert_eq!(
            RuntimeError::SessionNotFound("s1".into()).kind(),
            "SessionNotFoundError"
        );
        let store = RuntimeError::Store("disk full".into());
        assert_eq!(store.to_string(), "Session store failure: disk full");
        assert_eq!(store.kind(), "StoreError");
    }
}
