//! API Models
//!
//! Request and response bodies of the agent server, annotated for OpenAPI
//! generation with `utoipa`.

use courier_core::{TaskContext, TaskResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A task for the agent.
#[derive(Deserialize, Serialize, ToSchema, Debug, Clone)]
pub struct AgentRequest {
    #[schema(example = "Summarize the attached meeting notes.")]
    pub message: String,
    /// Free-form context; `user_id` selects the session owner.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub context: TaskContext,
    /// Resumes an existing session when given.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// The normalized outcome of a task.
///
/// `data` holds `audio_url` and `raw_events` on success and `error_type` on error.
#[derive(Deserialize, Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct AgentResponse {
    pub message: String,
    #[schema(example = "success")]
    pub status: String,
    #[schema(value_type = Object)]
    pub data: Value,
}

impl From<TaskResponse> for AgentResponse {
    fn from(response: TaskResponse) -> Self {
        let status = serde_json::to_value(response.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            message: response.message,
            status,
            data: serde_json::to_value(response.data).unwrap_or(Value::Null),
        }
    }
}

/// Describes the agent served by this process.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct AgentCard {
    #[schema(example = "speaker_agent")]
    pub name: String,
    pub description: String,
    #[schema(example = "speaker")]
    pub kind: String,
}

/// The sessions a user holds with this agent.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct SessionList {
    pub user_id: String,
    pub session_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{
        extract::Extraction,
        runtime::RuntimeError,
    };
    use serde_json::json;

    #[test]
    fn test_agent_request_defaults() {
        let request: AgentRequest = serde_json::from_str(r#"{"message": "hello"}"#).unwrap();
        assert_eq!(request.message, "hello");
        assert!(request.context.is_empty());
        assert_eq!(request.session_id, None);
    }

    #[test]
    fn test_agent_request_with_context_and_session() {
        let request: AgentRequest = serde_json::from_value(json!({
            "message": "hello",
            "context": { "user_id": "alice", "locale": "en" },
            "session_id": "abc"
        }))
        .unwrap();
        assert_eq!(request.context["user_id"], "alice");
        assert_eq!(request.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_agent_response_from_success() {
        let response: AgentResponse = TaskResponse::success(Extraction {
            message: "Saved".into(),
            audio_url: Some("file:///tmp/a.mp3".into()),
            raw_events: vec![],
            events_seen: 0,
        })
        .into();
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "message": "Saved",
                "status": "success",
                "data": { "audio_url": "file:///tmp/a.mp3", "raw_events": [] }
            })
        );
    }

    #[test]
    fn test_agent_response_from_failure() {
        let err = anyhow::Error::new(RuntimeError::ToolService("closed".into()));
        let response: AgentResponse = TaskResponse::failure(&err).into();
        assert_eq!(response.status, "error");
        assert_eq!(response.data, json!({ "error_type": "ToolServiceError" }));
    }
}
