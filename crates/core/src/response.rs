//! Response Normalizer
//!
//! The fixed response contract every dispatch produces, whether it succeeded
//! or not.

use crate::{extract::Extraction, runtime::RuntimeError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Error,
}

/// The `data` member of a [`TaskResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Error {
        error_type: String,
    },
    Success {
        audio_url: Option<String>,
        raw_events: Vec<Value>,
    },
}

/// The normalized result of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub message: String,
    pub status: TaskStatus,
    pub data: ResponseData,
}

impl TaskResponse {
    pub fn success(extraction: Extraction) -> Self {
        Self {
            message: extraction.message,
            status: TaskStatus::Success,
            data: ResponseData::Success {
                audio_url: extraction.audio_url,
                raw_events: extraction.raw_events,
            },
        }
    }

    pub fn failure(err: &anyhow::Error) -> Self {
        Self {
            message: format!("Error processing your request: {}", err),
            status: TaskStatus::Error,
            data: ResponseData::Error {
                error_type: error_category(err),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }

    pub fn audio_url(&self) -> Option<&str> {
        match &self.data {
            ResponseData::Success { audio_url, .. } => audio_url.as_deref(),
            ResponseData::Error { .. } => None,
        }
    }
}

/// Names the category of an error by the first recognised cause in its chain.
pub fn error_category(err: &anyhow::Error) -> String {
    for cause in err.chain() {
        if let Some(runtime_err) = cause.downcast_ref::<RuntimeError>() {
            return runtime_err.kind().to_string();
        }
        if cause
            .downcast_ref::<async_openai::error::OpenAIError>()
            .is_some()
        {
            return "OpenAIError".to_string();
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return "IoError".to_string();
        }
        if cause.downcast_ref::<serde_json::Error>().is_some() {
            return "SerializationError".to_string();
        }
    }
    "Error".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let response = TaskResponse::success(Extraction {
            message: "done".into(),
            audio_url: None,
            raw_events: vec![json!({"id": 1})],
            events_seen: 1,
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "message": "done",
                "status": "success",
                "data": { "audio_url": null, "raw_events": [{"id": 1}] }
            })
        );
    }

    #[test]
    fn test_failure_shape() {
        let err = anyhow::Error::new(RuntimeError::Llm("boom".into()));
        let response = TaskResponse::failure(&err);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "message": "Error processing your request: LLM request failed: boom",
                "status": "error",
                "data": { "error_type": "LlmError" }
            })
        );
        assert_eq!(response.audio_url(), None);
        assert!(!response.is_success());
    }

    #[test]
    fn test_responses_deserialize_into_matching_variant() {
        let success: TaskResponse = serde_json::from_value(json!({
            "message": "ok",
            "status": "success",
            "data": { "audio_url": "file:///tmp/a.mp3", "raw_events": [] }
        }))
        .unwrap();
        assert_eq!(success.audio_url(), Some("file:///tmp/a.mp3"));

        let failure: TaskResponse = serde_json::from_value(json!({
            "message": "bad",
            "status": "error",
            "data": { "error_type": "IoError" }
        }))
        .unwrap();
        assert!(matches!(failure.data, ResponseData::Error { .. }));
    }

    #[test]
    fn test_error_category_walks_the_chain() {
        let io = std::io::Error::other("disk gone");
        let err = anyhow::Error::new(io).context("while saving");
        assert_eq!(error_category(&err), "IoError");

        let wrapped: anyhow::Result<()> = Err(RuntimeError::SessionNotFound("s".into()))
            .context("resolving session");
        assert_eq!(
            error_category(&wrapped.unwrap_err()),
            "SessionNotFoundError"
        );

        assert_eq!(error_category(&anyhow::anyhow!("plain")), "Error");
    }
}
