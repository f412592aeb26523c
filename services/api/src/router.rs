//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for an agent server,
//! including the task endpoint and OpenAPI documentation.

use crate::{
    handlers,
    models::{AgentCard, AgentRequest, AgentResponse, ErrorResponse, SessionList},
    state::AppState,
};

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::agent_card,
        handlers::run_task,
        handlers::list_sessions,
        handlers::delete_session,
    ),
    components(
        schemas(AgentCard, AgentRequest, AgentResponse, SessionList, ErrorResponse)
    ),
    tags(
        (name = "Courier Agent API", description = "Task dispatch for a single LLM-backed agent")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/", get(handlers::agent_card))
        .route("/run", post(handlers::run_task))
        .route("/sessions/{user_id}", get(handlers::list_sessions))
        .route(
            "/sessions/{user_id}/{session_id}",
            delete(handlers::delete_session),
        )
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use courier_core::{
        TaskDispatcher,
        agents::AgentKind,
        event::{Content, ExecutionEvent},
        runtime::{AgentRuntime, EventStream},
        session::InMemorySessionStore,
    };
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    /// Replies with a fixed text, optionally after a delay.
    struct FixedRuntime {
        reply: &'static str,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl AgentRuntime for FixedRuntime {
        async fn run(&self, _: &str, _: &str, _: Content) -> Result<EventStream> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let event = ExecutionEvent::new("inv", "speaker_agent")
                .with_content(Content::agent_text(self.reply))
                .terminal();
            Ok(Box::pin(futures::stream::iter(vec![Ok::<_, anyhow::Error>(event)])))
        }
    }

    fn app(reply: &'static str, delay: Option<Duration>, timeout: Option<Duration>) -> Router {
        let agent = AgentKind::Speaker.definition();
        let dispatcher = TaskDispatcher::new(
            agent.app_name,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(FixedRuntime { reply, delay }),
        );
        create_router(Arc::new(AppState::new(agent, Arc::new(dispatcher), timeout)))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_run(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/run")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_agent_card() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = send(app("hi", None, None), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "speaker_agent");
        assert_eq!(body["kind"], "speaker");
    }

    #[tokio::test]
    async fn test_run_returns_normalized_response() {
        let app = app("Saved to `/tmp/audio_output/out.mp3` done", None, None);
        let (status, body) = send(app, post_run(json!({ "message": "say hi" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["audio_url"], "file:///tmp/audio_output/out.mp3");
        assert_eq!(body["data"]["raw_events"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_rejects_empty_message() {
        let (status, body) = send(app("hi", None, None), post_run(json!({ "message": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "message must not be empty");
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let app = app(
            "late",
            Some(Duration::from_millis(200)),
            Some(Duration::from_millis(10)),
        );
        let (status, _) = send(app, post_run(json!({ "message": "hello" }))).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_sessions_are_listed_per_user() {
        let app = app("hi", None, None);
        let body = json!({
            "message": "hello",
            "context": { "user_id": "alice" },
            "session_id": "s-1"
        });
        let (status, _) = send(app.clone(), post_run(body)).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder()
            .uri("/sessions/alice")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session_ids"], json!(["s-1"]));

        let request = Request::builder()
            .uri("/sessions/bob")
            .body(Body::empty())
            .unwrap();
        let (_, body) = send(app, request).await;
        assert_eq!(body["session_ids"], json!([]));
    }

    #[tokio::test]
    async fn test_delete_session() {
        let app = app("hi", None, None);
        let body = json!({
            "message": "hello",
            "context": { "user_id": "alice" },
            "session_id": "s-1"
        });
        send(app.clone(), post_run(body)).await;

        let delete_request = || {
            Request::builder()
                .method("DELETE")
                .uri("/sessions/alice/s-1")
                .body(Body::empty())
                .unwrap()
        };
        let (status, _) = send(app.clone(), delete_request()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(app.clone(), delete_request()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Session 's-1' not found for user 'alice'");

        let request = Request::builder()
            .uri("/sessions/alice")
            .body(Body::empty())
            .unwrap();
        let (_, body) = send(app, request).await;
        assert_eq!(body["session_ids"], json!([]));
    }

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/run"));
        assert!(doc.paths.paths.contains_key("/sessions/{user_id}"));
        assert!(doc.paths.paths.contains_key("/sessions/{user_id}/{session_id}"));
    }
}
