//! Axum Handlers for the Agent API
//!
//! This module relays HTTP requests into the task dispatcher. It uses `utoipa`
//! doc comments to generate OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    models::{AgentCard, AgentRequest, AgentResponse, ErrorResponse, SessionList},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    GatewayTimeout(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::GatewayTimeout(message) => {
                (StatusCode::GATEWAY_TIMEOUT, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Describe the agent served by this process.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Agent description", body = AgentCard)
    )
)]
pub async fn agent_card(State(state): State<Arc<AppState>>) -> Json<AgentCard> {
    Json(AgentCard {
        name: state.agent.name.to_string(),
        description: state.agent.description.to_string(),
        kind: state.agent.kind.to_string(),
    })
}

/// Run a task against the agent.
///
/// Failures inside the agent are reported through `status` in a 200 response.
#[utoipa::path(
    post,
    path = "/run",
    request_body = AgentRequest,
    responses(
        (status = 200, description = "Task processed", body = AgentResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 504, description = "Task did not finish in time", body = ErrorResponse)
    )
)]
pub async fn run_task(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let task = state.dispatcher.process_task(
        &payload.message,
        &payload.context,
        payload.session_id.as_deref(),
    );
    let response = match state.request_timeout {
        Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
            warn!(timeout = ?limit, "Task timed out");
            ApiError::GatewayTimeout(format!(
                "The agent did not respond within {} seconds",
                limit.as_secs()
            ))
        })?,
        None => task.await,
    };

    Ok(Json(response.into()))
}

/// List the session identifiers a user holds with this agent.
#[utoipa::path(
    get,
    path = "/sessions/{user_id}",
    responses(
        (status = 200, description = "Sessions of the user", body = SessionList),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("user_id" = String, Path, description = "The ID of the user")
    )
)]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionList>, ApiError> {
    let sessions = state
        .dispatcher
        .store()
        .list(state.dispatcher.app_name(), &user_id)
        .await?;
    let session_ids = sessions.iter().map(|s| s.id().to_string()).collect();
    Ok(Json(SessionList {
        user_id,
        session_ids,
    }))
}

/// Remove one of a user's sessions together with its history.
#[utoipa::path(
    delete,
    path = "/sessions/{user_id}/{session_id}",
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "No such session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("user_id" = String, Path, description = "The ID of the user"),
        ("session_id" = String, Path, description = "The ID of the session")
    )
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path((user_id, session_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .dispatcher
        .store()
        .delete(state.dispatcher.app_name(), &user_id, &session_id)
        .await?;
    if !removed {
        return Err(ApiError::NotFound(format!(
            "Session '{}' not found for user '{}'",
            session_id, user_id
        )));
    }
    info!(%user_id, %session_id, "Deleted session");
    Ok(StatusCode::NO_CONTENT)
}
