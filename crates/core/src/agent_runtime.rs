//! LLM Agent Runtime
//!
//! The production [`AgentRuntime`]: a reason-and-act turn over an
//! OpenAI-compatible chat model, with tools reached through a
//! [`ToolExecutor`]. Every step of the turn is surfaced as an
//! [`ExecutionEvent`] so callers can follow along.

use crate::{
    agents::AgentDefinition,
    event::{Content, ExecutionEvent, FunctionCall, FunctionResponse, Part, Role},
    llm_client::{LLMAction, LLMClient, LLMStreamEvent},
    runtime::{AgentRuntime, EventStream, RuntimeError},
    session::SessionStore,
    tools::ToolExecutor,
};
use anyhow::Result;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Runs one agent definition against sessions held in a shared store.
pub struct LlmAgentRuntime {
    agent: AgentDefinition,
    store: Arc<dyn SessionStore>,
    llm_client: Arc<dyn LLMClient>,
    tools: Option<Arc<dyn ToolExecutor>>,
}

impl LlmAgentRuntime {
    pub fn new(
        agent: AgentDefinition,
        store: Arc<dyn SessionStore>,
        llm_client: Arc<dyn LLMClient>,
        tools: Option<Arc<dyn ToolExecutor>>,
    ) -> Self {
        Self {
            agent,
            store,
            llm_client,
            tools,
        }
    }
}

/// Converts the text of a session history into chat-completion messages.
fn history_to_messages(history: &[Content]) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages = Vec::with_capacity(history.len());
    for content in history {
        let Some(text) = content.first_text() else {
            continue;
        };
        let message = match content.role {
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(text.to_string())
                .build()?
                .into(),
            Role::Agent => ChatCompletionRequestAssistantMessageArgs::default()
                .content(text.to_string())
                .build()?
                .into(),
        };
        messages.push(message);
    }
    Ok(messages)
}

/// Tool arguments arrive as a JSON string; keep the raw text if it does not parse.
fn parse_arguments(arguments: &str) -> Value {
    serde_json::from_str(arguments).unwrap_or_else(|_| Value::String(arguments.to_string()))
}

#[async_trait]
impl AgentRuntime for LlmAgentRuntime {
    async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        new_message: Content,
    ) -> Result<EventStream> {
        let session = self
            .store
            .get(self.agent.app_name, user_id, session_id)
            .await?
            .ok_or_else(|| RuntimeError::SessionNotFound(session_id.to_string()))?;

        let author = self.agent.name;
        let instruction = self.agent.instruction.to_string();
        let llm_client = self.llm_client.clone();
        let tools = self.tools.clone();
        let invocation_id = format!("e-{}", Uuid::new_v4());

        let stream: EventStream = Box::pin(async_stream::try_stream! {
            session.append(new_message).await;
            let messages = history_to_messages(&session.history().await)?;

            let declarations = match &tools {
                Some(tools) => tools.list_tools().await?,
                None => Vec::new(),
            };

            let action = llm_client
                .decide_action(instruction.clone(), messages.clone(), declarations)
                .await
                .map_err(|e| RuntimeError::Llm(format!("{:#}", e)))?;

            let full_response = match action {
                LLMAction::TextResponse(text) => text,
                LLMAction::ToolCall(tool_calls) => {
                    let executor = tools.clone().ok_or_else(|| RuntimeError::Tool {
                        name: tool_calls
                            .first()
                            .map(|c| c.function.name.clone())
                            .unwrap_or_default(),
                        message: "agent has no tools".to_string(),
                    })?;

                    let calls: Vec<FunctionCall> = tool_calls
                        .iter()
                        .map(|call| FunctionCall {
                            id: call.id.clone(),
                            name: call.function.name.clone(),
                            args: parse_arguments(&call.function.arguments),
                        })
                        .collect();
                    yield ExecutionEvent::new(&invocation_id, author).with_content(Content {
                        role: Role::Agent,
                        parts: calls.iter().cloned().map(Part::function_call).collect(),
                    });

                    let mut responses = Vec::with_capacity(calls.len());
                    for call in &calls {
                        info!(tool = %call.name, "Executing tool call");
                        let result = executor.call_tool(&call.name, call.args.clone()).await?;
                        responses.push(FunctionResponse {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            response: json!({ "result": result }),
                        });
                    }
                    yield ExecutionEvent::new(&invocation_id, "user").with_content(Content {
                        role: Role::User,
                        parts: responses.iter().cloned().map(Part::function_response).collect(),
                    });

                    let mut history_with_tools = messages;
                    history_with_tools.push(
                        ChatCompletionRequestAssistantMessageArgs::default()
                            .tool_calls(tool_calls.clone())
                            .build()?
                            .into(),
                    );
                    for response in &responses {
                        let text = response.response["result"].as_str().unwrap_or_default();
                        history_with_tools.push(
                            ChatCompletionRequestToolMessageArgs::default()
                                .tool_call_id(response.id.clone())
                                .content(text.to_string())
                                .build()?
                                .into(),
                        );
                    }

                    let mut final_stream = llm_client
                        .stream_after_tools(instruction.clone(), history_with_tools)
                        .await
                        .map_err(|e| RuntimeError::Llm(format!("{:#}", e)))?;

                    let mut full_response = String::new();
                    while let Some(chunk) = final_stream.next().await {
                        let LLMStreamEvent::TextChunk(chunk) =
                            chunk.map_err(|e| RuntimeError::Llm(e.to_string()))?;
                        full_response.push_str(&chunk);
                        yield ExecutionEvent::new(&invocation_id, author)
                            .with_content(Content::agent_text(chunk))
                            .partial();
                    }
                    full_response
                }
            };

            debug!(chars = full_response.len(), "Agent turn complete");
            let final_content = Content::agent_text(full_response);
            session.append(final_content.clone()).await;
            yield ExecutionEvent::new(&invocation_id, author)
                .with_content(final_content)
                .terminal();
        });

        Ok(stream)
    }
}
