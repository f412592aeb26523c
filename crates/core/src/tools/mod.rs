//! Agent Tools
//!
//! Tools are exposed to the model as MCP services. Each service runs on its
//! own in-process duplex transport and is reached through an MCP client, the
//! same way a remote tool server would be.

pub mod reddit;
pub mod speech;

use crate::runtime::RuntimeError;
use anyhow::{Context, Result};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolArgs, FunctionObjectArgs};
use async_trait::async_trait;
use rmcp::{
    ServerHandler, ServiceExt,
    model::{CallToolRequestParam, RawContent},
    service::{QuitReason, RoleClient, RunningService},
};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Executes the tools advertised to the model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// The tool declarations in chat-completion form.
    async fn list_tools(&self) -> Result<Vec<ChatCompletionTool>>;

    /// Runs one tool and returns its textual result.
    async fn call_tool(&self, name: &str, args: serde_json::Value) -> Result<String>;
}

/// Serves `service` on `transport` until the client goes away.
async fn serve_tools<S>(service: S, transport: DuplexStream) -> Result<QuitReason>
where
    S: ServerHandler,
{
    let running = service
        .serve(transport)
        .await
        .map_err(|e| RuntimeError::ToolService(format!("failed to start: {}", e)))?;
    let reason = running
        .waiting()
        .await
        .map_err(|e| RuntimeError::ToolService(format!("server task ended abnormally: {}", e)))?;
    Ok(reason)
}

/// A `ToolExecutor` backed by an MCP client connected to an in-process server.
pub struct McpToolExecutor {
    client: RunningService<RoleClient, ()>,
    server_handle: JoinHandle<()>,
}

impl McpToolExecutor {
    /// Starts `service` on a duplex transport and connects a client to it.
    pub async fn spawn<S>(service: S) -> Result<Self>
    where
        S: ServerHandler,
    {
        let (server_transport, client_transport) = tokio::io::duplex(4096);

        let server_handle = tokio::spawn(async move {
            match serve_tools(service, server_transport).await {
                Ok(reason) => debug!(?reason, "Tool service stopped"),
                Err(e) => warn!(error = %e, "Tool service failed"),
            }
        });
        let client = ().serve(client_transport).await.map_err(|e| {
            server_handle.abort();
            RuntimeError::ToolService(e.to_string())
        })?;

        Ok(Self {
            client,
            server_handle,
        })
    }
}

impl Drop for McpToolExecutor {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

#[async_trait]
impl ToolExecutor for McpToolExecutor {
    async fn list_tools(&self) -> Result<Vec<ChatCompletionTool>> {
        self.client
            .list_all_tools()
            .await
            .map_err(|e| RuntimeError::ToolService(e.to_string()))?
            .into_iter()
            .map(|t| {
                Ok(ChatCompletionToolArgs::default()
                    .function(
                        FunctionObjectArgs::default()
                            .name(t.name)
                            .description(t.description.unwrap_or_default())
                            .parameters(serde_json::to_value(&*t.input_schema)?)
                            .build()?,
                    )
                    .build()?)
            })
            .collect()
    }

    async fn call_tool(&self, name: &str, args: serde_json::Value) -> Result<String> {
        debug!(tool = %name, "Calling tool");
        let result = self
            .client
            .peer()
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments: args.as_object().cloned(),
            })
            .await
            .map_err(|e| RuntimeError::Tool {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        let annotated_content = result
            .content
            .context("Tool call returned no content")?
            .pop()
            .context("Content list was empty")?;
        let result_text = match annotated_content.raw {
            RawContent::Text(text_content) => text_content.text,
            _ => "{\"error\": \"Unexpected content type from tool\"}".to_string(),
        };
        Ok(result_text)
    }
}
