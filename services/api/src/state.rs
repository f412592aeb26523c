//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the dispatcher for
//! the served agent, and the wiring that builds it from configuration.

use crate::config::Config;
use anyhow::{Context, Result};
use async_openai::config::OpenAIConfig;
use courier_core::{
    TaskDispatcher,
    agent_runtime::LlmAgentRuntime,
    agents::{AgentDefinition, ToolSet},
    llm_client::{LLMClient, OpenAICompatibleClient},
    session::{InMemorySessionStore, SessionStore},
    tools::{
        McpToolExecutor, ToolExecutor,
        reddit::{RedditNewsService, RedditSource},
        speech::SpeechService,
    },
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: AgentDefinition,
    pub dispatcher: Arc<TaskDispatcher>,
    pub request_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(
        agent: AgentDefinition,
        dispatcher: Arc<TaskDispatcher>,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            agent,
            dispatcher,
            request_timeout,
        }
    }

    /// Builds the session store, LLM client, tools and runtime for the configured agent.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let agent = config.agent.definition();
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_api_base);

        let tools = build_tools(agent.tools, config, &openai_config).await?;
        let llm_client: Arc<dyn LLMClient> = Arc::new(OpenAICompatibleClient::new(
            openai_config,
            config.chat_model.clone(),
        ));

        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let runtime = Arc::new(LlmAgentRuntime::new(
            agent.clone(),
            store.clone(),
            llm_client,
            tools,
        ));
        let dispatcher = Arc::new(TaskDispatcher::new(agent.app_name, store, runtime));
        info!(agent = %agent.name, app = %agent.app_name, "Agent runtime initialized");

        Ok(Self::new(agent, dispatcher, config.request_timeout))
    }
}

async fn build_tools(
    tool_set: ToolSet,
    config: &Config,
    openai_config: &OpenAIConfig,
) -> Result<Option<Arc<dyn ToolExecutor>>> {
    let executor = match tool_set {
        ToolSet::None => return Ok(None),
        ToolSet::Speech => {
            std::fs::create_dir_all(&config.audio_output_dir).with_context(|| {
                format!(
                    "Failed to create audio output directory {}",
                    config.audio_output_dir.display()
                )
            })?;
            info!(dir = %config.audio_output_dir.display(), "Audio output directory ready");
            McpToolExecutor::spawn(SpeechService::new(
                openai_config.clone(),
                config.tts_model.clone(),
                config.tts_voice.clone(),
                config.audio_output_dir.clone(),
            ))
            .await?
        }
        ToolSet::RedditNews => {
            let source = match &config.reddit_user_agent {
                Some(user_agent) => RedditSource::live(user_agent.clone()),
                None => RedditSource::Mock,
            };
            info!(?source, "Reddit news source selected");
            McpToolExecutor::spawn(RedditNewsService::new(source)).await?
        }
    };
    Ok(Some(Arc::new(executor)))
}
