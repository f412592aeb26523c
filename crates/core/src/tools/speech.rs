//! Text-to-speech tool for the speaker agent.

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice},
};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use uuid::Uuid;

/// Maps a configured voice name onto the API's voice set; unknown names fall
/// back to `alloy`.
pub fn parse_voice(name: &str) -> Voice {
    match name.to_lowercase().as_str() {
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "shimmer" => Voice::Shimmer,
        _ => Voice::Alloy,
    }
}

/// Maps a configured model name onto the supported speech models.
pub fn parse_speech_model(name: &str) -> SpeechModel {
    match name {
        "tts-1-hd" => SpeechModel::Tts1Hd,
        _ => SpeechModel::Tts1,
    }
}

/// A fresh, collision-free `.mp3` path inside `output_dir`.
pub fn audio_file_path(output_dir: &Path) -> PathBuf {
    output_dir.join(format!("speech_{}.mp3", Uuid::new_v4().simple()))
}

/// Arguments for the `text_to_speech` tool.
#[derive(Deserialize, JsonSchema, Debug)]
pub struct TextToSpeechArgs {
    #[schemars(description = "The text to convert to speech")]
    pub text: String,
}

/// MCP service that synthesizes speech and stores it as an audio file.
pub struct SpeechService {
    client: Client<OpenAIConfig>,
    model: String,
    voice: String,
    output_dir: PathBuf,
    tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for SpeechService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tool_router]
impl SpeechService {
    pub fn new(config: OpenAIConfig, model: String, voice: String, output_dir: PathBuf) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            voice,
            output_dir,
            tool_router: Self::tool_router(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Synthesizes `text` and returns the absolute path of the written file.
    #[tool(
        description = "Convert text to speech. Saves an mp3 file and returns its absolute path."
    )]
    pub async fn text_to_speech(
        &self,
        args: Parameters<TextToSpeechArgs>,
    ) -> Result<String, String> {
        let text = args.0.text.trim();
        if text.is_empty() {
            return Err("Text to speak must not be empty.".to_string());
        }

        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(parse_speech_model(&self.model))
            .voice(parse_voice(&self.voice))
            .response_format(SpeechResponseFormat::Mp3)
            .build()
            .map_err(|e| format!("Invalid speech request: {}", e))?;

        let response = self.client.audio().speech(request).await.map_err(|e| {
            error!(error = %e, "Speech synthesis failed");
            format!("Speech synthesis failed: {}", e)
        })?;

        let path = audio_file_path(&self.output_dir);
        response
            .save(&path)
            .await
            .map_err(|e| format!("Failed to save audio file: {}", e))?;

        let absolute = std::path::absolute(&path).unwrap_or(path);
        info!(path = %absolute.display(), "Saved synthesized speech");
        Ok(absolute.display().to_string())
    }
}
