//! Result extraction from an event stream.

use crate::event::ExecutionEvent;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{info, warn};

/// Message reported when no terminal agent text was observed.
pub const NO_RESPONSE_MESSAGE: &str = "(No response generated)";

/// Number of trailing event snapshots kept for diagnostics.
pub const RAW_EVENT_WINDOW: usize = 3;

const ARTIFACT_DELIMITER: char = '`';
const AUDIO_EXTENSION: &str = ".mp3";

/// Pulls an audio file reference out of agent text.
///
/// The text must contain at least two backticks; the first delimited segment
/// is used when it is an absolute path mentioning an `.mp3` file.
pub fn extract_audio_url(text: &str) -> Option<String> {
    let segments: Vec<&str> = text.split(ARTIFACT_DELIMITER).collect();
    if segments.len() < 3 {
        return None;
    }
    let path = segments[1];
    if path.starts_with('/') && path.contains(AUDIO_EXTENSION) {
        Some(format!("file://{}", path))
    } else {
        None
    }
}

/// What was extracted once the stream has been drained.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub message: String,
    pub audio_url: Option<String>,
    pub raw_events: Vec<Value>,
    pub events_seen: usize,
}

/// Folds execution events into an [`Extraction`], one event at a time.
#[derive(Debug)]
pub struct EventExtractor {
    final_message: String,
    audio_url: Option<String>,
    recent: VecDeque<Value>,
    events_seen: usize,
    final_responses: usize,
}

impl Default for EventExtractor {
    fn default() -> Self {
        Self {
            final_message: NO_RESPONSE_MESSAGE.to_string(),
            audio_url: None,
            recent: VecDeque::with_capacity(RAW_EVENT_WINDOW),
            events_seen: 0,
            final_responses: 0,
        }
    }
}

impl EventExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &ExecutionEvent) {
        self.events_seen += 1;
        if self.recent.len() == RAW_EVENT_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(event.snapshot());

        let Some(text) = event.final_agent_text() else {
            return;
        };
        self.final_responses += 1;
        if self.final_responses > 1 {
            warn!(
                count = self.final_responses,
                "Multiple final responses in one submission; keeping the latest"
            );
        }
        self.final_message = text.to_string();
        info!(final_response = %self.final_message, "Final response");

        if let Some(url) = extract_audio_url(&self.final_message) {
            info!(audio_url = %url, "Extracted audio path");
            self.audio_url = Some(url);
        }
    }

    pub fn finish(self) -> Extraction {
        Extraction {
            message: self.final_message,
            audio_url: self.audio_url,
            raw_events: self.recent.into(),
            events_seen: self.events_seen,
        }
    }
}
