//! Agent Definitions
//!
//! The agents Courier can serve. Each one is an instruction plus a tool set;
//! the runtime and dispatcher are the same for all of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The agents that can be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Summarizer,
    Speaker,
    RedditScout,
}

/// Tools an agent may be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSet {
    None,
    Speech,
    RedditNews,
}

impl AgentKind {
    pub const ALL: [AgentKind; 3] = [
        AgentKind::Summarizer,
        AgentKind::Speaker,
        AgentKind::RedditScout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Summarizer => "summarizer",
            AgentKind::Speaker => "speaker",
            AgentKind::RedditScout => "reddit_scout",
        }
    }

    /// Port an agent server listens on when none is configured.
    pub fn default_port(&self) -> u16 {
        match self {
            AgentKind::Summarizer => 8001,
            AgentKind::RedditScout => 8002,
            AgentKind::Speaker => 8003,
        }
    }

    pub fn definition(&self) -> AgentDefinition {
        match self {
            AgentKind::Summarizer => AgentDefinition {
                kind: *self,
                name: "summarizer_agent",
                app_name: "summarizer_a2a_app",
                description: "Summarizes text into a short, faithful digest.",
                instruction: "You are a summarization assistant. Summarize the text the user \
                    provides in a few concise sentences. Keep names, numbers and conclusions \
                    intact and do not add information that is not in the text.",
                tools: ToolSet::None,
            },
            AgentKind::Speaker => AgentDefinition {
                kind: *self,
                name: "speaker_agent",
                app_name: "speaker_a2a_app",
                description: "Converts text to speech and returns the generated audio file.",
                instruction: "You are a speaker agent. When given text, call the \
                    `text_to_speech` tool with that exact text. After the tool returns, reply \
                    with a short confirmation that includes the returned file path wrapped in \
                    single backticks, for example: Audio saved to `/path/to/file.mp3`.",
                tools: ToolSet::Speech,
            },
            AgentKind::RedditScout => AgentDefinition {
                kind: *self,
                name: "reddit_scout_agent",
                app_name: "reddit_scout_a2a_app",
                description: "Searches a subreddit for its most relevant recent posts.",
                instruction: "You are a news scout for contractors and HVAC professionals. \
                    When the user asks about a subreddit, call the `get_reddit_news` tool with \
                    the subreddit name and present the returned titles as a concise bulleted \
                    list. If the tool reports an error, relay it plainly.",
                tools: ToolSet::RedditNews,
            },
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown agent '{0}'. Expected one of: summarizer, speaker, reddit_scout")]
pub struct UnknownAgentError(pub String);

impl FromStr for AgentKind {
    type Err = UnknownAgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "summarizer" => Ok(AgentKind::Summarizer),
            "speaker" => Ok(AgentKind::Speaker),
            "reddit_scout" | "reddit" => Ok(AgentKind::RedditScout),
            _ => Err(UnknownAgentError(s.to_string())),
        }
    }
}

/// Static description of one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDefinition {
    pub kind: AgentKind,
    pub name: &'static str,
    /// Application name sessions are scoped under.
    pub app_name: &'static str,
    pub description: &'static str,
    pub instruction: &'static str,
    pub tools: ToolSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_kind_round_trips_through_str() {
        for kind in AgentKind::ALL {
            assert_eq!(kind.as_str().parse::<AgentKind>().unwrap(), kind);
        }
        assert_eq!(
            "Reddit-Scout".parse::<AgentKind>().unwrap(),
            AgentKind::RedditScout
        );
    }

    #[test]
    fn test_unknown_agent_is_rejected() {
        let err = "translator".parse::<AgentKind>().unwrap_err();
        assert!(err.to_string().contains("translator"));
    }

    #[test]
    fn test_definitions_are_distinct() {
        let apps: Vec<&str> = AgentKind::ALL
            .iter()
            .map(|k| k.definition().app_name)
            .collect();
        assert_eq!(apps.len(), 3);
        assert!(apps.windows(2).all(|w| w[0] != w[1]));
        assert_eq!(AgentKind::Speaker.definition().tools, ToolSet::Speech);
        assert_eq!(AgentKind::Summarizer.default_port(), 8001);
    }
}
