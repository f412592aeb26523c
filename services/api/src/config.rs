use courier_core::agents::AgentKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub agent: AgentKind,
    pub bind_address: SocketAddr,
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub chat_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub audio_output_dir: PathBuf,
    /// When set, the Reddit scout queries Reddit instead of its offline table.
    pub reddit_user_agent: Option<String>,
    pub request_timeout: Option<Duration>,
    pub log_level: Level,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_for(None)
    }

    /// Loads configuration, serving `agent` when given instead of `AGENT_KIND`.
    pub fn from_env_for(agent: Option<AgentKind>) -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let agent = match agent {
            Some(agent) => agent,
            None => {
                let raw = non_empty_var("AGENT_KIND")
                    .ok_or_else(|| ConfigError::MissingVar("AGENT_KIND".to_string()))?;
                raw.parse::<AgentKind>()
                    .map_err(|e| ConfigError::InvalidValue("AGENT_KIND".to_string(), e.to_string()))?
            }
        };

        let bind_address = match non_empty_var("BIND_ADDRESS") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], agent.default_port())),
        };

        let openai_api_key = non_empty_var("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;
        let openai_api_base = non_empty_var("OPENAI_API_BASE")
            .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string());

        let chat_model = non_empty_var("CHAT_MODEL").unwrap_or_else(|| "gpt-4o".to_string());
        let tts_model = non_empty_var("TTS_MODEL").unwrap_or_else(|| "tts-1".to_string());
        let tts_voice = non_empty_var("TTS_VOICE").unwrap_or_else(|| "alloy".to_string());

        let audio_output_dir = non_empty_var("AUDIO_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("audio_output"));

        let reddit_user_agent = non_empty_var("REDDIT_USER_AGENT");

        let request_timeout = match non_empty_var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    ConfigError::InvalidValue(
                        "REQUEST_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a whole number of seconds", raw),
                    )
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            agent,
            bind_address,
            openai_api_key,
            openai_api_base,
            chat_model,
            tts_model,
            tts_voice,
            audio_output_dir,
            reddit_user_agent,
            request_timeout,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            for var in [
                "AGENT_KIND",
                "BIND_ADDRESS",
                "OPENAI_API_KEY",
                "OPENAI_API_BASE",
                "CHAT_MODEL",
                "TTS_MODEL",
                "TTS_VOICE",
                "AUDIO_OUTPUT_DIR",
                "REDDIT_USER_AGENT",
                "REQUEST_TIMEOUT_SECS",
                "RUST_LOG",
            ] {
                env::remove_var(var);
            }
        }
    }

    fn set_minimal_env() {
        unsafe {
            env::set_var("AGENT_KIND", "speaker");
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.agent, AgentKind::Speaker);
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8003");
        assert_eq!(config.openai_api_key, "test-openai-key");
        assert_eq!(config.openai_api_base, DEFAULT_OPENAI_API_BASE);
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.tts_model, "tts-1");
        assert_eq!(config.tts_voice, "alloy");
        assert_eq!(
            config.audio_output_dir,
            std::env::temp_dir().join("audio_output")
        );
        assert_eq!(config.reddit_user_agent, None);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("AGENT_KIND", "reddit_scout");
            env::set_var("BIND_ADDRESS", "127.0.0.1:9000");
            env::set_var("OPENAI_API_KEY", "custom-key");
            env::set_var("OPENAI_API_BASE", "http://localhost:4000/v1");
            env::set_var("CHAT_MODEL", "gpt-4o-mini");
            env::set_var("AUDIO_OUTPUT_DIR", "/custom/audio");
            env::set_var("REDDIT_USER_AGENT", "courier/0.1");
            env::set_var("REQUEST_TIMEOUT_SECS", "30");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.agent, AgentKind::RedditScout);
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:9000");
        assert_eq!(config.openai_api_base, "http://localhost:4000/v1");
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.audio_output_dir, PathBuf::from("/custom/audio"));
        assert_eq!(config.reddit_user_agent.as_deref(), Some("courier/0.1"));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn test_explicit_agent_overrides_env() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let config = Config::from_env_for(Some(AgentKind::Summarizer))
            .expect("Config should load without AGENT_KIND");
        assert_eq!(config.agent, AgentKind::Summarizer);
        assert_eq!(config.bind_address.port(), 8001);
    }

    #[test]
    #[serial]
    fn test_config_missing_agent_kind() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(var) => assert_eq!(var, "AGENT_KIND"),
            _ => panic!("Expected MissingVar for AGENT_KIND"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_agent_kind() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("AGENT_KIND", "translator");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "AGENT_KIND"),
            _ => panic!("Expected InvalidValue for AGENT_KIND"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();
        unsafe {
            env::set_var("AGENT_KIND", "summarizer");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_timeout_and_zero_timeout() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("REQUEST_TIMEOUT_SECS", "soon");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "REQUEST_TIMEOUT_SECS"),
            _ => panic!("Expected InvalidValue for REQUEST_TIMEOUT_SECS"),
        }

        unsafe {
            env::set_var("REQUEST_TIMEOUT_SECS", "0");
        }
        let config = Config::from_env().expect("Config should load successfully");
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }
}
