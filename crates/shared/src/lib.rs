pub mod convo;
pub mod tool;

pub mod settings {
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;

    fn default_true() -> bool {
        true
    }

    /// Errors detected while validating startup configuration.
    ///
    /// These are the only errors in the system that are fatal: a session is
    /// never constructed from invalid settings.
    #[derive(Debug, thiserror::Error)]
    pub enum ConfigError {
        #[error("no Anthropic API key configured (set ANTHROPIC_API_KEY or settings.api_key)")]
        MissingCredential,

        #[error("max_history_messages must be at least 1")]
        InvalidHistoryCapacity,

        #[error("request_timeout_secs must be at least 1")]
        InvalidTimeout,
    }

    /// Application settings, read once at startup and treated as immutable.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppSettings {
        /// Anthropic API key. Falls back to the ANTHROPIC_API_KEY env var.
        pub api_key: Option<String>,
        /// Model identifier sent with every request.
        pub model: String,
        /// Bounded history capacity (FIFO eviction past this).
        pub max_history_messages: usize,
        /// Where the rolling history is persisted. None picks the platform
        /// data directory.
        pub history_file: Option<PathBuf>,
        /// Timeout applied to web-executor fetches.
        pub request_timeout_secs: u64,
        /// Hard cap on page-text attachment length, in characters.
        pub attachment_text_cap: usize,
        /// Delay between automation actions, in milliseconds.
        pub automation_pause_ms: u64,
        /// Whether the automation emergency stop starts armed.
        #[serde(default = "default_true")]
        pub automation_failsafe: bool,
        /// User agent for web fetches.
        pub user_agent: String,
        /// Bound on the in-memory action log.
        pub action_log_cap: usize,
        /// max_tokens for model responses.
        pub max_tokens: u32,
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                api_key: None,
                model: "claude-3-5-sonnet-20241022".into(),
                max_history_messages: 20,
                history_file: None,
                request_timeout_secs: 10,
                attachment_text_cap: 5000,
                automation_pause_ms: 300,
                automation_failsafe: true,
                user_agent: "Mozilla/5.0 (compatible; Deskhand/0.1)".into(),
                action_log_cap: 500,
                max_tokens: 1024,
            }
        }
    }

    impl AppSettings {
        /// Build settings from defaults plus environment overrides.
        pub fn from_env() -> Self {
            let mut settings = Self::default();

            if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
                if !key.trim().is_empty() {
                    settings.api_key = Some(key);
                }
            }
            if let Ok(model) = std::env::var("CLAUDE_MODEL") {
                if !model.trim().is_empty() {
                    settings.model = model;
                }
            }
            if let Ok(n) = std::env::var("MAX_HISTORY_MESSAGES") {
                if let Ok(n) = n.parse::<usize>() {
                    settings.max_history_messages = n;
                }
            }
            if let Ok(t) = std::env::var("REQUEST_TIMEOUT") {
                if let Ok(t) = t.parse::<u64>() {
                    settings.request_timeout_secs = t;
                }
            }

            settings
        }

        /// Validate settings before a session is constructed.
        pub fn validate(&self) -> Result<(), ConfigError> {
            if self.api_key.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err(ConfigError::MissingCredential);
            }
            if self.max_history_messages < 1 {
                return Err(ConfigError::InvalidHistoryCapacity);
            }
            if self.request_timeout_secs < 1 {
                return Err(ConfigError::InvalidTimeout);
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn missing_key_is_fatal() {
            let settings = AppSettings::default();
            assert!(matches!(
                settings.validate(),
                Err(ConfigError::MissingCredential)
            ));
        }

        #[test]
        fn valid_settings_pass() {
            let settings = AppSettings {
                api_key: Some("sk-test".into()),
                ..AppSettings::default()
            };
            assert!(settings.validate().is_ok());
        }
    }
}
