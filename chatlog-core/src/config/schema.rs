//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for chatlog
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Completion provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// History storage configuration
    #[serde(default)]
    pub history: HistoryConfig,
    /// Conversation context configuration
    #[serde(default)]
    pub context: ContextConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; an empty key only fails once a request is sent
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,
    /// Optional completion token limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Optional sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Extra HTTP headers added to every request
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            model: default_model(),
            max_tokens: None,
            temperature: None,
            extra_headers: HashMap::new(),
        }
    }
}

/// History storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Directory holding one `YYYY-MM-DD.json` file per day
    #[serde(default = "default_history_dir")]
    pub dir: String,
}

fn default_history_dir() -> String {
    "history".to_string()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: default_history_dir(),
        }
    }
}

/// Conversation context configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContextConfig {
    /// Cap on the number of prior messages sent with a request.
    /// `None` sends the whole session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_messages: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files; a leading `~` is expanded by the binary
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Mirror log records to stderr
    #[serde(default)]
    pub console: bool,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "~/.chatlog/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            console: false,
            overrides: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"provider":{"model":"gpt-4o"}}"#).unwrap();
        assert_eq!(config.provider.model, "gpt-4o");
        assert_eq!(config.provider.api_base, "https://api.openai.com/v1");
        assert_eq!(config.history.dir, "history");
        assert!(config.context.max_messages.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.dir, "~/.chatlog/logs");
    }

    #[test]
    fn test_unset_options_are_not_serialized() {
        let value = serde_json::to_value(Config::default()).unwrap();
        assert!(value["provider"].get("max_tokens").is_none());
        assert!(value["provider"].get("temperature").is_none());
        assert!(value["context"].get("max_messages").is_none());
    }
}
