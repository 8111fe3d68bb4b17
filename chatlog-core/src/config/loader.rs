//! Configuration loading
//!
//! Settings come from three layers, each overriding the one before it:
//! `<config_dir>/config.json`, the conventional OpenAI environment variables,
//! and `CHATLOG__SECTION__KEY` variables naming a single setting.

use super::schema::Config;
use super::validate::validate_config;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix for per-setting environment overrides (`CHATLOG__PROVIDER__MODEL=...`)
const ENV_PREFIX: &str = "CHATLOG__";

/// Environment variables read by other OpenAI tooling, applied in order so
/// the conventional `OPENAI_API_KEY` beats the older `OPEN_AI_API_KEY`.
const KEY_ALIASES: [(&str, &str); 3] = [
    ("OPEN_AI_API_KEY", "provider.api_key"),
    ("OPENAI_API_KEY", "provider.api_key"),
    ("OPENAI_API_BASE", "provider.api_base"),
];

/// Configuration loader
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Loader for `~/.chatlog`
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|home| home.join(".chatlog"))
            .unwrap_or_else(|| PathBuf::from(".chatlog"));
        Self { config_dir }
    }

    /// Loader for an explicit config directory
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load and validate configuration using the process environment
    pub fn load(&self) -> Result<Config> {
        self.load_with_env(std::env::vars())
    }

    /// Load and validate configuration using `vars` as the environment
    pub fn load_with_env<I>(&self, vars: I) -> Result<Config>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = self.read_file()?;
        let env: BTreeMap<String, String> = vars.into_iter().collect();

        for (var, setting) in KEY_ALIASES {
            match env.get(var) {
                Some(value) if !value.trim().is_empty() => {
                    apply_setting(&mut config, setting, value)
                        .map_err(|e| Error::Config(format!("{}: {}", var, e)))?;
                }
                _ => {}
            }
        }

        for (var, value) in &env {
            let Some(suffix) = var.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let setting = suffix.to_ascii_lowercase().replace("__", ".");
            apply_setting(&mut config, &setting, value)
                .map_err(|e| Error::Config(format!("{}: {}", var, e)))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Parse `config.json`, or fall back to defaults when there is none.
    ///
    /// Every field has a serde default, so a file only needs the keys it
    /// changes.
    fn read_file(&self) -> Result<Config> {
        let path = self.config_dir.join("config.json");
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Set one dotted `setting` (e.g. `provider.max_tokens`) from its string form
fn apply_setting(
    config: &mut Config,
    setting: &str,
    raw: &str,
) -> std::result::Result<(), String> {
    if let Some(name) = setting.strip_prefix("provider.extra_headers.") {
        // header names arrive lowercased, which HTTP treats the same
        config
            .provider
            .extra_headers
            .insert(name.replace('_', "-"), raw.to_string());
        return Ok(());
    }
    if let Some(target) = setting.strip_prefix("logging.overrides.") {
        config
            .logging
            .overrides
            .insert(target.to_string(), raw.to_string());
        return Ok(());
    }

    match setting {
        "provider.api_key" => config.provider.api_key = raw.to_string(),
        "provider.api_base" => config.provider.api_base = raw.to_string(),
        "provider.model" => config.provider.model = raw.to_string(),
        "provider.max_tokens" => config.provider.max_tokens = parse_optional(raw)?,
        "provider.temperature" => config.provider.temperature = parse_optional(raw)?,
        "history.dir" => config.history.dir = raw.to_string(),
        "context.max_messages" => config.context.max_messages = parse_optional(raw)?,
        "logging.level" => config.logging.level = raw.to_string(),
        "logging.format" => config.logging.format = raw.to_string(),
        "logging.dir" => config.logging.dir = raw.to_string(),
        "logging.console" => config.logging.console = parse(raw)?,
        other => return Err(format!("unknown setting '{}'", other)),
    }
    Ok(())
}

fn parse<T>(raw: &str) -> std::result::Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("invalid value '{}': {}", raw, e))
}

/// Like [`parse`], with an empty value or `null` clearing the setting
fn parse_optional<T>(raw: &str) -> std::result::Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.trim() {
        "" | "null" => Ok(None),
        _ => parse(raw).map(Some),
    }
}
