//! Configuration validation rules.

use super::schema::Config;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate configuration and return aggregated validation errors.
///
/// A missing API key is deliberately not checked here: it only surfaces
/// once a request is actually sent.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.provider.model.trim().is_empty() {
        errors.push("provider.model must not be empty".to_string());
    }
    if config.provider.api_base.trim().is_empty() {
        errors.push("provider.api_base must not be empty".to_string());
    }
    if config.provider.max_tokens == Some(0) {
        errors.push("provider.max_tokens must be > 0".to_string());
    }
    if let Some(temperature) = config.provider.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            errors.push("provider.temperature must be in [0.0, 2.0]".to_string());
        }
    }

    if config.history.dir.trim().is_empty() {
        errors.push("history.dir must not be empty".to_string());
    }
    if config.context.max_messages == Some(0) {
        errors.push("context.max_messages must be > 0".to_string());
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        errors.push(format!(
            "logging.level must be one of {}",
            LOG_LEVELS.join(", ")
        ));
    }
    if !matches!(config.logging.format.to_ascii_lowercase().as_str(), "text" | "json") {
        errors.push("logging.format must be text or json".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_defaults() {
        validate_config(&Config::default()).unwrap();
    }

    #[test]
    fn test_validate_does_not_require_api_key() {
        let config = Config::default();
        assert!(config.provider.api_key.is_empty());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_aggregates_errors() {
        let mut config = Config::default();
        config.provider.model = " ".to_string();
        config.history.dir = String::new();
        config.context.max_messages = Some(0);

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("provider.model"));
        assert!(err.contains("history.dir"));
        assert!(err.contains("context.max_messages"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }
}
