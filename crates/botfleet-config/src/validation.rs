// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::BotfleetConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &BotfleetConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.agent.log_level.to_ascii_lowercase().as_str()) {
        fail(format!(
            "agent.log_level `{}` must be one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.inference.model.trim().is_empty() {
        fail("inference.model must not be empty".to_string());
    }

    let base_url = config.inference.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        fail(format!(
            "inference.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if config.inference.timeout_secs == 0 {
        fail("inference.timeout_secs must be greater than zero".to_string());
    }

    for (key, value) in [
        ("pipeline.fallback_reply", &config.pipeline.fallback_reply),
        ("pipeline.error_reply", &config.pipeline.error_reply),
        ("pipeline.reset_reply", &config.pipeline.reset_reply),
    ] {
        if value.trim().is_empty() {
            fail(format!("{key} must not be empty"));
        }
    }

    let has_token = config.operator.bot_token.is_some();
    let has_chat = config.operator.chat_id.is_some();
    if has_token != has_chat {
        fail("operator.bot_token and operator.chat_id must be set together".to_string());
    }

    if let Some(token) = &config.bootstrap.default_token
        && token.trim().is_empty()
    {
        fail("bootstrap.default_token must not be empty when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&BotfleetConfig::default()).is_ok());
    }

    #[test]
    fn half_configured_operator_fails() {
        let mut config = BotfleetConfig::default();
        config.operator.bot_token = Some("123:abc".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("operator.bot_token"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = BotfleetConfig::default();
        config.agent.log_level = "loud".into();
        config.storage.database_path = " ".into();
        config.inference.timeout_secs = 0;
        config.pipeline.error_reply = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = BotfleetConfig::default();
        config.inference.base_url = "openrouter.ai".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("inference.base_url"));
    }
}
