// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Botfleet configuration system.

use botfleet_config::diagnostic::ConfigError;
use botfleet_config::model::BotfleetConfig;
use botfleet_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_botfleet_config() {
    let toml = r#"
[agent]
log_level = "debug"

[storage]
database_path = "/tmp/botfleet-test.db"
wal_mode = false

[inference]
api_key = "sk-or-test"
base_url = "http://localhost:9999/v1"
model = "openai/gpt-4o-mini"
referer = "https://example.org"
title = "Botfleet"
timeout_secs = 15
max_retries = 2

[pipeline]
fallback_reply = "sorry"
error_reply = "oops"
reset_reply = "fresh start"
serialize_sessions = false

[operator]
bot_token = "123:ABC"
chat_id = "-1001"

[bootstrap]
default_token = "456:DEF"
default_name = "Main"
contexts_file = "contexts.json"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/botfleet-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.inference.api_key.as_deref(), Some("sk-or-test"));
    assert_eq!(config.inference.base_url, "http://localhost:9999/v1");
    assert_eq!(config.inference.model, "openai/gpt-4o-mini");
    assert_eq!(config.inference.referer.as_deref(), Some("https://example.org"));
    assert_eq!(config.inference.title.as_deref(), Some("Botfleet"));
    assert_eq!(config.inference.timeout_secs, 15);
    assert_eq!(config.inference.max_retries, 2);
    assert_eq!(config.pipeline.fallback_reply, "sorry");
    assert_eq!(config.pipeline.error_reply, "oops");
    assert_eq!(config.pipeline.reset_reply, "fresh start");
    assert!(!config.pipeline.serialize_sessions);
    assert!(config.operator.is_enabled());
    assert_eq!(config.bootstrap.default_token.as_deref(), Some("456:DEF"));
    assert_eq!(config.bootstrap.default_name, "Main");
    assert_eq!(config.bootstrap.contexts_file.as_deref(), Some("contexts.json"));
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.agent.log_level, "info");
    assert!(config.storage.wal_mode);
    assert!(config.inference.api_key.is_none());
    assert_eq!(config.inference.base_url, "https://openrouter.ai/api/v1");
    assert_eq!(config.inference.model, "google/gemini-2.5-flash");
    assert_eq!(config.inference.timeout_secs, 60);
    assert_eq!(config.inference.max_retries, 0);
    assert!(config.pipeline.serialize_sessions);
    assert_eq!(
        config.pipeline.reset_reply,
        "Session reset! Let's start over. How can I help?"
    );
    assert!(!config.operator.is_enabled());
    assert!(config.bootstrap.default_token.is_none());
    assert_eq!(config.bootstrap.default_name, "Default bot");
}

/// Unknown field in [operator] produces an error naming the key.
#[test]
fn unknown_field_in_operator_produces_error() {
    let toml = r#"
[operator]
chatid = "1"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("chatid"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unknown top-level sections are rejected too.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telegram]
bot_token = "abc"
"#;

    assert!(load_config_from_str(toml).is_err());
}

/// Env overrides are layered last; simulated with a tuple provider.
#[test]
fn env_style_override_wins_over_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let toml_content = r#"
[inference]
model = "from-toml"
"#;

    let config: BotfleetConfig = Figment::new()
        .merge(Serialized::defaults(BotfleetConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("inference.model", "from-env"))
        .extract()
        .expect("should merge env override");

    assert_eq!(config.inference.model, "from-env");
}

#[test]
fn diagnostic_suggests_close_key() {
    let toml = r#"
[pipeline]
reset_reploy = "x"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    let has_suggestion = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "reset_reploy"
                && suggestion.as_deref() == Some("reset_reply")
                && valid_keys.contains("serialize_sessions")
        })
    });
    assert!(has_suggestion, "expected suggestion for reset_reploy, got: {errors:?}");
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[inference]
timeout_secs = "soon"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("timeout_secs"),
        "error should mention type mismatch, got: {err_str}"
    );
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::Validation {
        message: "storage.database_path must not be empty".into(),
    };
    let mut buf = String::new();
    let diagnostic: &dyn Diagnostic = &error;
    GraphicalReportHandler::new()
        .render_report(&mut buf, diagnostic)
        .unwrap();
    assert!(buf.contains("storage.database_path"));
}

#[test]
fn load_and_validate_reports_semantic_errors() {
    let toml = r#"
[operator]
chat_id = "-1001"
"#;

    let errors = load_and_validate_str(toml).expect_err("half-configured operator");
    assert!(errors.iter().any(|e| e.to_string().contains("operator")));
}

#[test]
fn load_and_validate_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("botfleet.toml");
    std::fs::write(&path, "[agent]\nlog_level = \"warn\"\n").unwrap();

    let config = load_and_validate_path(&path).expect("file config should load");
    assert_eq!(config.agent.log_level, "warn");
}
