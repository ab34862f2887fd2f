// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./botfleet.toml` > `~/.config/botfleet/botfleet.toml` >
//! `/etc/botfleet/botfleet.toml` with environment variable overrides via `BOTFLEET_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::BotfleetConfig;

/// Top-level sections that environment variables can address.
const SECTIONS: &[&str] = &[
    "agent",
    "storage",
    "inference",
    "pipeline",
    "operator",
    "bootstrap",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/botfleet/botfleet.toml` (system-wide)
/// 3. `~/.config/botfleet/botfleet.toml` (user XDG config)
/// 4. `./botfleet.toml` (local directory)
/// 5. `BOTFLEET_*` environment variables
pub fn load_config() -> Result<BotfleetConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<BotfleetConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BotfleetConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BotfleetConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BotfleetConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BotfleetConfig::default()))
        .merge(Toml::file("/etc/botfleet/botfleet.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("botfleet/botfleet.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("botfleet.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `BOTFLEET_OPERATOR_BOT_TOKEN` must map to `operator.bot_token`.
fn env_provider() -> Env {
    Env::prefixed("BOTFLEET_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
///
/// Only the leading section name is split off; unknown sections pass through
/// unchanged so `deny_unknown_fields` reports them.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
