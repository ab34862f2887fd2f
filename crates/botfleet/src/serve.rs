// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `botfleet serve` command implementation.
//!
//! Opens the SQLite store, seeds the default tenant on an empty database,
//! starts one Telegram listener per active tenant and runs until SIGINT or
//! SIGTERM. Log output is redacted of every bot token and API key known
//! at startup.

use std::sync::{Arc, RwLock};

use botfleet_agent::shutdown;
use botfleet_agent::{Fleet, OperatorNotifier};
use botfleet_config::model::{BotfleetConfig, OperatorConfig};
use botfleet_core::{BotfleetError, StorageAdapter, TenantStore};
use botfleet_openrouter::OpenRouterProvider;
use botfleet_security::{RedactingMakeWriter, RedactingWriter, SecretList};
use botfleet_storage::SqliteStorage;
use botfleet_telegram::{TelegramChannel, TelegramChannelFactory};
use tracing::{info, warn};

pub async fn run_serve(config: BotfleetConfig) -> Result<(), BotfleetError> {
    let secrets: SecretList = Arc::new(RwLock::new(Vec::new()));
    register_config_secrets(&secrets, &config);
    init_tracing(&config.agent.log_level, secrets.clone());

    info!("starting botfleet serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let provider = Arc::new(OpenRouterProvider::new(&config.inference)?);
    let notifier = operator_notifier(&config.operator);
    let fleet = Fleet::new(
        storage.clone(),
        provider,
        Arc::new(TelegramChannelFactory),
        notifier,
        config.pipeline.clone(),
    );

    if let Some(tenant) = fleet.admin.bootstrap(&config.bootstrap).await? {
        info!(tenant_id = %tenant.id, "seeded default tenant");
    }
    for tenant in storage.list_tenants().await? {
        RedactingWriter::<std::io::Stderr>::add_secret(&secrets, tenant.token);
    }

    let running = fleet.start().await?;
    if running == 0 {
        warn!("no tenant is running; add one with `botfleet tenant add`");
    }

    let cancel = shutdown::install_signal_handler();
    cancel.cancelled().await;

    fleet.shutdown().await;
    storage.close().await?;
    info!("botfleet serve shutdown complete");
    Ok(())
}

/// Builds the operator notifier, or a disabled one when not configured.
fn operator_notifier(config: &OperatorConfig) -> OperatorNotifier {
    let (Some(token), Some(chat_id)) = (&config.bot_token, &config.chat_id) else {
        return OperatorNotifier::disabled();
    };
    if !config.is_enabled() {
        return OperatorNotifier::disabled();
    }
    match TelegramChannel::new(token) {
        Ok(channel) => {
            info!("operator notifications enabled");
            OperatorNotifier::new(Arc::new(channel), chat_id.clone())
        }
        Err(e) => {
            warn!(error = %e, "operator bot unusable, notifications disabled");
            OperatorNotifier::disabled()
        }
    }
}

fn register_config_secrets(secrets: &SecretList, config: &BotfleetConfig) {
    let env_key = std::env::var("OPENROUTER_API_KEY").ok();
    let values = [
        config.inference.api_key.as_deref(),
        env_key.as_deref(),
        config.operator.bot_token.as_deref(),
        config.bootstrap.default_token.as_deref(),
    ];
    for value in values.into_iter().flatten() {
        RedactingWriter::<std::io::Stderr>::add_secret(secrets, value);
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str, secrets: SecretList) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("botfleet={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(RedactingMakeWriter::new(secrets))
        .init();
}
