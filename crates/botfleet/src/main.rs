// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Botfleet - a multi-tenant chat-bot backend.
//!
//! This is the binary entry point: `serve` runs every active tenant, the
//! other subcommands manage tenants and contexts offline or run a single
//! conversation turn.

mod chat;
mod serve;
mod tenant;

use std::path::PathBuf;

use botfleet_config::model::BotfleetConfig;
use clap::{Parser, Subcommand};

/// Botfleet - a multi-tenant chat-bot backend.
#[derive(Parser, Debug)]
#[command(name = "botfleet", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start every active tenant and serve until SIGINT or SIGTERM.
    Serve,
    /// Manage tenants.
    Tenant {
        #[command(subcommand)]
        action: TenantCommands,
    },
    /// Import a contexts JSON document into a tenant.
    ImportContexts {
        /// Tenant id.
        #[arg(long)]
        tenant: i64,
        /// Path to the `{baseBrainContext, contexts}` document.
        file: PathBuf,
    },
    /// Run one conversation turn without Telegram and print it as JSON.
    Chat {
        /// User id the conversation belongs to.
        #[arg(long)]
        user: String,
        /// Tenant id. Defaults to the first active tenant.
        #[arg(long)]
        tenant: Option<i64>,
        message: String,
    },
}

#[derive(Subcommand, Debug)]
enum TenantCommands {
    /// List tenants with masked tokens.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Add a tenant.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        token: String,
        #[arg(long, default_value = "")]
        base_prompt: String,
        /// Store the tenant without activating it.
        #[arg(long)]
        inactive: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> BotfleetConfig {
    let loaded = match path {
        Some(path) => botfleet_config::load_and_validate_path(path),
        None => botfleet_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            botfleet_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Tenant {
            action: TenantCommands::List { json },
        }) => tenant::run_list(&config, json).await,
        Some(Commands::Tenant {
            action:
                TenantCommands::Add {
                    name,
                    token,
                    base_prompt,
                    inactive,
                },
        }) => tenant::run_add(&config, name, token, base_prompt, !inactive).await,
        Some(Commands::ImportContexts { tenant, file }) => {
            tenant::run_import(&config, tenant, &file).await
        }
        Some(Commands::Chat {
            user,
            tenant,
            message,
        }) => chat::run_chat(&config, &user, tenant, &message).await,
        None => {
            println!("botfleet: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config = botfleet_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.agent.log_level, "info");
    }

    #[test]
    fn parses_tenant_add() {
        let cli = Cli::parse_from([
            "botfleet", "tenant", "add", "--name", "alpha", "--token", "1:a", "--inactive",
        ]);
        match cli.command {
            Some(Commands::Tenant {
                action:
                    TenantCommands::Add {
                        name,
                        token,
                        base_prompt,
                        inactive,
                    },
            }) => {
                assert_eq!(name, "alpha");
                assert_eq!(token, "1:a");
                assert_eq!(base_prompt, "");
                assert!(inactive);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_import_contexts() {
        let cli = Cli::parse_from([
            "botfleet",
            "--config",
            "/tmp/botfleet.toml",
            "import-contexts",
            "--tenant",
            "3",
            "contexts.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/botfleet.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::ImportContexts { tenant: 3, .. })
        ));
    }

    #[test]
    fn parses_chat_with_default_tenant() {
        let cli = Cli::parse_from(["botfleet", "chat", "--user", "p-1", "hello there"]);
        match cli.command {
            Some(Commands::Chat {
                user,
                tenant,
                message,
            }) => {
                assert_eq!(user, "p-1");
                assert_eq!(tenant, None);
                assert_eq!(message, "hello there");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
