// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

//! # Expensa CLI
//!
//! The `expensa` binary runs the expense-list service and talks to it.
//!
//! ## Commands
//!
//! - `expensa serve` - Run the HTTP service (chat endpoint, resource API, SSE)
//! - `expensa chat <message> --user <uuid>` - Send one utterance to a running server
//! - `expensa seed <file.json>` - Import mock lists into the configured storage
//! - `expensa config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use expensa_core::domain::service_config::{LoggingConfig, ServiceConfig};

mod commands;

use commands::{ChatArgs, ConfigCommand, SeedArgs};

/// Expensa - conversational expense lists
#[derive(Parser)]
#[command(name = "expensa")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "EXPENSA_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (overrides config)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// HTTP API host (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "EXPENSA_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    #[command(name = "serve")]
    Serve,

    /// Send a chat message to a running server
    #[command(name = "chat")]
    Chat(ChatArgs),

    /// Import mock data
    #[command(name = "seed")]
    Seed(SeedArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let logging = configured_logging(cli.config.clone());
    let level = cli.log_level.clone().unwrap_or(logging.level);
    init_logging(&level, &logging.format)?;

    match cli.command {
        Some(Commands::Serve) => commands::serve::run(cli.config, cli.host, cli.port).await,
        Some(Commands::Chat(args)) => commands::chat::run(args, cli.config, cli.host, cli.port).await,
        Some(Commands::Seed(args)) => commands::seed::run(args, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Logging section of the config, read before the subscriber exists
fn configured_logging(config_path: Option<PathBuf>) -> LoggingConfig {
    ServiceConfig::load_or_default(config_path)
        .ok()
        .and_then(|c| c.spec.observability)
        .and_then(|o| o.logging)
        .unwrap_or_default()
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format.eq_ignore_ascii_case("json") {
        builder.json().with_current_span(false).init();
    } else {
        builder.with_target(false).compact().init();
    }

    Ok(())
}
