// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use expensa_core::domain::service_config::{NluProviderType, ServiceConfig, StorageBackendType};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./expensa-config.yaml)
        #[arg(short, long, default_value = "./expensa-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = ServiceConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. EXPENSA_CONFIG_PATH: {}",
            std::env::var("EXPENSA_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./expensa-config.yaml");
        println!("  4. ~/.expensa/config.yaml");
        println!("  5. /etc/expensa/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Service:".bold());
    println!("  Name: {}", config.metadata.name);
    println!("  Listen: {}", config.socket_addr());
    println!();

    let nlu = &config.spec.nlu;
    println!("{}", "NLU:".bold());
    match nlu.provider_type {
        NluProviderType::Dialogflow => {
            println!("  Provider: dialogflow");
            println!("  Endpoint: {}", nlu.endpoint);
            println!(
                "  Project: {}",
                nlu.project_id.as_deref().unwrap_or("(none)")
            );
            println!("  Language: {}", nlu.language_code);
            // Never echo the token itself
            println!(
                "  Access token: {}",
                if nlu.access_token.is_some() { "(set)" } else { "(none)" }
            );
        }
        NluProviderType::Keyword => println!("  Provider: keyword (built-in)"),
    }
    println!(
        "  Session idle timeout: {}s (sweep every {}s)",
        config.spec.sessions.idle_timeout_seconds, config.spec.sessions.sweep_interval_seconds
    );
    println!();

    println!("{}", "Storage:".bold());
    match config.spec.storage.backend {
        StorageBackendType::InMemory => println!("  Backend: in-memory"),
        StorageBackendType::Postgres => {
            println!("  Backend: postgres");
            println!("  Max connections: {}", config.spec.storage.max_connections);
        }
    }
    println!();

    println!("{}", "Timeouts:".bold());
    println!("  NLU: {} ms", config.spec.timeouts.nlu_ms);
    println!("  Persistence: {} ms", config.spec.timeouts.persistence_ms);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ServiceConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
