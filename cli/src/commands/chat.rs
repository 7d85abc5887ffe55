// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

//! `expensa chat`: send one utterance to a running server

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use uuid::Uuid;

use expensa_core::domain::service_config::ServiceConfig;

#[derive(Args)]
pub struct ChatArgs {
    /// What to say, e.g. "create list Summer Trip"
    #[arg(required = true, num_args = 1..)]
    pub message: Vec<String>,

    /// Caller user id
    #[arg(short, long, env = "EXPENSA_USER_ID")]
    pub user: Uuid,

    /// Server base URL (default: derived from config)
    #[arg(long)]
    pub url: Option<String>,

    /// Print the raw JSON envelope
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    message: &'a str,
    user_id: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Post the message; returns the HTTP status and the envelope
    pub async fn send(&self, message: &str, user: Uuid) -> Result<(u16, Value)> {
        let response = self
            .client
            .post(format!("{}/api/dialogflow", self.base_url))
            .json(&ChatRequest {
                message,
                user_id: user.to_string(),
            })
            .send()
            .await
            .with_context(|| format!("Failed to reach Expensa at {}", self.base_url))?;

        let status = response.status().as_u16();
        let envelope: Value = response
            .json()
            .await
            .context("Failed to parse chat response")?;
        Ok((status, envelope))
    }
}

pub async fn run(
    args: ChatArgs,
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let base_url = match args.url {
        Some(url) => url,
        None => {
            let config = ServiceConfig::load_or_default(config_path)
                .context("Failed to load configuration")?;
            format!(
                "http://{}:{}",
                host.unwrap_or(config.spec.server.bind_address),
                port.unwrap_or(config.spec.server.port)
            )
        }
    };

    let client = ChatClient::new(base_url)?;
    let message = args.message.join(" ");
    let (status, envelope) = client.send(&message, args.user).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    println!("{}", render(status, &envelope));
    Ok(())
}

fn render(status: u16, envelope: &Value) -> String {
    let headline = match &envelope["response"] {
        Value::String(text) => text.clone(),
        Value::Array(items) => format!("{} item(s)", items.len()),
        other => other.to_string(),
    };

    let mut out = if (200..300).contains(&status) {
        format!("{} {}", "✓".green(), headline)
    } else {
        format!("{} [{}] {}", "✗".red(), status, headline)
    };

    if let Value::Array(items) = &envelope["response"] {
        for item in items {
            let name = item["name"].as_str().unwrap_or("?");
            let id = item["id"].as_str().unwrap_or("?");
            match item["amount"].as_f64() {
                Some(amount) => out.push_str(&format!("\n  - {} {:.2} ({})", name, amount, id.dimmed())),
                None => out.push_str(&format!("\n  - {} ({})", name, id.dimmed())),
            }
        }
    }
    out
}
