// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

//! `expensa seed`: import mock lists into the configured storage

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use expensa_core::application::create_repositories;
use expensa_core::application::seed::{SeedData, SeedImporter};
use expensa_core::application::users::UserDirectory;
use expensa_core::domain::repository::StorageBackend;
use expensa_core::domain::service_config::ServiceConfig;
use expensa_core::domain::user::generate_auth0_id;

#[derive(Args)]
pub struct SeedArgs {
    /// JSON file with an `expensesList` array
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// External-auth id for every seeded user (default: AUTH0_ID, else random)
    #[arg(long)]
    pub auth_id: Option<String>,
}

pub async fn run(args: SeedArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = ServiceConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let data = SeedData::from_file(&args.file)?;

    let backend = config.storage_backend()?;
    if matches!(backend, StorageBackend::InMemory) {
        warn!("Seeding in-memory storage; the data is discarded when this command exits");
    }
    let repositories = create_repositories(&backend)
        .await
        .context("Failed to initialize storage")?;

    // One id for the whole import, so a single login reaches every seeded user
    let auth0_id = args
        .auth_id
        .or_else(|| config.spec.seed.auth0_id.clone())
        .unwrap_or_else(generate_auth0_id);

    let users = Arc::new(UserDirectory::new(
        repositories.users.clone(),
        config.spec.timeouts.persistence(),
    ));
    let importer = SeedImporter::new(users, repositories.lists.clone(), repositories.expenses.clone())
        .with_auth0_id(Some(auth0_id.clone()));
    let report = importer.import(&data).await?;

    println!(
        "{}",
        format!(
            "✓ Imported {} list(s), {} expense(s), {} user(s)",
            report.lists, report.expenses, report.users
        )
        .green()
    );
    println!("  auth0 id: {}", auth0_id);

    Ok(())
}
