// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations based on the storage backend
//! configuration, keeping the domain layer free of infrastructure types.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Select in-memory or PostgreSQL repositories

use std::sync::Arc;

use crate::domain::repository::{
    ExpenseRepository, ExpensesListRepository, NotificationRepository, StorageBackend,
    UserRepository,
};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::{
    InMemoryExpenseRepository, InMemoryExpensesListRepository, InMemoryNotificationRepository,
    InMemoryUserRepository, PostgresExpenseRepository, PostgresExpensesListRepository,
    PostgresNotificationRepository, PostgresUserRepository,
};

/// One repository per aggregate, all on the same backend
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub lists: Arc<dyn ExpensesListRepository>,
    pub expenses: Arc<dyn ExpenseRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            lists: Arc::new(InMemoryExpensesListRepository::new()),
            expenses: Arc::new(InMemoryExpenseRepository::new()),
            notifications: Arc::new(InMemoryNotificationRepository::new()),
        }
    }

    pub fn postgres(db: &Database) -> Self {
        let pool = db.get_pool().clone();
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            lists: Arc::new(PostgresExpensesListRepository::new(pool.clone())),
            expenses: Arc::new(PostgresExpenseRepository::new(pool.clone())),
            notifications: Arc::new(PostgresNotificationRepository::new(pool)),
        }
    }
}

/// Connect (and migrate) when the backend needs it, then build repositories
pub async fn create_repositories(backend: &StorageBackend) -> anyhow::Result<Repositories> {
    match backend {
        StorageBackend::InMemory => {
            tracing::info!("Using in-memory storage");
            Ok(Repositories::in_memory())
        }
        StorageBackend::PostgreSQL(config) => {
            tracing::info!("Connecting to PostgreSQL storage");
            let db = Database::connect(config).await?;
            db.migrate().await?;
            Ok(Repositories::postgres(&db))
        }
    }
}
