// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate root: one repository per
//! aggregate, interface defined in the domain layer, implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `UserRepository` | `User` | `InMemoryUserRepository`, `PostgresUserRepository` |
//! | `ExpensesListRepository` | `ExpensesList` | `InMemoryExpensesListRepository`, `PostgresExpensesListRepository` |
//! | `ExpenseRepository` | `Expense` | `InMemoryExpenseRepository`, `PostgresExpenseRepository` |
//! | `NotificationRepository` | `Notification` | `InMemoryNotificationRepository`, `PostgresNotificationRepository` |
//!
//! ## Atomicity
//!
//! Every method is atomic with respect to a single document. Nothing here
//! spans two aggregates: the list's expense index is maintained with a
//! second write (`push_expense` / `pull_expense`) after the expense write.
//!
//! Mutations that target an id return `Ok(None)` when the id does not
//! resolve, leaving the Not-Found decision to the caller.

use async_trait::async_trait;

use crate::domain::expense::{Expense, ExpenseId, ExpensePatch};
use crate::domain::expenses_list::{ExpensesList, ListId};
use crate::domain::notification::{Notification, NotificationId};
use crate::domain::user::{User, UserId};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Find several users at once; unknown ids are skipped
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError>;

    /// Insert `user` unless one with the same id already exists, atomically.
    /// Returns the stored user and whether this call created it.
    async fn upsert_if_absent(&self, user: &User) -> Result<(User, bool), RepositoryError>;

    async fn count(&self) -> Result<usize, RepositoryError>;
}

#[async_trait]
pub trait ExpensesListRepository: Send + Sync {
    /// Save list (create or replace)
    async fn save(&self, list: &ExpensesList) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: ListId) -> Result<Option<ExpensesList>, RepositoryError>;

    /// All lists, oldest first
    async fn list_all(&self) -> Result<Vec<ExpensesList>, RepositoryError>;

    async fn rename(&self, id: ListId, name: &str) -> Result<Option<ExpensesList>, RepositoryError>;

    /// Append an expense reference to the list's index
    async fn push_expense(
        &self,
        id: ListId,
        expense_id: ExpenseId,
    ) -> Result<Option<ExpensesList>, RepositoryError>;

    /// Remove an expense reference from the list's index
    async fn pull_expense(
        &self,
        id: ListId,
        expense_id: ExpenseId,
    ) -> Result<Option<ExpensesList>, RepositoryError>;

    /// Delete list by ID, returning the removed list
    async fn delete(&self, id: ListId) -> Result<Option<ExpensesList>, RepositoryError>;
}

#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Save expense (create or replace)
    async fn save(&self, expense: &Expense) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: ExpenseId) -> Result<Option<Expense>, RepositoryError>;

    /// Expenses whose `list_id` matches, oldest first
    async fn find_by_list(&self, list_id: ListId) -> Result<Vec<Expense>, RepositoryError>;

    async fn list_all(&self) -> Result<Vec<Expense>, RepositoryError>;

    /// Merge `patch` into the stored expense
    async fn update(
        &self,
        id: ExpenseId,
        patch: &ExpensePatch,
    ) -> Result<Option<Expense>, RepositoryError>;

    /// Delete expense by ID, returning the removed expense
    async fn delete(&self, id: ExpenseId) -> Result<Option<Expense>, RepositoryError>;

    /// Delete every expense keyed to a list; returns how many were removed
    async fn delete_by_list(&self, list_id: ListId) -> Result<usize, RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn save(&self, notification: &Notification) -> Result<(), RepositoryError>;

    /// Notifications addressed to a user, newest first
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Notification>, RepositoryError>;

    /// Set `read` on a notification owned by `user_id`
    async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<Option<Notification>, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<crate::domain::expense::InvalidAmount> for RepositoryError {
    fn from(err: crate::domain::expense::InvalidAmount) -> Self {
        RepositoryError::Constraint(err.to_string())
    }
}
