// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Expenses List Repository
//!
//! `ExpensesListRepository` backed by the `expenses_lists` table. The
//! expense reference index lives in a `UUID[]` column and is mutated in
//! place with `array_append` / `array_remove`, one statement per change.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::expense::ExpenseId;
use crate::domain::expenses_list::{ExpensesList, ListId};
use crate::domain::repository::{ExpensesListRepository, RepositoryError};
use crate::domain::user::UserId;

const COLUMNS: &str = "id, name, creator, creator_name, creator_photo, expenses, created_at, updated_at";

pub struct PostgresExpensesListRepository {
    pool: PgPool,
}

impl PostgresExpensesListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn list_from_row(row: &PgRow) -> Result<ExpensesList, RepositoryError> {
    let expenses: Vec<Uuid> = row.try_get("expenses")?;
    Ok(ExpensesList {
        id: ListId(row.try_get("id")?),
        name: row.try_get("name")?,
        creator: UserId(row.try_get("creator")?),
        creator_name: row.try_get("creator_name")?,
        creator_photo: row.try_get("creator_photo")?,
        expenses: expenses.into_iter().map(ExpenseId).collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ExpensesListRepository for PostgresExpensesListRepository {
    async fn save(&self, list: &ExpensesList) -> Result<(), RepositoryError> {
        let expenses: Vec<Uuid> = list.expenses.iter().map(|e| e.0).collect();
        sqlx::query(
            r#"
            INSERT INTO expenses_lists (
                id, name, creator, creator_name, creator_photo, expenses, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                creator = EXCLUDED.creator,
                creator_name = EXCLUDED.creator_name,
                creator_photo = EXCLUDED.creator_photo,
                expenses = EXCLUDED.expenses,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(list.id.0)
        .bind(&list.name)
        .bind(list.creator.0)
        .bind(&list.creator_name)
        .bind(&list.creator_photo)
        .bind(&expenses)
        .bind(list.created_at)
        .bind(list.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save list: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: ListId) -> Result<Option<ExpensesList>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM expenses_lists WHERE id = $1", COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(list_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<ExpensesList>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM expenses_lists ORDER BY created_at ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(list_from_row).collect()
    }

    async fn rename(&self, id: ListId, name: &str) -> Result<Option<ExpensesList>, RepositoryError> {
        let row = sqlx::query(&format!(
            "UPDATE expenses_lists SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            COLUMNS
        ))
        .bind(id.0)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(list_from_row).transpose()
    }

    async fn push_expense(
        &self,
        id: ListId,
        expense_id: ExpenseId,
    ) -> Result<Option<ExpensesList>, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE expenses_lists
            SET expenses = CASE
                    WHEN $2 = ANY(expenses) THEN expenses
                    ELSE array_append(expenses, $2)
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id.0)
        .bind(expense_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(list_from_row).transpose()
    }

    async fn pull_expense(
        &self,
        id: ListId,
        expense_id: ExpenseId,
    ) -> Result<Option<ExpensesList>, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE expenses_lists
            SET expenses = array_remove(expenses, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id.0)
        .bind(expense_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(list_from_row).transpose()
    }

    async fn delete(&self, id: ListId) -> Result<Option<ExpensesList>, RepositoryError> {
        let row = sqlx::query(&format!(
            "DELETE FROM expenses_lists WHERE id = $1 RETURNING {}",
            COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(list_from_row).transpose()
    }
}
