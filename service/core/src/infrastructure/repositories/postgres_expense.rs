// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Expense Repository
//!
//! `ExpenseRepository` backed by the `expenses` table. Membership queries go
//! through `list_id`, never through the list's reference index.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::expense::{validate_amount, Expense, ExpenseId, ExpensePatch};
use crate::domain::expenses_list::ListId;
use crate::domain::repository::{ExpenseRepository, RepositoryError};
use crate::domain::user::UserId;

const COLUMNS: &str =
    "id, name, amount, creator, creator_name, creator_photo, list_id, created_at, updated_at";

pub struct PostgresExpenseRepository {
    pool: PgPool,
}

impl PostgresExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn expense_from_row(row: &PgRow) -> Result<Expense, RepositoryError> {
    Ok(Expense {
        id: ExpenseId(row.try_get("id")?),
        name: row.try_get("name")?,
        amount: row.try_get("amount")?,
        creator: UserId(row.try_get("creator")?),
        creator_name: row.try_get("creator_name")?,
        creator_photo: row.try_get("creator_photo")?,
        list_id: ListId(row.try_get("list_id")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    async fn save(&self, expense: &Expense) -> Result<(), RepositoryError> {
        validate_amount(expense.amount)?;
        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, name, amount, creator, creator_name, creator_photo, list_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                amount = EXCLUDED.amount,
                creator = EXCLUDED.creator,
                creator_name = EXCLUDED.creator_name,
                creator_photo = EXCLUDED.creator_photo,
                list_id = EXCLUDED.list_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(expense.id.0)
        .bind(&expense.name)
        .bind(expense.amount)
        .bind(expense.creator.0)
        .bind(&expense.creator_name)
        .bind(&expense.creator_photo)
        .bind(expense.list_id.0)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save expense: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: ExpenseId) -> Result<Option<Expense>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM expenses WHERE id = $1", COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(expense_from_row).transpose()
    }

    async fn find_by_list(&self, list_id: ListId) -> Result<Vec<Expense>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM expenses WHERE list_id = $1 ORDER BY created_at ASC",
            COLUMNS
        ))
        .bind(list_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(expense_from_row).collect()
    }

    async fn list_all(&self) -> Result<Vec<Expense>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {} FROM expenses ORDER BY created_at ASC", COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(expense_from_row).collect()
    }

    async fn update(
        &self,
        id: ExpenseId,
        patch: &ExpensePatch,
    ) -> Result<Option<Expense>, RepositoryError> {
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
        }
        let row = sqlx::query(&format!(
            r#"
            UPDATE expenses
            SET name = COALESCE($2, name),
                amount = COALESCE($3, amount),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id.0)
        .bind(patch.name.as_deref())
        .bind(patch.amount)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(expense_from_row).transpose()
    }

    async fn delete(&self, id: ExpenseId) -> Result<Option<Expense>, RepositoryError> {
        let row = sqlx::query(&format!("DELETE FROM expenses WHERE id = $1 RETURNING {}", COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(expense_from_row).transpose()
    }

    async fn delete_by_list(&self, list_id: ListId) -> Result<usize, RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE list_id = $1")
            .bind(list_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }
}
