// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL User Repository
//!
//! `UserRepository` backed by the `users` table. `upsert_if_absent` is a
//! single `INSERT ... ON CONFLICT DO NOTHING` followed by a read, so
//! concurrent first references to the same creator produce one row.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::repository::{RepositoryError, UserRepository};
use crate::domain::user::{User, UserId};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, RepositoryError> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        name: row.try_get("name")?,
        photo: row.try_get("photo")?,
        auth0_id: row.try_get("auth0_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, photo, auth0_id, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let raw: Vec<uuid::Uuid> = ids.iter().map(|id| id.0).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, name, photo, auth0_id, created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(&raw)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn upsert_if_absent(&self, user: &User) -> Result<(User, bool), RepositoryError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, name, photo, auth0_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user.id.0)
        .bind(&user.name)
        .bind(&user.photo)
        .bind(&user.auth0_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to upsert user: {}", e)))?
        .rows_affected();

        let stored = self
            .find_by_id(user.id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("User {}", user.id)))?;
        Ok((stored, inserted == 1))
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }
}
