// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Notification Repository
//!
//! `NotificationRepository` backed by the `notifications` table. Rows are
//! append-only apart from the `read` flag.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::expenses_list::ListId;
use crate::domain::notification::{Notification, NotificationDisplay, NotificationId, NotificationKind};
use crate::domain::repository::{NotificationRepository, RepositoryError};
use crate::domain::user::UserId;

const COLUMNS: &str = r#"id, user_id, kind, action, list_id, list_display_name, avatar_src,
    creator_name, expense_description, price, "timestamp", read"#;

pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn notification_from_row(row: &PgRow) -> Result<Notification, RepositoryError> {
    let kind: String = row.try_get("kind")?;
    let kind = NotificationKind::parse(&kind)
        .ok_or_else(|| RepositoryError::Serialization(format!("Unknown notification kind: {}", kind)))?;

    Ok(Notification {
        id: NotificationId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        kind,
        action: row.try_get("action")?,
        list_name: ListId(row.try_get("list_id")?),
        display: NotificationDisplay {
            avatar_src: row.try_get("avatar_src")?,
            creator_name: row.try_get("creator_name")?,
            list_display_name: row.try_get("list_display_name")?,
            expense_description: row.try_get("expense_description")?,
            price: row.try_get("price")?,
        },
        timestamp: row.try_get("timestamp")?,
        read: row.try_get("read")?,
    })
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn save(&self, notification: &Notification) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, user_id, kind, action, list_id, list_display_name, avatar_src,
                creator_name, expense_description, price, "timestamp", read
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET read = EXCLUDED.read
            "#,
        )
        .bind(notification.id.0)
        .bind(notification.user_id.0)
        .bind(notification.kind.as_str())
        .bind(&notification.action)
        .bind(notification.list_name.0)
        .bind(&notification.display.list_display_name)
        .bind(&notification.display.avatar_src)
        .bind(&notification.display.creator_name)
        .bind(notification.display.expense_description.as_deref())
        .bind(notification.display.price)
        .bind(notification.timestamp)
        .bind(notification.read)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save notification: {}", e)))?;

        Ok(())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {} FROM notifications WHERE user_id = $1 ORDER BY "timestamp" DESC"#,
            COLUMNS
        ))
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        let row = sqlx::query(&format!(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2 RETURNING {}",
            COLUMNS
        ))
        .bind(id.0)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(notification_from_row).transpose()
    }
}
