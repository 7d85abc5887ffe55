// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Push Channel Domain Interface
//!
//! Emit-only contract for the real-time channel that carries notification
//! cards to connected clients. Delivery is at-most-once and best-effort: a
//! failed publish never undoes the write that triggered it.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Event payloads and the `PushChannel` port
//! - **Implementations:** `crate::infrastructure::event_bus::EventBus`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::notification::{Notification, NotificationDisplay, NotificationKind};
use crate::domain::user::UserId;

/// Event name used for every notification publish.
pub const NOTIFICATION_EVENT: &str = "notification";

/// `{ type, props }` card rendered by the notification feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationCard {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub props: CardProps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardProps {
    pub id: String,
    pub avatar_src: String,
    pub list_name: String,
    pub creator_name: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl NotificationCard {
    pub fn new(
        kind: NotificationKind,
        id: impl Into<String>,
        display: &NotificationDisplay,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            props: CardProps {
                id: id.into(),
                avatar_src: display.avatar_src.clone(),
                list_name: display.list_display_name.clone(),
                creator_name: display.creator_name.clone(),
                action: kind.action_text().to_string(),
                timestamp,
                expense_description: display.expense_description.clone(),
                price: display.price,
            },
        }
    }
}

impl From<&Notification> for NotificationCard {
    fn from(n: &Notification) -> Self {
        NotificationCard::new(n.kind, n.id.to_string(), &n.display, n.timestamp)
    }
}

/// One publish on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEvent {
    pub event: String,
    /// Users the event concerns. Transport may still broadcast to everyone.
    pub recipients: Vec<UserId>,
    pub payload: NotificationCard,
}

impl PushEvent {
    pub fn notification(recipients: Vec<UserId>, payload: NotificationCard) -> Self {
        Self {
            event: NOTIFICATION_EVENT.to_string(),
            recipients,
            payload,
        }
    }

    pub fn concerns(&self, user_id: &UserId) -> bool {
        self.recipients.contains(user_id)
    }
}

/// Emit-only push channel
pub trait PushChannel: Send + Sync {
    /// Publish to every connected subscriber. Returns how many received it.
    fn publish(&self, event: PushEvent) -> Result<usize, PushError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Push channel unavailable: {0}")]
    Unavailable(String),

    #[error("Push payload rejected: {0}")]
    Rejected(String),
}
