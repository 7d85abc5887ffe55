// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Notification aggregate
//!
//! A notification is written once per target user whenever a list or an
//! expense changes, and afterwards only its `read` flag may change.
//!
//! The persisted field names follow the shape the web client already reads:
//! `listName` holds the list *reference* (its id), the human readable name
//! travels separately as `listDisplayName`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::expenses_list::ListId;
use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of state change a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ListCreated,
    ListUpdated,
    ListDeleted,
    ExpenseCreated,
    ExpenseUpdated,
    ExpenseDeleted,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListCreated => "list_created",
            Self::ListUpdated => "list_updated",
            Self::ListDeleted => "list_deleted",
            Self::ExpenseCreated => "expense_created",
            Self::ExpenseUpdated => "expense_updated",
            Self::ExpenseDeleted => "expense_deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "list_created" => Some(Self::ListCreated),
            "list_updated" => Some(Self::ListUpdated),
            "list_deleted" => Some(Self::ListDeleted),
            "expense_created" => Some(Self::ExpenseCreated),
            "expense_updated" => Some(Self::ExpenseUpdated),
            "expense_deleted" => Some(Self::ExpenseDeleted),
            _ => None,
        }
    }

    /// Verb shown in the notification feed ("created a list", ...)
    pub fn action_text(&self) -> &'static str {
        match self {
            Self::ListCreated => "created a list",
            Self::ListUpdated => "renamed a list",
            Self::ListDeleted => "deleted a list",
            Self::ExpenseCreated => "added an expense",
            Self::ExpenseUpdated => "updated an expense",
            Self::ExpenseDeleted => "removed an expense",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Denormalized display data captured at emit time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDisplay {
    pub avatar_src: String,
    pub creator_name: String,
    pub list_display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub action: String,
    /// Reference to the affected list.
    pub list_name: ListId,
    #[serde(flatten)]
    pub display: NotificationDisplay,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        list_id: ListId,
        display: NotificationDisplay,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            action: kind.action_text().to_string(),
            list_name: list_id,
            display,
            timestamp,
            read: false,
        }
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            NotificationKind::ListCreated,
            NotificationKind::ListUpdated,
            NotificationKind::ListDeleted,
            NotificationKind::ExpenseCreated,
            NotificationKind::ExpenseUpdated,
            NotificationKind::ExpenseDeleted,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("list_archived"), None);
    }

    #[test]
    fn test_persisted_shape() {
        let list_id = ListId::new();
        let n = Notification::new(
            UserId::new(),
            NotificationKind::ExpenseCreated,
            list_id,
            NotificationDisplay {
                avatar_src: "https://img/u1.png".into(),
                creator_name: "Dana".into(),
                list_display_name: "Trip".into(),
                expense_description: Some("Lunch".into()),
                price: Some(12.5),
            },
            Utc::now(),
        );

        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "expense_created");
        assert_eq!(json["listName"], list_id.0.to_string());
        assert_eq!(json["listDisplayName"], "Trip");
        assert_eq!(json["avatarSrc"], "https://img/u1.png");
        assert_eq!(json["price"], 12.5);
        assert_eq!(json["read"], false);
    }
}
