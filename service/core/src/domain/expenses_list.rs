// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::expense::ExpenseId;
use crate::domain::user::{CreatorProfile, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListId(pub Uuid);

impl ListId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl Default for ListId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ListId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, shared collection of expenses.
///
/// `expenses` is an index of member expense ids kept in insertion order. The
/// source of truth for membership is `Expense::list_id`; a crash between the
/// expense write and the list write can leave an expense that is not yet
/// referenced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensesList {
    pub id: ListId,
    pub name: String,
    pub creator: UserId,
    pub creator_name: String,
    pub creator_photo: String,
    pub expenses: Vec<ExpenseId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpensesList {
    pub fn new(name: impl Into<String>, creator: UserId, profile: CreatorProfile) -> Self {
        let now = Utc::now();
        Self {
            id: ListId::new(),
            name: name.into(),
            creator,
            creator_name: profile.name,
            creator_photo: profile.photo,
            expenses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Append an expense reference. Returns false if it was already present.
    pub fn push_expense(&mut self, expense_id: ExpenseId) -> bool {
        if self.expenses.contains(&expense_id) {
            return false;
        }
        self.expenses.push(expense_id);
        self.updated_at = Utc::now();
        true
    }

    /// Remove an expense reference. Returns false if it was not present.
    pub fn pull_expense(&mut self, expense_id: ExpenseId) -> bool {
        let before = self.expenses.len();
        self.expenses.retain(|id| *id != expense_id);
        let removed = self.expenses.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_pull_expense() {
        let mut list = ExpensesList::new("Trip", UserId::new(), CreatorProfile::default());
        let a = ExpenseId::new();
        let b = ExpenseId::new();
        let c = ExpenseId::new();

        assert!(list.push_expense(a));
        assert!(list.push_expense(b));
        assert!(list.push_expense(c));
        assert!(!list.push_expense(b));

        assert!(list.pull_expense(b));
        assert_eq!(list.expenses, vec![a, c]);
        assert!(!list.pull_expense(b));
        assert_eq!(list.expenses, vec![a, c]);
    }
}
