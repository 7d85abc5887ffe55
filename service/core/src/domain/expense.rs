// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::expenses_list::ListId;
use crate::domain::user::{CreatorProfile, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExpenseId(pub Uuid);

impl ExpenseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl Default for ExpenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single line item inside an expenses list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub name: String,
    pub amount: f64,
    pub creator: UserId,
    pub creator_name: String,
    pub creator_photo: String,
    pub list_id: ListId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        list_id: ListId,
        creator: UserId,
        profile: CreatorProfile,
    ) -> Result<Self, InvalidAmount> {
        let amount = validate_amount(amount)?;
        let now = Utc::now();
        Ok(Self {
            id: ExpenseId::new(),
            name: name.into(),
            amount,
            creator,
            creator_name: profile.name,
            creator_photo: profile.photo,
            list_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, patch: &ExpensePatch) -> Result<(), InvalidAmount> {
        if let Some(amount) = patch.amount {
            self.amount = validate_amount(amount)?;
        }
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Partial update for an expense. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpensePatch {
    pub name: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("amount must be a finite, non-negative number (got {0})")]
pub struct InvalidAmount(pub f64);

pub fn validate_amount(amount: f64) -> Result<f64, InvalidAmount> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(InvalidAmount(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_validation() {
        assert!(validate_amount(0.0).is_ok());
        assert!(validate_amount(12.5).is_ok());
        assert!(validate_amount(-1.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn test_patch_leaves_absent_fields() {
        let mut expense = Expense::new(
            "Lunch",
            12.5,
            ListId::new(),
            UserId::new(),
            CreatorProfile::default(),
        )
        .unwrap();

        expense
            .apply(&ExpensePatch { name: None, amount: Some(20.0) })
            .unwrap();
        assert_eq!(expense.name, "Lunch");
        assert_eq!(expense.amount, 20.0);

        assert!(expense
            .apply(&ExpensePatch { name: Some("Dinner".into()), amount: Some(-3.0) })
            .is_err());
        assert_eq!(expense.name, "Lunch");
    }
}
