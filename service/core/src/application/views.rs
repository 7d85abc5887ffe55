// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Read views returned to callers
//!
//! Creator identity on a view is resolved from the live `User` record; the
//! denormalized copy on the entity is only used when the user is gone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::expense::{Expense, ExpenseId};
use crate::domain::expenses_list::{ExpensesList, ListId};
use crate::domain::user::{User, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorView {
    pub id: UserId,
    pub name: String,
    pub photo: String,
}

impl CreatorView {
    fn resolve(id: UserId, fallback_name: &str, fallback_photo: &str, users: &HashMap<UserId, User>) -> Self {
        match users.get(&id) {
            Some(user) => Self {
                id,
                name: user.name.clone(),
                photo: user.photo.clone(),
            },
            None => Self {
                id,
                name: fallback_name.to_string(),
                photo: fallback_photo.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub id: ListId,
    pub name: String,
    pub creator: CreatorView,
    pub expenses: Vec<ExpenseId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListView {
    pub fn build(list: &ExpensesList, users: &HashMap<UserId, User>) -> Self {
        Self {
            id: list.id,
            name: list.name.clone(),
            creator: CreatorView::resolve(list.creator, &list.creator_name, &list.creator_photo, users),
            expenses: list.expenses.clone(),
            created_at: list.created_at,
            updated_at: list.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    pub id: ExpenseId,
    pub name: String,
    pub amount: f64,
    pub list_id: ListId,
    pub creator: CreatorView,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpenseView {
    pub fn build(expense: &Expense, users: &HashMap<UserId, User>) -> Self {
        Self {
            id: expense.id,
            name: expense.name.clone(),
            amount: expense.amount,
            list_id: expense.list_id,
            creator: CreatorView::resolve(
                expense.creator,
                &expense.creator_name,
                &expense.creator_photo,
                users,
            ),
            created_at: expense.created_at,
            updated_at: expense.updated_at,
        }
    }
}
