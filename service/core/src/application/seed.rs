// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Seed Import
//!
//! Loads a mock dataset of lists, nested expenses and their creators into
//! whatever storage backend the repositories point at.
//!
//! ```json
//! { "expensesList": [ { "_id": "<uuid>", "name": "Trip",
//!     "creator": { "_id": "<uuid>", "name": "Dana", "photo": "" },
//!     "createdAt": "2024-05-01T10:00:00Z",
//!     "expenses": [ { "_id": "<uuid>", "name": "Lunch", "amount": 12.5,
//!                     "creator": { "_id": "<uuid>", "name": "Eli" } } ] } ] }
//! ```
//!
//! Creators are upserted concurrently and all of them exist before the first
//! list is written. Rows that carry an `_id` are upserted by it; rows without
//! one get a fresh id on every import.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::application::users::UserDirectory;
use crate::domain::expense::{Expense, ExpenseId};
use crate::domain::expenses_list::{ExpensesList, ListId};
use crate::domain::repository::{ExpenseRepository, ExpensesListRepository};
use crate::domain::user::{CreatorProfile, UserId};

#[derive(Debug, Clone, Deserialize)]
pub struct SeedData {
    #[serde(rename = "expensesList", alias = "lists")]
    pub lists: Vec<SeedList>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCreator {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub photo: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedList {
    #[serde(default, alias = "_id")]
    pub id: Option<ListId>,
    pub name: String,
    pub creator: SeedCreator,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub expenses: Vec<SeedExpense>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedExpense {
    #[serde(default, alias = "_id")]
    pub id: Option<ExpenseId>,
    pub name: String,
    pub amount: f64,
    pub creator: SeedCreator,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl SeedData {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse seed data")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file: {:?}", path))?;
        Self::from_json_str(&content)
    }

    /// Every distinct creator referenced by a list or an expense
    fn creators(&self) -> BTreeMap<UserId, CreatorProfile> {
        let mut creators = BTreeMap::new();
        for list in &self.lists {
            creators
                .entry(list.creator.id)
                .or_insert_with(|| CreatorProfile::new(&list.creator.name, &list.creator.photo));
            for expense in &list.expenses {
                creators.entry(expense.creator.id).or_insert_with(|| {
                    CreatorProfile::new(&expense.creator.name, &expense.creator.photo)
                });
            }
        }
        creators
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub lists: usize,
    pub expenses: usize,
}

pub struct SeedImporter {
    users: Arc<UserDirectory>,
    lists: Arc<dyn ExpensesListRepository>,
    expenses: Arc<dyn ExpenseRepository>,
    auth0_id: Option<String>,
}

impl SeedImporter {
    pub fn new(
        users: Arc<UserDirectory>,
        lists: Arc<dyn ExpensesListRepository>,
        expenses: Arc<dyn ExpenseRepository>,
    ) -> Self {
        Self {
            users,
            lists,
            expenses,
            auth0_id: None,
        }
    }

    /// External-auth id assigned to every seeded user
    pub fn with_auth0_id(mut self, auth0_id: Option<String>) -> Self {
        self.auth0_id = auth0_id;
        self
    }

    pub async fn import(&self, data: &SeedData) -> Result<SeedReport> {
        let creators = data.creators();
        let upserts = creators.iter().map(|(id, profile)| {
            self.users
                .ensure(*id, Some(profile.clone()), self.auth0_id.clone())
        });
        let users = try_join_all(upserts)
            .await
            .context("Failed to upsert seed creators")?;

        let mut report = SeedReport {
            users: users.len(),
            ..SeedReport::default()
        };

        for seed in &data.lists {
            let list_id = seed.id.unwrap_or_default();
            let mut list = ExpensesList::new(
                &seed.name,
                seed.creator.id,
                CreatorProfile::new(&seed.creator.name, &seed.creator.photo),
            );
            list.id = list_id;
            list.created_at = parse_or_now(seed.created_at.as_deref());
            list.updated_at = parse_or_now(seed.updated_at.as_deref());

            for item in &seed.expenses {
                let expense = build_expense(item, list_id)
                    .with_context(|| format!("Invalid expense {:?} in list {:?}", item.name, seed.name))?;
                self.expenses
                    .save(&expense)
                    .await
                    .with_context(|| format!("Failed to save expense {:?}", item.name))?;
                list.push_expense(expense.id);
                report.expenses += 1;
            }

            self.lists
                .save(&list)
                .await
                .with_context(|| format!("Failed to save list {:?}", seed.name))?;
            report.lists += 1;
            tracing::debug!(list_id = %list.id, expenses = list.expenses.len(), "Seeded list");
        }

        tracing::info!(
            users = report.users,
            lists = report.lists,
            expenses = report.expenses,
            "Seed import complete"
        );
        Ok(report)
    }
}

fn build_expense(item: &SeedExpense, list_id: ListId) -> Result<Expense> {
    let mut expense = Expense::new(
        &item.name,
        item.amount,
        list_id,
        item.creator.id,
        CreatorProfile::new(&item.creator.name, &item.creator.photo),
    )?;
    if let Some(id) = item.id {
        expense.id = id;
    }
    expense.created_at = parse_or_now(item.created_at.as_deref());
    expense.updated_at = parse_or_now(item.updated_at.as_deref());
    Ok(expense)
}

/// Unparseable or missing timestamps fall back to the import time
fn parse_or_now(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::UserRepository;
    use crate::infrastructure::repositories::{
        InMemoryExpenseRepository, InMemoryExpensesListRepository, InMemoryUserRepository,
    };
    use std::time::Duration;

    const DANA: &str = "6f1c2d3e-0000-4000-8000-000000000001";
    const ELI: &str = "6f1c2d3e-0000-4000-8000-000000000002";
    const TRIP: &str = "6f1c2d3e-0000-4000-8000-0000000000a1";

    fn sample() -> String {
        format!(
            r#"{{
              "expensesList": [
                {{
                  "_id": "{TRIP}",
                  "name": "Trip",
                  "creator": {{ "_id": "{DANA}", "name": "Dana", "photo": "dana.png" }},
                  "createdAt": "2024-05-01T10:00:00Z",
                  "updatedAt": "not a date",
                  "expenses": [
                    {{ "_id": "6f1c2d3e-0000-4000-8000-0000000000e1", "name": "Lunch", "amount": 12.5,
                       "creator": {{ "_id": "{ELI}", "name": "Eli" }} }},
                    {{ "name": "Taxi", "amount": 30,
                       "creator": {{ "_id": "{DANA}", "name": "Dana" }} }}
                  ]
                }},
                {{
                  "name": "Groceries",
                  "creator": {{ "_id": "{ELI}", "name": "Eli" }},
                  "expenses": []
                }}
              ]
            }}"#
        )
    }

    fn importer() -> (
        SeedImporter,
        InMemoryUserRepository,
        InMemoryExpensesListRepository,
        InMemoryExpenseRepository,
    ) {
        let users = InMemoryUserRepository::new();
        let lists = InMemoryExpensesListRepository::new();
        let expenses = InMemoryExpenseRepository::new();
        let directory = Arc::new(UserDirectory::new(
            Arc::new(users.clone()),
            Duration::from_secs(1),
        ));
        let importer = SeedImporter::new(directory, Arc::new(lists.clone()), Arc::new(expenses.clone()))
            .with_auth0_id(Some("1234567890".into()));
        (importer, users, lists, expenses)
    }

    #[tokio::test]
    async fn test_import_creates_creators_lists_and_expenses() {
        let (importer, users, lists, expenses) = importer();
        let data = SeedData::from_json_str(&sample()).unwrap();

        let report = importer.import(&data).await.unwrap();
        assert_eq!(report, SeedReport { users: 2, lists: 2, expenses: 2 });

        assert_eq!(users.count().await.unwrap(), 2);
        let eli = users
            .find_by_id(UserId::from_string(ELI).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(eli.auth0_id, "1234567890");

        let trip = lists
            .find_by_id(ListId::from_string(TRIP).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(trip.expenses.len(), 2);
        assert_eq!(trip.created_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert_eq!(expenses.find_by_list(trip.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent_for_identified_rows() {
        let (importer, users, lists, _) = importer();
        let data = SeedData::from_json_str(&sample()).unwrap();
        importer.import(&data).await.unwrap();
        importer.import(&data).await.unwrap();

        assert_eq!(users.count().await.unwrap(), 2);
        let trip = lists
            .find_by_id(ListId::from_string(TRIP).unwrap())
            .await
            .unwrap()
            .unwrap();
        // The Taxi row has no id, so each import adds a fresh one
        assert_eq!(trip.expenses.len(), 2);
    }

    #[tokio::test]
    async fn test_negative_amount_aborts_import() {
        let (importer, _, lists, _) = importer();
        let json = format!(
            r#"{{ "expensesList": [ {{ "name": "Bad", "creator": {{ "_id": "{DANA}", "name": "Dana" }},
                 "expenses": [ {{ "name": "Refund", "amount": -4, "creator": {{ "_id": "{DANA}", "name": "Dana" }} }} ] }} ] }}"#
        );
        let data = SeedData::from_json_str(&json).unwrap();

        assert!(importer.import(&data).await.is_err());
        assert!(lists.list_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_parse_or_now_falls_back() {
        let before = Utc::now();
        assert!(parse_or_now(Some("garbage")) >= before);
        assert!(parse_or_now(None) >= before);
    }
}
