// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! List operations
//!
//! Create, rename, delete and read expenses lists. Shared by the intent
//! dispatcher and the resource API.

use std::sync::Arc;
use std::time::Duration;

use crate::application::error::{within, DispatchError};
use crate::application::notification_emitter::{Change, Mutation};
use crate::application::users::UserDirectory;
use crate::application::views::ListView;
use crate::domain::expenses_list::{ExpensesList, ListId};
use crate::domain::notification::NotificationKind;
use crate::domain::repository::{ExpenseRepository, ExpensesListRepository};
use crate::domain::user::UserId;

#[derive(Debug, Clone)]
pub struct RenamedList {
    pub previous_name: String,
    pub list: ExpensesList,
}

#[derive(Debug, Clone)]
pub struct DeletedList {
    pub list: ExpensesList,
    /// Expenses keyed to the list that were removed with it
    pub expenses_removed: usize,
}

pub struct ListOperations {
    lists: Arc<dyn ExpensesListRepository>,
    expenses: Arc<dyn ExpenseRepository>,
    users: Arc<UserDirectory>,
    timeout: Duration,
}

impl ListOperations {
    pub fn new(
        lists: Arc<dyn ExpensesListRepository>,
        expenses: Arc<dyn ExpenseRepository>,
        users: Arc<UserDirectory>,
        timeout: Duration,
    ) -> Self {
        Self {
            lists,
            expenses,
            users,
            timeout,
        }
    }

    pub async fn create(&self, name: &str, actor: UserId) -> Result<Mutation<ExpensesList>, DispatchError> {
        let name = non_empty(name, "listName", "List name is required.")?;
        let creator = self.users.ensure(actor, None, None).await?;

        let list = ExpensesList::new(name, creator.id, creator.profile());
        within(self.timeout, "list save", self.lists.save(&list)).await?;
        tracing::info!(list_id = %list.id, user_id = %actor, "Created list");

        let change = Change::for_list(NotificationKind::ListCreated, &creator, &list);
        Ok(Mutation { value: list, change })
    }

    pub async fn rename(
        &self,
        id: ListId,
        new_name: &str,
        actor: UserId,
    ) -> Result<Mutation<RenamedList>, DispatchError> {
        let new_name = non_empty(new_name, "newListName", "New list name is required.")?;
        let existing = self.get(id).await?;
        let actor = self.users.ensure(actor, None, None).await?;

        let list = within(self.timeout, "list rename", self.lists.rename(id, new_name))
            .await?
            .ok_or_else(|| list_not_found(id))?;
        tracing::info!(list_id = %id, "Renamed list");

        let change = Change::for_list(NotificationKind::ListUpdated, &actor, &list);
        Ok(Mutation {
            value: RenamedList {
                previous_name: existing.name,
                list,
            },
            change,
        })
    }

    /// Delete a list and every expense keyed to it
    pub async fn delete(&self, id: ListId, actor: UserId) -> Result<Mutation<DeletedList>, DispatchError> {
        self.get(id).await?;
        let actor = self.users.ensure(actor, None, None).await?;
        let list = within(self.timeout, "list delete", self.lists.delete(id))
            .await?
            .ok_or_else(|| list_not_found(id))?;

        let expenses_removed =
            within(self.timeout, "expense cleanup", self.expenses.delete_by_list(id)).await?;
        tracing::info!(list_id = %id, expenses_removed, "Deleted list");

        let change = Change::for_list(NotificationKind::ListDeleted, &actor, &list);
        Ok(Mutation {
            value: DeletedList {
                list,
                expenses_removed,
            },
            change,
        })
    }

    pub async fn get(&self, id: ListId) -> Result<ExpensesList, DispatchError> {
        within(self.timeout, "list lookup", self.lists.find_by_id(id))
            .await?
            .ok_or_else(|| list_not_found(id))
    }

    pub async fn read_all(&self) -> Result<Vec<ListView>, DispatchError> {
        let lists = within(self.timeout, "list scan", self.lists.list_all()).await?;
        let creators: Vec<UserId> = lists.iter().map(|l| l.creator).collect();
        let users = self.users.lookup(&creators).await?;
        Ok(lists.iter().map(|l| ListView::build(l, &users)).collect())
    }

    /// View of a single list. Never fails: it renders the result of a write
    /// that has already committed.
    pub async fn view(&self, list: &ExpensesList) -> ListView {
        let users = self.users.lookup_or_denormalized(&[list.creator]).await;
        ListView::build(list, &users)
    }
}

pub(crate) fn list_not_found(id: ListId) -> DispatchError {
    DispatchError::NotFound(format!("List {} not found", id))
}

pub(crate) fn non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str, DispatchError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DispatchError::Validation {
            message: message.to_string(),
            fields: vec![field.to_string()],
        });
    }
    Ok(trimmed)
}
