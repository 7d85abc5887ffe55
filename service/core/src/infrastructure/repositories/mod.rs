// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository traits defined in
//! `crate::domain::repository`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve domain aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresUserRepository** - `users` table, insert-if-absent upsert
//! - **PostgresExpensesListRepository** - `expenses_lists` table with the
//!   expense reference index stored as a `UUID[]`
//! - **PostgresExpenseRepository** - `expenses` table keyed by `list_id`
//! - **PostgresNotificationRepository** - `notifications` table
//!
//! ## In-Memory Repositories
//!
//! `parking_lot::RwLock<HashMap>` backed storage, the default backend and the
//! one every test runs against. Each method holds the lock for a single
//! aggregate write, which gives the per-document atomicity the domain needs.

pub mod postgres_user;
pub mod postgres_expenses_list;
pub mod postgres_expense;
pub mod postgres_notification;

pub use postgres_expense::PostgresExpenseRepository;
pub use postgres_expenses_list::PostgresExpensesListRepository;
pub use postgres_notification::PostgresNotificationRepository;
pub use postgres_user::PostgresUserRepository;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::expense::{Expense, ExpenseId, ExpensePatch};
use crate::domain::expenses_list::{ExpensesList, ListId};
use crate::domain::notification::{Notification, NotificationId};
use crate::domain::repository::{
    ExpenseRepository, ExpensesListRepository, NotificationRepository, RepositoryError,
    UserRepository,
};
use crate::domain::user::{User, UserId};

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.read();
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn upsert_if_absent(&self, user: &User) -> Result<(User, bool), RepositoryError> {
        let mut users = self.users.write();
        if let Some(existing) = users.get(&user.id) {
            return Ok((existing.clone(), false));
        }
        users.insert(user.id, user.clone());
        Ok((user.clone(), true))
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.users.read().len())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryExpensesListRepository {
    lists: Arc<RwLock<HashMap<ListId, ExpensesList>>>,
}

impl InMemoryExpensesListRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify<F>(&self, id: ListId, f: F) -> Option<ExpensesList>
    where
        F: FnOnce(&mut ExpensesList),
    {
        let mut lists = self.lists.write();
        let list = lists.get_mut(&id)?;
        f(list);
        Some(list.clone())
    }
}

#[async_trait]
impl ExpensesListRepository for InMemoryExpensesListRepository {
    async fn save(&self, list: &ExpensesList) -> Result<(), RepositoryError> {
        self.lists.write().insert(list.id, list.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ListId) -> Result<Option<ExpensesList>, RepositoryError> {
        Ok(self.lists.read().get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ExpensesList>, RepositoryError> {
        let mut lists: Vec<ExpensesList> = self.lists.read().values().cloned().collect();
        lists.sort_by_key(|l| l.created_at);
        Ok(lists)
    }

    async fn rename(&self, id: ListId, name: &str) -> Result<Option<ExpensesList>, RepositoryError> {
        Ok(self.modify(id, |list| list.rename(name)))
    }

    async fn push_expense(
        &self,
        id: ListId,
        expense_id: ExpenseId,
    ) -> Result<Option<ExpensesList>, RepositoryError> {
        Ok(self.modify(id, |list| {
            list.push_expense(expense_id);
        }))
    }

    async fn pull_expense(
        &self,
        id: ListId,
        expense_id: ExpenseId,
    ) -> Result<Option<ExpensesList>, RepositoryError> {
        Ok(self.modify(id, |list| {
            list.pull_expense(expense_id);
        }))
    }

    async fn delete(&self, id: ListId) -> Result<Option<ExpensesList>, RepositoryError> {
        Ok(self.lists.write().remove(&id))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryExpenseRepository {
    expenses: Arc<RwLock<HashMap<ExpenseId, Expense>>>,
}

impl InMemoryExpenseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExpenseRepository for InMemoryExpenseRepository {
    async fn save(&self, expense: &Expense) -> Result<(), RepositoryError> {
        self.expenses.write().insert(expense.id, expense.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ExpenseId) -> Result<Option<Expense>, RepositoryError> {
        Ok(self.expenses.read().get(&id).cloned())
    }

    async fn find_by_list(&self, list_id: ListId) -> Result<Vec<Expense>, RepositoryError> {
        let mut found: Vec<Expense> = self
            .expenses
            .read()
            .values()
            .filter(|e| e.list_id == list_id)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.created_at);
        Ok(found)
    }

    async fn list_all(&self) -> Result<Vec<Expense>, RepositoryError> {
        let mut all: Vec<Expense> = self.expenses.read().values().cloned().collect();
        all.sort_by_key(|e| e.created_at);
        Ok(all)
    }

    async fn update(
        &self,
        id: ExpenseId,
        patch: &ExpensePatch,
    ) -> Result<Option<Expense>, RepositoryError> {
        let mut expenses = self.expenses.write();
        match expenses.get_mut(&id) {
            Some(expense) => {
                expense.apply(patch)?;
                Ok(Some(expense.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: ExpenseId) -> Result<Option<Expense>, RepositoryError> {
        Ok(self.expenses.write().remove(&id))
    }

    async fn delete_by_list(&self, list_id: ListId) -> Result<usize, RepositoryError> {
        let mut expenses = self.expenses.write();
        let before = expenses.len();
        expenses.retain(|_, e| e.list_id != list_id);
        Ok(before - expenses.len())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<RwLock<HashMap<NotificationId, Notification>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notifications.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.read().is_empty()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn save(&self, notification: &Notification) -> Result<(), RepositoryError> {
        self.notifications
            .write()
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Notification>, RepositoryError> {
        let mut found: Vec<Notification> = self
            .notifications
            .read()
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(found)
    }

    async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        let mut notifications = self.notifications.write();
        match notifications.get_mut(&id) {
            Some(n) if n.user_id == user_id => {
                n.mark_read();
                Ok(Some(n.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::CreatorProfile;

    #[tokio::test]
    async fn test_upsert_if_absent_keeps_first() {
        let repo = InMemoryUserRepository::new();
        let id = UserId::new();
        let first = User::new(id, CreatorProfile::new("Dana", ""), "1111111111");
        let second = User::new(id, CreatorProfile::new("Eli", ""), "2222222222");

        let (stored, created) = repo.upsert_if_absent(&first).await.unwrap();
        assert!(created);
        assert_eq!(stored.name, "Dana");

        let (stored, created) = repo.upsert_if_absent(&second).await.unwrap();
        assert!(!created);
        assert_eq!(stored.name, "Dana");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_create_one_user() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let id = UserId::new();
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    let user = User::new(id, CreatorProfile::new(format!("u{}", i), ""), "1234567890");
                    repo.upsert_if_absent(&user).await.unwrap().1
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_index_mutations() {
        let repo = InMemoryExpensesListRepository::new();
        let list = ExpensesList::new("Trip", UserId::new(), CreatorProfile::default());
        repo.save(&list).await.unwrap();

        let e = ExpenseId::new();
        let updated = repo.push_expense(list.id, e).await.unwrap().unwrap();
        assert_eq!(updated.expenses, vec![e]);
        let updated = repo.pull_expense(list.id, e).await.unwrap().unwrap();
        assert!(updated.expenses.is_empty());

        assert!(repo.push_expense(ListId::new(), e).await.unwrap().is_none());
        assert!(repo.delete(list.id).await.unwrap().is_some());
        assert!(repo.delete(list.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_negative_amount() {
        let repo = InMemoryExpenseRepository::new();
        let expense = Expense::new("Lunch", 3.0, ListId::new(), UserId::new(), CreatorProfile::default()).unwrap();
        repo.save(&expense).await.unwrap();

        let result = repo
            .update(expense.id, &ExpensePatch { name: None, amount: Some(-1.0) })
            .await;
        assert!(matches!(result, Err(RepositoryError::Constraint(_))));
        assert!(repo
            .update(ExpenseId::new(), &ExpensePatch::default())
            .await
            .unwrap()
            .is_none());
    }
}
