// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Expense operations
//!
//! Create, update, delete and read expenses. The owning list's reference
//! index is maintained with a second write after the expense write.

use std::sync::Arc;
use std::time::Duration;

use crate::application::error::{within, DispatchError};
use crate::application::list_operations::{list_not_found, non_empty};
use crate::application::notification_emitter::{Change, Mutation};
use crate::application::users::UserDirectory;
use crate::application::views::ExpenseView;
use crate::domain::expense::{validate_amount, Expense, ExpenseId, ExpensePatch};
use crate::domain::expenses_list::{ExpensesList, ListId};
use crate::domain::notification::NotificationKind;
use crate::domain::repository::{ExpenseRepository, ExpensesListRepository};
use crate::domain::user::UserId;

#[derive(Debug, Clone)]
pub struct CreatedExpense {
    pub expense: Expense,
    /// The list after the reference was appended
    pub list: ExpensesList,
}

#[derive(Debug, Clone)]
pub struct DeletedExpense {
    pub expense: Expense,
    /// The list the reference was pruned from, if it still resolves
    pub list: Option<ExpensesList>,
}

pub struct ExpenseOperations {
    lists: Arc<dyn ExpensesListRepository>,
    expenses: Arc<dyn ExpenseRepository>,
    users: Arc<UserDirectory>,
    timeout: Duration,
}

impl ExpenseOperations {
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

    /// Create an expense under `list_id`. Nothing is written when the list
    /// does not resolve.
    pub async fn create(
        &self,
        name: &str,
        amount: f64,
        list_id: ListId,
        actor: UserId,
    ) -> Result<Mutation<CreatedExpense>, DispatchError> {
        let name = non_empty(name, "expenseName", "Expense name is required.")?;
        let amount = checked_amount(amount)?;
        let list = within(self.timeout, "list lookup", self.lists.find_by_id(list_id))
            .await?
            .ok_or_else(|| list_not_found(list_id))?;

        let creator = self.users.ensure(actor, None, None).await?;
        let expense = Expense::new(name, amount, list.id, creator.id, creator.profile())
            .map_err(|e| DispatchError::Validation {
                message: e.to_string(),
                fields: vec!["amount".to_string()],
            })?;
        within(self.timeout, "expense save", self.expenses.save(&expense)).await?;

        let list = match within(
            self.timeout,
            "list index append",
            self.lists.push_expense(list.id, expense.id),
        )
        .await?
        {
            Some(updated) => updated,
            None => {
                // List vanished between the lookup and the append.
                tracing::warn!(list_id = %list.id, expense_id = %expense.id, "Expense written without list reference");
                list
            }
        };
        tracing::info!(expense_id = %expense.id, list_id = %list.id, user_id = %actor, "Created expense");

        let change = Change::for_expense(NotificationKind::ExpenseCreated, &creator, &expense, Some(&list));
        Ok(Mutation {
            value: CreatedExpense { expense, list },
            change,
        })
    }

    pub async fn update(
        &self,
        id: ExpenseId,
        patch: ExpensePatch,
        actor: UserId,
    ) -> Result<Mutation<Expense>, DispatchError> {
        let patch = checked_patch(patch)?;
        self.get(id).await?;
        let actor = self.users.ensure(actor, None, None).await?;

        let expense = within(self.timeout, "expense update", self.expenses.update(id, &patch))
            .await?
            .ok_or_else(|| expense_not_found(id))?;
        tracing::info!(expense_id = %id, "Updated expense");

        let list = self.find_list(expense.list_id).await?;
        let change = Change::for_expense(NotificationKind::ExpenseUpdated, &actor, &expense, list.as_ref());
        Ok(Mutation {
            value: expense,
            change,
        })
    }

    /// Delete an expense and prune its reference from the list recorded on
    /// the expense. A `list_hint` naming another list is pruned as well, so a
    /// stale reference there does not survive either.
    pub async fn delete(
        &self,
        id: ExpenseId,
        list_hint: Option<ListId>,
        actor: UserId,
    ) -> Result<Mutation<DeletedExpense>, DispatchError> {
        self.get(id).await?;
        let actor = self.users.ensure(actor, None, None).await?;

        let expense = within(self.timeout, "expense delete", self.expenses.delete(id))
            .await?
            .ok_or_else(|| expense_not_found(id))?;

        let owning = expense.list_id;
        let list = within(
            self.timeout,
            "list index prune",
            self.lists.pull_expense(owning, expense.id),
        )
        .await?;
        if let Some(hint) = list_hint.filter(|hint| *hint != owning) {
            tracing::warn!(expense_id = %id, list_id = %owning, hinted = %hint, "Delete hint names a different list");
            within(
                self.timeout,
                "list index prune",
                self.lists.pull_expense(hint, expense.id),
            )
            .await?;
        }
        tracing::info!(expense_id = %id, list_id = %owning, "Deleted expense");

        let change = Change::for_expense(NotificationKind::ExpenseDeleted, &actor, &expense, list.as_ref());
        Ok(Mutation {
            value: DeletedExpense { expense, list },
            change,
        })
    }

    pub async fn get(&self, id: ExpenseId) -> Result<Expense, DispatchError> {
        within(self.timeout, "expense lookup", self.expenses.find_by_id(id))
            .await?
            .ok_or_else(|| expense_not_found(id))
    }

    /// View of a single expense; see `ListOperations::view`
    pub async fn view(&self, expense: &Expense) -> ExpenseView {
        let users = self.users.lookup_or_denormalized(&[expense.creator]).await;
        ExpenseView::build(expense, &users)
    }

    /// Expenses keyed to a list; an unknown list yields an empty result
    pub async fn read_by_list(&self, list_id: ListId) -> Result<Vec<ExpenseView>, DispatchError> {
        let expenses = within(self.timeout, "expense scan", self.expenses.find_by_list(list_id)).await?;
        self.views(&expenses).await
    }

    pub async fn read_all(&self) -> Result<Vec<ExpenseView>, DispatchError> {
        let expenses = within(self.timeout, "expense scan", self.expenses.list_all()).await?;
        self.views(&expenses).await
    }

    async fn views(&self, expenses: &[Expense]) -> Result<Vec<ExpenseView>, DispatchError> {
        let creators: Vec<UserId> = expenses.iter().map(|e| e.creator).collect();
        let users = self.users.lookup(&creators).await?;
        Ok(expenses.iter().map(|e| ExpenseView::build(e, &users)).collect())
    }

    async fn find_list(&self, id: ListId) -> Result<Option<ExpensesList>, DispatchError> {
        within(self.timeout, "list lookup", self.lists.find_by_id(id)).await
    }
}

fn expense_not_found(id: ExpenseId) -> DispatchError {
    DispatchError::NotFound(format!("Expense {} not found", id))
}

fn checked_amount(amount: f64) -> Result<f64, DispatchError> {
    validate_amount(amount).map_err(|e| DispatchError::Validation {
        message: e.to_string(),
        fields: vec!["amount".to_string()],
    })
}

fn checked_patch(patch: ExpensePatch) -> Result<ExpensePatch, DispatchError> {
    if patch.name.is_none() && patch.amount.is_none() {
        return Err(DispatchError::Validation {
            message: "Nothing to update.".to_string(),
            fields: vec!["expenseName".to_string(), "amount".to_string()],
        });
    }
    let name = match patch.name {
        Some(name) => Some(non_empty(&name, "expenseName", "Expense name is required.")?.to_string()),
        None => None,
    };
    let amount = patch.amount.map(checked_amount).transpose()?;
    Ok(ExpensePatch { name, amount })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::{
        InMemoryExpenseRepository, InMemoryExpensesListRepository, InMemoryUserRepository,
    };
    use crate::domain::user::CreatorProfile;

    struct Fixture {
        ops: ExpenseOperations,
        lists: Arc<InMemoryExpensesListRepository>,
        expenses: Arc<InMemoryExpenseRepository>,
    }

    fn fixture() -> Fixture {
        let lists = Arc::new(InMemoryExpensesListRepository::new());
        let expenses = Arc::new(InMemoryExpenseRepository::new());
        let timeout = Duration::from_secs(1);
        let users = Arc::new(UserDirectory::new(Arc::new(InMemoryUserRepository::new()), timeout));
        let ops = ExpenseOperations::new(lists.clone(), expenses.clone(), users, timeout);
        Fixture { ops, lists, expenses }
    }

    async fn seeded_list(f: &Fixture) -> ExpensesList {
        let list = ExpensesList::new("Trip", UserId::new(), CreatorProfile::new("Dana", ""));
        f.lists.save(&list).await.unwrap();
        list
    }

    #[tokio::test]
    async fn test_create_appends_reference() {
        let f = fixture();
        let list = seeded_list(&f).await;

        let created = f.ops.create("Lunch", 12.5, list.id, UserId::new()).await.unwrap();
        assert_eq!(created.value.expense.amount, 12.5);
        assert_eq!(created.value.list.expenses, vec![created.value.expense.id]);
        assert_eq!(created.change.list_name, "Trip");
        assert_eq!(created.change.targets().len(), 2);
    }

    #[tokio::test]
    async fn test_create_under_unknown_list_writes_nothing() {
        let f = fixture();
        let err = f.ops.create("Lunch", 1.0, ListId::new(), UserId::new()).await.unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
        assert!(f.expenses.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let f = fixture();
        let list = seeded_list(&f).await;
        let err = f.ops.create("Refund", -5.0, list.id, UserId::new()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Validation { ref fields, .. } if fields == &["amount"]));
    }

    #[tokio::test]
    async fn test_delete_prunes_only_that_reference() {
        let f = fixture();
        let list = seeded_list(&f).await;
        let actor = UserId::new();
        let a = f.ops.create("A", 1.0, list.id, actor).await.unwrap().value.expense;
        let b = f.ops.create("B", 2.0, list.id, actor).await.unwrap().value.expense;
        let c = f.ops.create("C", 3.0, list.id, actor).await.unwrap().value.expense;

        let deleted = f.ops.delete(b.id, Some(list.id), actor).await.unwrap();
        assert_eq!(deleted.value.list.unwrap().expenses, vec![a.id, c.id]);

        assert!(matches!(
            f.ops.delete(b.id, Some(list.id), actor).await,
            Err(DispatchError::NotFound(_))
        ));
        let stored = f.lists.find_by_id(list.id).await.unwrap().unwrap();
        assert_eq!(stored.expenses, vec![a.id, c.id]);
    }

    #[tokio::test]
    async fn test_delete_with_wrong_hint_still_prunes_owning_list() {
        let f = fixture();
        let owning = seeded_list(&f).await;
        let other = seeded_list(&f).await;
        let actor = UserId::new();
        let expense = f.ops.create("Lunch", 9.0, owning.id, actor).await.unwrap().value.expense;

        let deleted = f.ops.delete(expense.id, Some(other.id), actor).await.unwrap();
        assert_eq!(deleted.value.list.map(|l| l.id), Some(owning.id));

        let stored = f.lists.find_by_id(owning.id).await.unwrap().unwrap();
        assert!(stored.expenses.is_empty());
        let untouched = f.lists.find_by_id(other.id).await.unwrap().unwrap();
        assert!(untouched.expenses.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let f = fixture();
        let list = seeded_list(&f).await;
        let actor = UserId::new();
        let expense = f.ops.create("Lunch", 10.0, list.id, actor).await.unwrap().value.expense;

        let updated = f
            .ops
            .update(expense.id, ExpensePatch { name: None, amount: Some(14.0) }, actor)
            .await
            .unwrap();
        assert_eq!(updated.value.name, "Lunch");
        assert_eq!(updated.value.amount, 14.0);
        assert!(updated.value.updated_at >= expense.updated_at);

        let err = f
            .ops
            .update(expense.id, ExpensePatch::default(), actor)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_read_by_list() {
        let f = fixture();
        let list = seeded_list(&f).await;
        let actor = UserId::new();
        f.ops.create("Lunch", 10.0, list.id, actor).await.unwrap();

        assert_eq!(f.ops.read_by_list(list.id).await.unwrap().len(), 1);
        assert!(f.ops.read_by_list(ListId::new()).await.unwrap().is_empty());
    }
}
