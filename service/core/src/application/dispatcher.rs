// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Intent Dispatcher
//!
//! Provides the single entry point that turns a recognized intent and its
//! parameter bag into exactly one domain operation and one envelope.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Route intents, enforce required slots and caller identity,
//!   trigger notification fan-out, shape the response
//!
//! # Stages
//!
//! ```text
//! Received -> Resolving -> Invoking -> Responded
//!                      \-> Rejected -/
//! ```
//!
//! Rejection (unknown intent, missing caller, missing slots) happens before
//! any operation is invoked. Operation failures are reported from `Invoking`.

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::application::envelope::ResponseEnvelope;
use crate::application::error::DispatchError;
use crate::application::expense_operations::ExpenseOperations;
use crate::application::list_operations::ListOperations;
use crate::application::notification_emitter::{Change, NotificationEmitter};
use crate::application::parameter_resolver::{
    resolve, resolve_optional, ResolvedParams, ResolvedValue, SlotSpec,
};
use crate::domain::expense::{ExpenseId, ExpensePatch};
use crate::domain::expenses_list::ListId;
use crate::domain::intent::{IntentName, ParameterBag, RecognizedIntent};
use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Received,
    Resolving,
    Invoking,
    Rejected,
    Responded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid dispatch transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: DispatchStage,
    pub to: DispatchStage,
}

impl DispatchStage {
    pub fn can_advance(self, next: DispatchStage) -> bool {
        use DispatchStage::*;
        matches!(
            (self, next),
            (Received, Resolving)
                | (Resolving, Invoking)
                | (Resolving, Rejected)
                | (Invoking, Responded)
                | (Rejected, Responded)
        )
    }

    pub fn advance(self, next: DispatchStage) -> Result<DispatchStage, InvalidTransition> {
        if self.can_advance(next) {
            Ok(next)
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }

    pub fn is_terminal(self) -> bool {
        self == DispatchStage::Responded
    }
}

struct IntentSlots {
    required: &'static [SlotSpec],
    message: &'static str,
}

const CREATE_LIST_SLOTS: &[SlotSpec] = &[SlotSpec::text("listName")];
const UPDATE_LIST_SLOTS: &[SlotSpec] = &[SlotSpec::id("listId"), SlotSpec::text("newListName")];
const LIST_ID_SLOTS: &[SlotSpec] = &[SlotSpec::id("listId")];
const CREATE_EXPENSE_SLOTS: &[SlotSpec] = &[
    SlotSpec::text("expenseName"),
    SlotSpec::amount("amount"),
    SlotSpec::id("listId"),
];
const UPDATE_EXPENSE_SLOTS: &[SlotSpec] = &[
    SlotSpec::id("expenseId"),
    SlotSpec::text("expenseName"),
    SlotSpec::amount("amount"),
];
const DELETE_EXPENSE_SLOTS: &[SlotSpec] = &[SlotSpec::id("expenseId")];

fn slots_for(intent: &IntentName) -> Option<IntentSlots> {
    let slots = match intent {
        IntentName::CreateList => IntentSlots {
            required: CREATE_LIST_SLOTS,
            message: "List name is required.",
        },
        IntentName::UpdateList => IntentSlots {
            required: UPDATE_LIST_SLOTS,
            message: "List id and new list name are required.",
        },
        IntentName::DeleteList => IntentSlots {
            required: LIST_ID_SLOTS,
            message: "List id is required.",
        },
        IntentName::ReadList => IntentSlots {
            required: &[],
            message: "",
        },
        IntentName::CreateExpense => IntentSlots {
            required: CREATE_EXPENSE_SLOTS,
            message: "Expense name, amount, and list id are required.",
        },
        IntentName::UpdateExpense => IntentSlots {
            required: UPDATE_EXPENSE_SLOTS,
            message: "Expense id, name, and amount are required.",
        },
        IntentName::DeleteExpense => IntentSlots {
            required: DELETE_EXPENSE_SLOTS,
            message: "Expense id is required.",
        },
        IntentName::ReadExpense => IntentSlots {
            required: LIST_ID_SLOTS,
            message: "List id is required.",
        },
        IntentName::Unknown(_) => return None,
    };
    Some(slots)
}

pub struct IntentDispatcher {
    lists: Arc<ListOperations>,
    expenses: Arc<ExpenseOperations>,
    emitter: Arc<NotificationEmitter>,
}

impl IntentDispatcher {
    pub fn new(
        lists: Arc<ListOperations>,
        expenses: Arc<ExpenseOperations>,
        emitter: Arc<NotificationEmitter>,
    ) -> Self {
        Self {
            lists,
            expenses,
            emitter,
        }
    }

    pub async fn dispatch_recognized(
        &self,
        recognized: &RecognizedIntent,
        caller: Option<UserId>,
    ) -> ResponseEnvelope {
        self.dispatch(&recognized.name, &recognized.parameters, caller).await
    }

    /// Dispatch one intent. Never fails: every outcome is an envelope.
    pub async fn dispatch(
        &self,
        intent: &IntentName,
        bag: &ParameterBag,
        caller: Option<UserId>,
    ) -> ResponseEnvelope {
        let started = Instant::now();
        let mut stage = DispatchStage::Received;

        let outcome = self.run(&mut stage, intent, bag, caller).await;
        let envelope = match outcome {
            Ok(envelope) => envelope,
            Err(err) => {
                match &err {
                    DispatchError::Upstream(cause) => {
                        error!(intent = %intent, stage = ?stage, cause = %cause, "Dispatch failed upstream")
                    }
                    other => warn!(intent = %intent, stage = ?stage, error = %other, "Dispatch rejected"),
                }
                ResponseEnvelope::failure(Some(intent), &err)
            }
        };

        match stage.advance(DispatchStage::Responded) {
            Ok(next) => stage = next,
            Err(e) => error!(intent = %intent, error = %e, "Dispatch ended outside the stage machine"),
        }

        let outcome_label = envelope.error.unwrap_or("success");
        info!(
            intent = %intent,
            outcome = outcome_label,
            status = envelope.status,
            terminal = stage.is_terminal(),
            "Dispatched intent"
        );
        metrics::counter!(
            "expensa_dispatch_total",
            "intent" => intent.as_str().to_string(),
            "outcome" => outcome_label
        )
        .increment(1);
        metrics::histogram!("expensa_dispatch_duration_seconds", "intent" => intent.as_str().to_string())
            .record(started.elapsed().as_secs_f64());

        envelope
    }

    async fn run(
        &self,
        stage: &mut DispatchStage,
        intent: &IntentName,
        bag: &ParameterBag,
        caller: Option<UserId>,
    ) -> Result<ResponseEnvelope, DispatchError> {
        *stage = stage.advance(DispatchStage::Resolving).map_err(internal)?;

        let rejected = match self.check(intent, bag, caller) {
            Ok(params) => Ok(params),
            Err(err) => {
                *stage = stage.advance(DispatchStage::Rejected).map_err(internal)?;
                Err(err)
            }
        };
        let (params, caller) = rejected?;

        *stage = stage.advance(DispatchStage::Invoking).map_err(internal)?;
        self.invoke(intent, &params, bag, caller).await
    }

    /// Everything that can reject an intent without touching storage.
    fn check(
        &self,
        intent: &IntentName,
        bag: &ParameterBag,
        caller: Option<UserId>,
    ) -> Result<(ResolvedParams, Option<UserId>), DispatchError> {
        let slots = match slots_for(intent) {
            Some(slots) => slots,
            None => {
                let raw = match intent {
                    IntentName::Unknown(raw) => raw.clone(),
                    other => other.as_str().to_string(),
                };
                return Err(DispatchError::UnknownIntent(raw));
            }
        };

        if intent.is_mutating() && caller.is_none() {
            return Err(DispatchError::Unauthenticated);
        }

        let params = resolve(bag, slots.required).map_err(|missing| DispatchError::Validation {
            message: slots.message.to_string(),
            fields: missing.0,
        })?;
        Ok((params, caller))
    }

    async fn invoke(
        &self,
        intent: &IntentName,
        params: &ResolvedParams,
        bag: &ParameterBag,
        caller: Option<UserId>,
    ) -> Result<ResponseEnvelope, DispatchError> {
        let actor = || caller.ok_or(DispatchError::Unauthenticated);

        match intent {
            IntentName::CreateList => {
                let name = required_text(params, "listName")?;
                let created = self.lists.create(name, actor()?).await?;
                self.notify(&created.change).await;
                let view = self.lists.view(&created.value).await;
                Ok(ResponseEnvelope::message(
                    intent,
                    format!("List \"{}\" created successfully.", created.value.name),
                )
                .with_list(view))
            }
            IntentName::UpdateList => {
                let id = ListId(required_id(params, "listId")?);
                let new_name = required_text(params, "newListName")?;
                let renamed = self.lists.rename(id, new_name, actor()?).await?;
                self.notify(&renamed.change).await;
                let view = self.lists.view(&renamed.value.list).await;
                Ok(ResponseEnvelope::message(
                    intent,
                    format!(
                        "List \"{}\" updated to \"{}\" successfully.",
                        renamed.value.previous_name, renamed.value.list.name
                    ),
                )
                .with_list(view))
            }
            IntentName::DeleteList => {
                let id = ListId(required_id(params, "listId")?);
                let deleted = self.lists.delete(id, actor()?).await?;
                self.notify(&deleted.change).await;
                Ok(ResponseEnvelope::message(
                    intent,
                    format!("List \"{}\" deleted successfully.", deleted.value.list.name),
                )
                .with_list_id(deleted.value.list.id))
            }
            IntentName::ReadList => {
                let lists = self.lists.read_all().await?;
                Ok(ResponseEnvelope::lists(intent, lists))
            }
            IntentName::CreateExpense => {
                let name = required_text(params, "expenseName")?;
                let amount = required_number(params, "amount")?;
                let list_id = ListId(required_id(params, "listId")?);
                let created = self.expenses.create(name, amount, list_id, actor()?).await?;
                self.notify(&created.change).await;
                let expense = self.expenses.view(&created.value.expense).await;
                let list = self.lists.view(&created.value.list).await;
                Ok(ResponseEnvelope::message(
                    intent,
                    format!("Expense \"{}\" created successfully.", created.value.expense.name),
                )
                .with_expense(expense)
                .with_list(list))
            }
            IntentName::UpdateExpense => {
                let id = ExpenseId(required_id(params, "expenseId")?);
                let patch = ExpensePatch {
                    name: Some(required_text(params, "expenseName")?.to_string()),
                    amount: Some(required_number(params, "amount")?),
                };
                let updated = self.expenses.update(id, patch, actor()?).await?;
                self.notify(&updated.change).await;
                let view = self.expenses.view(&updated.value).await;
                Ok(ResponseEnvelope::message(
                    intent,
                    format!("Expense updated to \"{}\" successfully.", updated.value.name),
                )
                .with_expense(view))
            }
            IntentName::DeleteExpense => {
                let id = ExpenseId(required_id(params, "expenseId")?);
                let list_hint = match resolve_optional(bag, SlotSpec::id("listId")) {
                    Some(ResolvedValue::Id(id)) => Some(ListId(id)),
                    _ => None,
                };
                let deleted = self.expenses.delete(id, list_hint, actor()?).await?;
                self.notify(&deleted.change).await;
                Ok(ResponseEnvelope::message(intent, "Expense deleted successfully.")
                    .with_list_id(deleted.value.expense.list_id))
            }
            IntentName::ReadExpense => {
                let list_id = ListId(required_id(params, "listId")?);
                let expenses = self.expenses.read_by_list(list_id).await?;
                Ok(ResponseEnvelope::expenses(intent, expenses))
            }
            IntentName::Unknown(raw) => Err(DispatchError::UnknownIntent(raw.clone())),
        }
    }

    async fn notify(&self, change: &Change) {
        let report = self.emitter.emit_change(change).await;
        if !report.persist_failures.is_empty() || report.publish_failed() {
            warn!(
                kind = %change.kind,
                persist_failures = report.persist_failures.len(),
                publish_failed = report.publish_failed(),
                "Notification fan-out incomplete"
            );
        }
    }
}

fn internal(err: InvalidTransition) -> DispatchError {
    DispatchError::Upstream(err.to_string())
}

fn required_text<'a>(params: &'a ResolvedParams, name: &str) -> Result<&'a str, DispatchError> {
    params.text(name).ok_or_else(|| missing(name))
}

fn required_number(params: &ResolvedParams, name: &str) -> Result<f64, DispatchError> {
    params.number(name).ok_or_else(|| missing(name))
}

fn required_id(params: &ResolvedParams, name: &str) -> Result<uuid::Uuid, DispatchError> {
    params.id(name).ok_or_else(|| missing(name))
}

fn missing(name: &str) -> DispatchError {
    DispatchError::Validation {
        message: format!("{} is required.", name),
        fields: vec![name.to_string()],
    }
}
