// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Notification Emitter
//!
//! Provides the fan-out that follows every successful mutating operation.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Persist one `Notification` per target user and publish one
//!   event on the push channel
//!
//! Emission runs after the domain write has committed. Neither a failed
//! notification insert nor a failed publish undoes that write; both are
//! logged, counted and reported in `EmitReport`.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::error::{within, DispatchError};
use crate::domain::events::{NotificationCard, PushChannel, PushEvent};
use crate::domain::expense::Expense;
use crate::domain::expenses_list::{ExpensesList, ListId};
use crate::domain::notification::{
    Notification, NotificationDisplay, NotificationId, NotificationKind,
};
use crate::domain::repository::NotificationRepository;
use crate::domain::user::{User, UserId};

/// What a mutating operation changed, captured for notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub kind: NotificationKind,
    pub actor: User,
    pub list_id: ListId,
    pub list_name: String,
    /// Creator of the affected list, when the list still resolves
    pub list_creator: Option<UserId>,
    pub expense_name: Option<String>,
    pub amount: Option<f64>,
}

impl Change {
    pub fn for_list(kind: NotificationKind, actor: &User, list: &ExpensesList) -> Self {
        Self {
            kind,
            actor: actor.clone(),
            list_id: list.id,
            list_name: list.name.clone(),
            list_creator: Some(list.creator),
            expense_name: None,
            amount: None,
        }
    }

    pub fn for_expense(
        kind: NotificationKind,
        actor: &User,
        expense: &Expense,
        list: Option<&ExpensesList>,
    ) -> Self {
        Self {
            kind,
            actor: actor.clone(),
            list_id: expense.list_id,
            list_name: list.map(|l| l.name.clone()).unwrap_or_default(),
            list_creator: list.map(|l| l.creator),
            expense_name: Some(expense.name.clone()),
            amount: Some(expense.amount),
        }
    }

    /// The actor, plus the list creator when that is someone else
    pub fn targets(&self) -> Vec<UserId> {
        let mut targets = vec![self.actor.id];
        if let Some(creator) = self.list_creator {
            if creator != self.actor.id {
                targets.push(creator);
            }
        }
        targets
    }

    pub fn display(&self) -> NotificationDisplay {
        NotificationDisplay {
            avatar_src: self.actor.photo.clone(),
            creator_name: self.actor.name.clone(),
            list_display_name: self.list_name.clone(),
            expense_description: self.expense_name.clone(),
            price: self.amount,
        }
    }
}

/// Result of a mutating operation together with what it changed.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    pub value: T,
    pub change: Change,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitReport {
    /// Notifications written, one per target that succeeded
    pub persisted: Vec<NotificationId>,
    /// Targets whose notification row could not be written
    pub persist_failures: Vec<UserId>,
    /// Subscribers that received the publish, `None` if it failed
    pub delivered: Option<usize>,
}

impl EmitReport {
    pub fn publish_failed(&self) -> bool {
        self.delivered.is_none()
    }
}

pub struct NotificationEmitter {
    repository: Arc<dyn NotificationRepository>,
    push: Arc<dyn PushChannel>,
    timeout: Duration,
}

impl NotificationEmitter {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        push: Arc<dyn PushChannel>,
        timeout: Duration,
    ) -> Self {
        Self {
            repository,
            push,
            timeout,
        }
    }

    pub async fn emit_change(&self, change: &Change) -> EmitReport {
        self.emit(change.kind, change.list_id, &change.targets(), change.display())
            .await
    }

    /// Persist one notification per distinct target, then publish once.
    pub async fn emit(
        &self,
        kind: NotificationKind,
        list_id: ListId,
        targets: &[UserId],
        display: NotificationDisplay,
    ) -> EmitReport {
        let timestamp = Utc::now();
        let mut report = EmitReport::default();

        let mut recipients: Vec<UserId> = Vec::with_capacity(targets.len());
        for target in targets {
            if !recipients.contains(target) {
                recipients.push(*target);
            }
        }

        for target in &recipients {
            let notification = Notification::new(*target, kind, list_id, display.clone(), timestamp);
            match within(self.timeout, "notification save", self.repository.save(&notification)).await {
                Ok(()) => report.persisted.push(notification.id),
                Err(e) => {
                    warn!(user_id = %target, kind = %kind, error = %e, "Failed to persist notification");
                    report.persist_failures.push(*target);
                }
            }
        }
        metrics::counter!("expensa_notifications_emitted_total", "kind" => kind.as_str())
            .increment(report.persisted.len() as u64);

        let card = NotificationCard::new(kind, list_id.to_string(), &display, timestamp);
        match self.push.publish(PushEvent::notification(recipients, card)) {
            Ok(receivers) => {
                debug!(kind = %kind, receivers, "Published notification");
                report.delivered = Some(receivers);
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "Failed to publish notification");
                metrics::counter!("expensa_push_publish_failures_total").increment(1);
            }
        }

        report
    }

    /// Notification feed for a user, newest first
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<NotificationCard>, DispatchError> {
        let notifications =
            within(self.timeout, "notification lookup", self.repository.find_by_user(user_id)).await?;
        Ok(notifications.iter().map(NotificationCard::from).collect())
    }

    /// Flag a user's notification as read. Repeating the call is harmless.
    pub async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<Notification, DispatchError> {
        within(self.timeout, "notification update", self.repository.mark_read(user_id, id))
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("Notification {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::PushError;
    use crate::domain::user::CreatorProfile;
    use crate::infrastructure::event_bus::EventBus;
    use crate::infrastructure::repositories::InMemoryNotificationRepository;

    struct BrokenChannel;

    impl PushChannel for BrokenChannel {
        fn publish(&self, _event: PushEvent) -> Result<usize, PushError> {
            Err(PushError::Unavailable("socket server down".into()))
        }
    }

    fn actor(name: &str) -> User {
        User::new(UserId::new(), CreatorProfile::new(name, format!("{}.png", name)), "1234567890")
    }

    #[test]
    fn test_targets_include_distinct_list_creator() {
        let alice = actor("alice");
        let bob = actor("bob");
        let list = ExpensesList::new("Trip", bob.id, bob.profile());

        let change = Change::for_list(NotificationKind::ListUpdated, &alice, &list);
        assert_eq!(change.targets(), vec![alice.id, bob.id]);

        let own = Change::for_list(NotificationKind::ListUpdated, &bob, &list);
        assert_eq!(own.targets(), vec![bob.id]);
    }

    #[tokio::test]
    async fn test_emit_persists_per_target_and_publishes_once() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let bus = Arc::new(EventBus::new(16));
        let mut rx = bus.subscribe();
        let emitter = NotificationEmitter::new(repo.clone(), bus.clone(), Duration::from_secs(1));

        let alice = actor("alice");
        let bob = actor("bob");
        let list = ExpensesList::new("Trip", bob.id, bob.profile());
        let change = Change::for_list(NotificationKind::ListUpdated, &alice, &list);

        let report = emitter.emit_change(&change).await;
        assert_eq!(report.persisted.len(), 2);
        assert_eq!(report.delivered, Some(1));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.payload.props.list_name, "Trip");
        assert_eq!(event.payload.props.creator_name, "alice");
        assert!(event.concerns(&bob.id));
        assert!(rx.try_recv().is_err());

        let feed = emitter.list_for_user(bob.id).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].props.action, "renamed a list");
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_notification() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let emitter =
            NotificationEmitter::new(repo.clone(), Arc::new(BrokenChannel), Duration::from_secs(1));
        let alice = actor("alice");
        let list = ExpensesList::new("Trip", alice.id, alice.profile());

        let report = emitter
            .emit_change(&Change::for_list(NotificationKind::ListCreated, &alice, &list))
            .await;
        assert!(report.publish_failed());
        assert_eq!(report.persisted.len(), 1);
        assert_eq!(repo.find_by_user(alice.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_scoped_to_owner() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let emitter =
            NotificationEmitter::new(repo, Arc::new(EventBus::new(4)), Duration::from_secs(1));
        let alice = actor("alice");
        let list = ExpensesList::new("Trip", alice.id, alice.profile());
        let report = emitter
            .emit_change(&Change::for_list(NotificationKind::ListCreated, &alice, &list))
            .await;
        let id = report.persisted[0];

        assert!(matches!(
            emitter.mark_read(UserId::new(), id).await,
            Err(DispatchError::NotFound(_))
        ));
        assert!(emitter.mark_read(alice.id, id).await.unwrap().read);
        assert!(emitter.mark_read(alice.id, id).await.unwrap().read);
    }
}
