// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use expensa_core::application::{ExpensaServices, Repositories, ServiceSettings};
use expensa_core::domain::events::{PushChannel, PushError, PushEvent};
use expensa_core::domain::intent::{ParameterBag, RecognizedIntent};
use expensa_core::domain::nlu::{NluError, NluProvider, NluSession, Utterance};
use expensa_core::domain::repository::{RepositoryError, UserRepository};
use expensa_core::domain::user::{User, UserId};
use expensa_core::infrastructure::nlu::{KeywordNluProvider, SessionRegistry};
use expensa_core::infrastructure::repositories::{
    InMemoryExpenseRepository, InMemoryExpensesListRepository, InMemoryNotificationRepository,
    InMemoryUserRepository,
};
use expensa_core::infrastructure::EventBus;

/// Push channel that always fails, like a socket server that is down
pub struct BrokenChannel;

impl PushChannel for BrokenChannel {
    fn publish(&self, _event: PushEvent) -> Result<usize, PushError> {
        Err(PushError::Unavailable("socket server down".into()))
    }
}

/// User store whose batch lookup always fails; writes go to the inner store
pub struct LookupFailingUsers(pub InMemoryUserRepository);

#[async_trait]
impl UserRepository for LookupFailingUsers {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.0.find_by_id(id).await
    }

    async fn find_many(&self, _ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        Err(RepositoryError::Database("replica unreachable".into()))
    }

    async fn upsert_if_absent(&self, user: &User) -> Result<(User, bool), RepositoryError> {
        self.0.upsert_if_absent(user).await
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        self.0.count().await
    }
}

/// NLU provider that replays one fixed result and counts calls
pub struct ScriptedNlu {
    pub intent: String,
    pub parameters: ParameterBag,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub sessions: parking_lot::Mutex<Vec<String>>,
}

impl ScriptedNlu {
    pub fn new(intent: &str, parameters: ParameterBag) -> Self {
        Self {
            intent: intent.to_string(),
            parameters,
            delay: None,
            calls: AtomicUsize::new(0),
            sessions: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NluProvider for ScriptedNlu {
    async fn detect_intent(
        &self,
        session: &NluSession,
        _utterance: &Utterance,
    ) -> Result<RecognizedIntent, NluError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sessions.lock().push(session.session_id.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(RecognizedIntent::new(&self.intent, self.parameters.clone()))
    }
}

pub struct Harness {
    pub users: InMemoryUserRepository,
    pub lists: InMemoryExpensesListRepository,
    pub expenses: InMemoryExpenseRepository,
    pub notifications: InMemoryNotificationRepository,
    pub bus: EventBus,
    pub sessions: Arc<SessionRegistry>,
    pub services: ExpensaServices,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(None, Arc::new(KeywordNluProvider::new()), ServiceSettings::default())
    }

    /// Harness whose creator lookups fail after every write has succeeded
    pub fn with_failing_user_lookup() -> Self {
        Self::assemble(
            None,
            Arc::new(KeywordNluProvider::new()),
            ServiceSettings::default(),
            true,
        )
    }

    pub fn with_push(push: Arc<dyn PushChannel>) -> Self {
        Self::build(Some(push), Arc::new(KeywordNluProvider::new()), ServiceSettings::default())
    }

    pub fn with_nlu(nlu: Arc<dyn NluProvider>, settings: ServiceSettings) -> Self {
        Self::build(None, nlu, settings)
    }

    fn build(
        push: Option<Arc<dyn PushChannel>>,
        nlu: Arc<dyn NluProvider>,
        settings: ServiceSettings,
    ) -> Self {
        Self::assemble(push, nlu, settings, false)
    }

    fn assemble(
        push: Option<Arc<dyn PushChannel>>,
        nlu: Arc<dyn NluProvider>,
        settings: ServiceSettings,
        failing_lookup: bool,
    ) -> Self {
        let users = InMemoryUserRepository::new();
        let lists = InMemoryExpensesListRepository::new();
        let expenses = InMemoryExpenseRepository::new();
        let notifications = InMemoryNotificationRepository::new();
        let bus = EventBus::new(64);
        let sessions = Arc::new(SessionRegistry::new(Duration::from_secs(1800)));

        let user_store: Arc<dyn UserRepository> = if failing_lookup {
            Arc::new(LookupFailingUsers(users.clone()))
        } else {
            Arc::new(users.clone())
        };
        let repositories = Repositories {
            users: user_store,
            lists: Arc::new(lists.clone()),
            expenses: Arc::new(expenses.clone()),
            notifications: Arc::new(notifications.clone()),
        };
        let push = push.unwrap_or_else(|| Arc::new(bus.clone()) as Arc<dyn PushChannel>);
        let services = ExpensaServices::build(repositories, push, nlu, sessions.clone(), &settings);

        Self {
            users,
            lists,
            expenses,
            notifications,
            bus,
            sessions,
            services,
        }
    }
}
