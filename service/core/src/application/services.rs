// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Application service wiring
//!
//! Builds the operation services once and shares them between the chat
//! dispatcher and the resource API so both surfaces run the same code.

use std::sync::Arc;
use std::time::Duration;

use crate::application::conversation::ConversationService;
use crate::application::dispatcher::IntentDispatcher;
use crate::application::expense_operations::ExpenseOperations;
use crate::application::list_operations::ListOperations;
use crate::application::notification_emitter::NotificationEmitter;
use crate::application::repository_factory::Repositories;
use crate::application::users::UserDirectory;
use crate::domain::events::PushChannel;
use crate::domain::nlu::NluProvider;
use crate::domain::service_config::ServiceConfig;
use crate::infrastructure::nlu::SessionRegistry;

/// Timeouts and defaults the services are built with
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub persistence_timeout: Duration,
    pub nlu_timeout: Duration,
    pub default_auth0_id: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            persistence_timeout: Duration::from_millis(5000),
            nlu_timeout: Duration::from_millis(10000),
            default_auth0_id: None,
        }
    }
}

impl ServiceSettings {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            persistence_timeout: config.spec.timeouts.persistence(),
            nlu_timeout: config.spec.timeouts.nlu(),
            default_auth0_id: config.spec.seed.auth0_id.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ExpensaServices {
    pub repositories: Repositories,
    pub users: Arc<UserDirectory>,
    pub lists: Arc<ListOperations>,
    pub expenses: Arc<ExpenseOperations>,
    pub emitter: Arc<NotificationEmitter>,
    pub dispatcher: Arc<IntentDispatcher>,
    pub conversation: Arc<ConversationService>,
}

impl ExpensaServices {
    pub fn build(
        repositories: Repositories,
        push: Arc<dyn PushChannel>,
        nlu: Arc<dyn NluProvider>,
        sessions: Arc<SessionRegistry>,
        settings: &ServiceSettings,
    ) -> Self {
        let timeout = settings.persistence_timeout;
        let users = Arc::new(
            UserDirectory::new(repositories.users.clone(), timeout)
                .with_default_auth0_id(settings.default_auth0_id.clone()),
        );
        let lists = Arc::new(ListOperations::new(
            repositories.lists.clone(),
            repositories.expenses.clone(),
            users.clone(),
            timeout,
        ));
        let expenses = Arc::new(ExpenseOperations::new(
            repositories.lists.clone(),
            repositories.expenses.clone(),
            users.clone(),
            timeout,
        ));
        let emitter = Arc::new(NotificationEmitter::new(
            repositories.notifications.clone(),
            push,
            timeout,
        ));
        let dispatcher = Arc::new(IntentDispatcher::new(
            lists.clone(),
            expenses.clone(),
            emitter.clone(),
        ));
        let conversation = Arc::new(ConversationService::new(
            nlu,
            sessions,
            dispatcher.clone(),
            settings.nlu_timeout,
        ));

        Self {
            repositories,
            users,
            lists,
            expenses,
            emitter,
            dispatcher,
            conversation,
        }
    }
}
