// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod conversation;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod expense_operations;
pub mod list_operations;
pub mod notification_emitter;
pub mod parameter_resolver;
pub mod repository_factory;
pub mod seed;
pub mod services;
pub mod users;
pub mod views;

pub use conversation::ConversationService;
pub use dispatcher::{DispatchStage, IntentDispatcher};
pub use envelope::{ResponseBody, ResponseEnvelope};
pub use error::DispatchError;
pub use repository_factory::{create_repositories, Repositories};
pub use services::{ExpensaServices, ServiceSettings};
