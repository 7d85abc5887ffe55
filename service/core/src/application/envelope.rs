// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Response Envelope Builder
//!
//! Every dispatch outcome is rendered as one JSON shape:
//!
//! ```json
//! { "response": "List \"Trip\" created successfully.", "intent": "create_list", "list": { ... } }
//! ```
//!
//! `response` is either a confirmation string or, for read intents, the
//! collection itself. The HTTP status travels out of band in `status`.

use serde::Serialize;

use crate::application::error::DispatchError;
use crate::application::views::{ExpenseView, ListView};
use crate::domain::expenses_list::ListId;
use crate::domain::intent::IntentName;

/// Generic text for every upstream failure; the cause is only logged.
pub const UPSTREAM_MESSAGE: &str = "Error in Dialogflow request.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Message(String),
    Lists(Vec<ListView>),
    Expenses(Vec<ExpenseView>),
}

impl ResponseBody {
    pub fn as_message(&self) -> Option<&str> {
        match self {
            Self::Message(m) => Some(m.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    #[serde(skip)]
    pub status: u16,

    pub response: ResponseBody,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<ListView>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<ListId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense: Option<ExpenseView>,

    /// Machine-readable failure code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,

    /// Slots that failed validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
}

impl ResponseEnvelope {
    fn base(status: u16, response: ResponseBody, intent: Option<&IntentName>) -> Self {
        Self {
            status,
            response,
            intent: intent.filter(|i| i.is_known()).map(|i| i.as_str().to_string()),
            list: None,
            list_id: None,
            expense: None,
            error: None,
            missing: None,
        }
    }

    pub fn message(intent: &IntentName, message: impl Into<String>) -> Self {
        Self::base(200, ResponseBody::Message(message.into()), Some(intent))
    }

    pub fn lists(intent: &IntentName, lists: Vec<ListView>) -> Self {
        Self::base(200, ResponseBody::Lists(lists), Some(intent))
    }

    pub fn expenses(intent: &IntentName, expenses: Vec<ExpenseView>) -> Self {
        Self::base(200, ResponseBody::Expenses(expenses), Some(intent))
    }

    pub fn with_list(mut self, list: ListView) -> Self {
        self.list = Some(list);
        self
    }

    pub fn with_list_id(mut self, list_id: ListId) -> Self {
        self.list_id = Some(list_id);
        self
    }

    pub fn with_expense(mut self, expense: ExpenseView) -> Self {
        self.expense = Some(expense);
        self
    }

    /// Render a failure. Upstream causes are replaced by a generic message.
    pub fn failure(intent: Option<&IntentName>, err: &DispatchError) -> Self {
        let text = match err {
            DispatchError::Upstream(_) => UPSTREAM_MESSAGE.to_string(),
            DispatchError::UnknownIntent(_) => "Unknown intent.".to_string(),
            other => other.to_string(),
        };
        let mut envelope = Self::base(err.status(), ResponseBody::Message(text), intent);
        envelope.error = Some(err.code());
        if let DispatchError::Validation { fields, .. } = err {
            if !fields.is_empty() {
                envelope.missing = Some(fields.clone());
            }
        }
        envelope
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
