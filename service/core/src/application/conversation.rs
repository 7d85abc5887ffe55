// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Conversation Service
//!
//! Provides the chat front door: utterance in, envelope out.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Bind the caller to its NLU session, classify the utterance
//!   under a timeout, hand the recognized intent to the dispatcher

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::application::dispatcher::IntentDispatcher;
use crate::application::envelope::ResponseEnvelope;
use crate::application::error::{within, DispatchError};
use crate::domain::nlu::{NluProvider, Utterance};
use crate::domain::user::UserId;
use crate::infrastructure::nlu::SessionRegistry;

pub struct ConversationService {
    nlu: Arc<dyn NluProvider>,
    sessions: Arc<SessionRegistry>,
    dispatcher: Arc<IntentDispatcher>,
    nlu_timeout: Duration,
}

impl ConversationService {
    pub fn new(
        nlu: Arc<dyn NluProvider>,
        sessions: Arc<SessionRegistry>,
        dispatcher: Arc<IntentDispatcher>,
        nlu_timeout: Duration,
    ) -> Self {
        Self {
            nlu,
            sessions,
            dispatcher,
            nlu_timeout,
        }
    }

    /// Handle one chat message from an optional, not yet validated caller id
    pub async fn handle(&self, message: &str, user_id: Option<&str>) -> ResponseEnvelope {
        let message = message.trim();
        if message.is_empty() {
            return ResponseEnvelope::failure(
                None,
                &DispatchError::Validation {
                    message: "Message is required.".to_string(),
                    fields: vec!["message".to_string()],
                },
            );
        }

        let caller = match user_id.map(str::trim).filter(|s| !s.is_empty()) {
            None => return ResponseEnvelope::failure(None, &DispatchError::Unauthenticated),
            Some(raw) => match UserId::from_string(raw) {
                Ok(id) => id,
                Err(_) => {
                    return ResponseEnvelope::failure(
                        None,
                        &DispatchError::Validation {
                            message: "userId must be a UUID.".to_string(),
                            fields: vec!["userId".to_string()],
                        },
                    )
                }
            },
        };

        self.handle_utterance(Utterance::new(message, caller)).await
    }

    pub async fn handle_utterance(&self, utterance: Utterance) -> ResponseEnvelope {
        let session = self.sessions.session_for(utterance.user_id);
        debug!(user_id = %utterance.user_id, session = %session.session_id, "Classifying utterance");

        let recognized = match within(
            self.nlu_timeout,
            "intent detection",
            self.nlu.detect_intent(&session, &utterance),
        )
        .await
        {
            Ok(recognized) => recognized,
            Err(err) => {
                match &err {
                    DispatchError::Upstream(cause) => {
                        error!(user_id = %utterance.user_id, cause = %cause, "Intent detection failed")
                    }
                    other => warn!(user_id = %utterance.user_id, error = %other, "Intent detection rejected"),
                }
                metrics::counter!(
                    "expensa_dispatch_total",
                    "intent" => "none",
                    "outcome" => err.code()
                )
                .increment(1);
                return ResponseEnvelope::failure(None, &err);
            }
        };

        self.dispatcher
            .dispatch_recognized(&recognized, Some(utterance.user_id))
            .await
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }
}
