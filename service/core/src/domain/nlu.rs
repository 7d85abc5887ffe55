// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Nlu
//!
//! Provides the natural-language understanding port.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption layer between the dispatcher and the
//!   external intent-classification vendor

// Implementations live in infrastructure/nlu/.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::intent::RecognizedIntent;
use crate::domain::user::UserId;

/// Free text typed by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub user_id: UserId,
}

impl Utterance {
    pub fn new(text: impl Into<String>, user_id: UserId) -> Self {
        Self {
            text: text.into(),
            user_id,
        }
    }
}

/// Conversation handle bound to exactly one caller.
///
/// The provider keeps slot-filling context per `session_id`, so two callers
/// must never share one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NluSession {
    pub session_id: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl NluSession {
    pub fn new(user_id: UserId) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            created_at: Utc::now(),
        }
    }
}

/// Domain interface for NLU providers
#[async_trait]
pub trait NluProvider: Send + Sync {
    /// Classify an utterance within the caller's conversation session
    async fn detect_intent(
        &self,
        session: &NluSession,
        utterance: &Utterance,
    ) -> Result<RecognizedIntent, NluError>;

    /// Check if provider is reachable
    async fn health_check(&self) -> Result<(), NluError> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NluError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("No intent matched")]
    NoMatch,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),
}
