// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Dispatch error taxonomy
//!
//! Every failure reachable from a dispatch or a resource call collapses into
//! one of six kinds, each with a fixed envelope status.

use std::future::Future;
use std::time::Duration;

use crate::domain::nlu::NluError;
use crate::domain::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// One or more inputs were absent or malformed. `fields` names them.
    #[error("{message}")]
    Validation { message: String, fields: Vec<String> },

    #[error("{0}")]
    NotFound(String),

    #[error("Caller identity is required")]
    Unauthenticated,

    /// Persistence, NLU or timeout failure. The text is only logged.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    /// The NLU provider answered but recognized nothing in the utterance
    #[error("No intent matched.")]
    NoMatch,
}

impl DispatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Short machine-readable code carried in the envelope's `error` field
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound(_) => "not_found",
            Self::Unauthenticated => "unauthenticated",
            Self::Upstream(_) => "upstream",
            Self::UnknownIntent(_) => "unknown_intent",
            Self::NoMatch => "no_match",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::UnknownIntent(_) | Self::NoMatch => 400,
            Self::Unauthenticated => 401,
            Self::NotFound(_) => 404,
            Self::Upstream(_) => 500,
        }
    }
}

impl From<RepositoryError> for DispatchError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => DispatchError::NotFound(what),
            RepositoryError::Constraint(msg) => DispatchError::validation(msg),
            other => DispatchError::Upstream(other.to_string()),
        }
    }
}

impl From<NluError> for DispatchError {
    fn from(err: NluError) -> Self {
        match err {
            NluError::NoMatch => DispatchError::NoMatch,
            other => DispatchError::Upstream(other.to_string()),
        }
    }
}

/// Await `fut` for at most `limit`; expiry becomes `Upstream`.
pub async fn within<T, E, F>(limit: Duration, what: &str, fut: F) -> Result<T, DispatchError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<DispatchError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(DispatchError::Upstream(format!(
            "{} timed out after {} ms",
            what,
            limit.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        let cases = [
            (DispatchError::validation("x"), 400, "validation"),
            (DispatchError::UnknownIntent("frobnicate".into()), 400, "unknown_intent"),
            (DispatchError::Unauthenticated, 401, "unauthenticated"),
            (DispatchError::NotFound("x".into()), 404, "not_found"),
            (DispatchError::Upstream("x".into()), 500, "upstream"),
            (DispatchError::NoMatch, 400, "no_match"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_repository_error_conversion() {
        let not_found: DispatchError = RepositoryError::NotFound("list".into()).into();
        assert!(matches!(not_found, DispatchError::NotFound(_)));

        let db: DispatchError = RepositoryError::Database("connection reset".into()).into();
        assert!(matches!(db, DispatchError::Upstream(_)));
    }

    #[test]
    fn test_nlu_error_conversion() {
        let no_match: DispatchError = NluError::NoMatch.into();
        assert!(matches!(no_match, DispatchError::NoMatch));

        let auth: DispatchError = NluError::Authentication("403".into()).into();
        assert!(matches!(auth, DispatchError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_within_maps_expiry_to_upstream() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, RepositoryError>(())
        };
        let err = within(Duration::from_millis(10), "save list", slow)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Upstream(ref m) if m.contains("save list")));
    }
}
