// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person who creates lists and expenses.
///
/// Users are never created explicitly by the conversational surface: the
/// first list or expense that references an unknown creator id upserts one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub photo: String,
    /// Identifier issued by the external identity provider
    pub auth0_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, profile: CreatorProfile, auth0_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: profile.name,
            photo: profile.photo,
            auth0_id: auth0_id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile(&self) -> CreatorProfile {
        CreatorProfile {
            name: self.name.clone(),
            photo: self.photo.clone(),
        }
    }
}

/// Display fields copied onto lists, expenses and notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorProfile {
    pub name: String,
    pub photo: String,
}

impl CreatorProfile {
    pub fn new(name: impl Into<String>, photo: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            photo: photo.into(),
        }
    }
}

/// Random 10-digit external-auth id used when a user is created without one.
pub fn generate_auth0_id() -> String {
    rand::rng().random_range(1_000_000_000u64..10_000_000_000u64).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_auth0_id_has_ten_digits() {
        for _ in 0..50 {
            let id = generate_auth0_id();
            assert_eq!(id.len(), 10);
            assert!(id.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_user_id_parsing() {
        let id = UserId::new();
        assert_eq!(UserId::from_string(&id.to_string()).unwrap(), id);
        assert!(UserId::from_string("u1").is_err());
    }
}
