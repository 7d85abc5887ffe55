// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0
//! User directory
//!
//! Lazily materializes users referenced as creators and resolves their live
//! display fields for read views.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::application::error::{within, DispatchError};
use crate::domain::repository::UserRepository;
use crate::domain::user::{generate_auth0_id, CreatorProfile, User, UserId};

pub struct UserDirectory {
    users: Arc<dyn UserRepository>,
    default_auth0_id: Option<String>,
    timeout: Duration,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserRepository>, timeout: Duration) -> Self {
        Self {
            users,
            default_auth0_id: None,
            timeout,
        }
    }

    /// External-auth id given to users created without one
    pub fn with_default_auth0_id(mut self, auth0_id: Option<String>) -> Self {
        self.default_auth0_id = auth0_id.filter(|s| !s.is_empty());
        self
    }

    /// Return the user with `id`, creating it atomically if absent.
    ///
    /// `profile` only seeds a newly created user; an existing user keeps its
    /// stored display fields.
    pub async fn ensure(
        &self,
        id: UserId,
        profile: Option<CreatorProfile>,
        auth0_id: Option<String>,
    ) -> Result<User, DispatchError> {
        let profile = profile.unwrap_or_else(|| placeholder_profile(id));
        let auth0_id = auth0_id
            .or_else(|| self.default_auth0_id.clone())
            .unwrap_or_else(generate_auth0_id);
        let candidate = User::new(id, profile, auth0_id);

        let (user, created) =
            within(self.timeout, "user upsert", self.users.upsert_if_absent(&candidate)).await?;
        if created {
            tracing::info!(user_id = %id, "Created user on first reference");
        }
        Ok(user)
    }

    /// Live users for a set of ids; unknown ids are absent from the map
    pub async fn lookup(&self, ids: &[UserId]) -> Result<HashMap<UserId, User>, DispatchError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut unique = ids.to_vec();
        unique.sort();
        unique.dedup();

        let users = within(self.timeout, "user lookup", self.users.find_many(&unique)).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    /// Like `lookup`, but a failed lookup yields an empty map so views fall
    /// back to the creator fields denormalized on the entity.
    pub async fn lookup_or_denormalized(&self, ids: &[UserId]) -> HashMap<UserId, User> {
        match self.lookup(ids).await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(error = %e, "Creator lookup failed, using stored display fields");
                HashMap::new()
            }
        }
    }
}

fn placeholder_profile(id: UserId) -> CreatorProfile {
    let short: String = id.to_string().chars().take(8).collect();
    CreatorProfile::new(format!("user-{}", short), "")
}
