// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Conversation session registry
//!
//! One NLU session per caller, created on first contact and dropped after an
//! idle timeout by a background sweeper.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::nlu::NluSession;
use crate::domain::user::UserId;

#[derive(Debug, Clone)]
struct SessionEntry {
    session: NluSession,
    last_seen: Instant,
}

pub struct SessionRegistry {
    sessions: DashMap<UserId, SessionEntry>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    /// The caller's session, refreshed; a new one if absent or expired
    pub fn session_for(&self, user_id: UserId) -> NluSession {
        let now = Instant::now();
        let mut entry = self.sessions.entry(user_id).or_insert_with(|| SessionEntry {
            session: NluSession::new(user_id),
            last_seen: now,
        });
        if now.duration_since(entry.last_seen) > self.idle_timeout {
            debug!(user_id = %user_id, "Session expired, starting a new one");
            entry.session = NluSession::new(user_id);
        }
        entry.last_seen = now;
        let session = entry.session.clone();
        drop(entry);

        self.record_gauge();
        session
    }

    /// Drop sessions idle for longer than the timeout as of `now`
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= self.idle_timeout);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!("Evicted {} idle conversation sessions", removed);
        }
        self.record_gauge();
        removed
    }

    pub fn remove(&self, user_id: &UserId) -> bool {
        let removed = self.sessions.remove(user_id).is_some();
        self.record_gauge();
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn record_gauge(&self) {
        metrics::gauge!("expensa_nlu_sessions_active").set(self.sessions.len() as f64);
    }

    /// Run `sweep_expired` every `interval` until the handle is aborted
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.sweep_expired(Instant::now());
            }
        })
    }
}
