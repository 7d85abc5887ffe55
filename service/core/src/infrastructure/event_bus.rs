// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - In-process Push Channel
//
// Broadcasts notification events to every connected subscriber using a tokio
// broadcast channel. SSE handlers subscribe here.
//
// Delivery is best-effort: events published while nobody listens are dropped,
// and a subscriber that falls more than `capacity` events behind loses the
// oldest ones.

use crate::domain::events::{PushChannel, PushError, PushEvent};
use crate::domain::user::UserId;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Event bus carrying `PushEvent`s to subscribers
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<PushEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Subscribe to every event
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to events that concern one user
    pub fn subscribe_user(&self, user_id: UserId) -> UserEventReceiver {
        UserEventReceiver {
            receiver: self.sender.subscribe(),
            user_id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Raw receiver for stream adapters
    pub fn raw_subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.sender.subscribe()
    }
}

impl PushChannel for EventBus {
    fn publish(&self, event: PushEvent) -> Result<usize, PushError> {
        debug!("Publishing {} event: {:?}", event.event, event.payload.kind);

        // send() only fails when there are no receivers; that is not an error here
        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
        Ok(receiver_count)
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all push events
pub struct EventReceiver {
    receiver: broadcast::Receiver<PushEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<PushEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<PushEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver filtered to the events that list a given user as recipient
pub struct UserEventReceiver {
    receiver: broadcast::Receiver<PushEvent>,
    user_id: UserId,
}

impl UserEventReceiver {
    pub async fn recv(&mut self) -> Result<PushEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if event.concerns(&self.user_id) {
                return Ok(event);
            }
        }
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
