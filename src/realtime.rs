//! Per-user change feed. Handlers publish after a write commits; each
//! websocket holds a [`Subscription`] that only yields its own user's events.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::models::habit_log::LogStatus;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    SignedIn,
    Refreshed,
    SignedOut,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    HabitCreated {
        habit_id: Uuid,
    },
    HabitUpdated {
        habit_id: Uuid,
    },
    HabitDeleted {
        habit_id: Uuid,
    },
    LogUpserted {
        habit_id: Uuid,
        log_id: Uuid,
        date: NaiveDate,
        status: LogStatus,
    },
    Session {
        event: SessionEvent,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChangeEvent {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub change: Change,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(user_id: Uuid, change: Change) -> Self {
        Self {
            user_id,
            change,
            at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns how many subscriptions received the event (all users).
    pub fn publish(&self, user_id: Uuid, change: Change) -> usize {
        let event = ChangeEvent::new(user_id, change);
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            // No open subscriptions
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self, user_id: Uuid) -> Subscription {
        tracing::debug!(user_id = %user_id, "Realtime subscription opened");
        Subscription {
            user_id,
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live subscription to one user's changes. Dropping it detaches from the feed.
pub struct Subscription {
    user_id: Uuid,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    /// Next event for this user, or `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.user_id == self.user_id => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        user_id = %self.user_id,
                        skipped,
                        "Realtime subscriber lagged, events dropped"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::debug!(user_id = %self.user_id, "Realtime subscription closed");
    }
}
