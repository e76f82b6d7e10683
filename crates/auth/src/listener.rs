//! Session-change notifications.
//!
//! Sign-in, sign-out and token refreshes are published per user on tokio
//! broadcast channels. Pages subscribe (through the `/auth/events` stream)
//! and react: a sign-in re-renders, a sign-out sends the page to the login
//! route, token refreshes are ignored. A subscription releases its channel
//! when dropped.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use authgate_core::auth::{reaction_for, AuthEvent, Reaction};
use tokio::sync::broadcast;

/// Channel capacity for notifications.
const CHANNEL_CAPACITY: usize = 16;

type Channels = Arc<RwLock<HashMap<String, broadcast::Sender<AuthEvent>>>>;

/// Registry of per-user notification channels.
///
/// The lock is a std lock because subscriptions release their channel from
/// `Drop`, which cannot await.
#[derive(Debug, Clone, Default)]
pub struct AuthEvents {
    channels: Channels,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to notifications for one user.
    pub fn subscribe(&self, user_id: &str) -> AuthSubscription {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        let receiver = channels
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();

        AuthSubscription {
            user_id: user_id.to_string(),
            receiver: Some(receiver),
            channels: self.channels.clone(),
        }
    }

    /// Deliver an event to the subscribers of its user. Events for users
    /// nobody listens to are dropped.
    pub fn publish(&self, event: AuthEvent) {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        match channels.get(event.user_id()) {
            Some(sender) => {
                let delivered = sender.send(event).unwrap_or(0);
                tracing::debug!(delivered, "published auth event");
            }
            None => tracing::trace!(user_id = %event.user_id(), "no auth event subscribers"),
        }
    }

    /// Number of live subscriptions for a user.
    pub fn subscriber_count(&self, user_id: &str) -> usize {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        channels
            .get(user_id)
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }
}

/// Handle to a user's notification stream.
#[derive(Debug)]
pub struct AuthSubscription {
    user_id: String,
    receiver: Option<broadcast::Receiver<AuthEvent>>,
    channels: Channels,
}

impl AuthSubscription {
    /// Next raw event. `None` once the channel is closed.
    pub async fn next_event(&mut self) -> Option<AuthEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, user_id = %self.user_id, "auth event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next event that calls for a page reaction, skipping the rest.
    pub async fn next_reaction(&mut self, login_path: &str) -> Option<Reaction> {
        loop {
            let event = self.next_event().await?;
            if let Some(reaction) = reaction_for(&event, login_path) {
                return Some(reaction);
            }
        }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        drop(self.receiver.take());

        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        if channels
            .get(&self.user_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(&self.user_id);
        }
    }
}
