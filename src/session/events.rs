//! Cross-component auth notifications.
//!
//! A login flow that completes outside the session manager (for example an
//! embedded form that talks to the backend itself) publishes
//! [`AuthEvent::Succeeded`]; the mounted session provider adopts the announced
//! user without another verify round-trip.

use super::types::User;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    Succeeded { user: User },
}

/// Publisher side of the auth event channel. Cloning shares the channel.
#[derive(Clone, Debug)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Announce a successful login. Returns the number of listeners reached.
    pub fn publish_success(&self, user: User) -> usize {
        self.sender
            .send(AuthEvent::Succeeded { user })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }
}
