//! Session provider: the root-level context that owns the manager's lifecycle.
//!
//! Mounting subscribes to the auth event channel and runs the bootstrap
//! verification once. Unmounting (or dropping the provider) stops the event
//! listener and tears down the refresh timer so nothing leaks across
//! login/logout cycles.

use super::{events::AuthEvent, manager::SessionManager};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct SessionProvider {
    manager: SessionManager,
    listener: JoinHandle<()>,
}

impl SessionProvider {
    /// Mount the provider and run the bootstrap `check_auth`.
    pub async fn mount(manager: SessionManager) -> Self {
        let listener = spawn_listener(manager.clone());
        manager.check_auth().await;
        Self { manager, listener }
    }

    /// The session manager shared with every consumer.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.manager
    }

    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        self.listener.abort();
        self.manager.disarm_refresh_timer();
    }
}

fn spawn_listener(manager: SessionManager) -> JoinHandle<()> {
    let mut events = manager.events().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AuthEvent::Succeeded { user }) => manager.adopt_user(user),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Auth event listener lagged, skipped {skipped} events");
                }
                Err(RecvError::Closed) => {
                    debug!("Auth event channel closed");
                    break;
                }
            }
        }
    })
}
