//! Listener lifecycle state.
//!
//! A [`Lifecycle`] publishes the listener's current [`ListenerState`] over a
//! watch channel. The listener drives the transitions; the event service
//! watches for [`ListenerState::Stopped`] so calls still waiting on the sink
//! can be abandoned after a forced stop.
//!
//! ```text
//! Idle -> Bound -> Serving -> Draining -> Stopped
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// States of the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ListenerState {
    /// Created, no socket yet
    Idle,
    /// Socket established
    Bound,
    /// Accepting and dispatching calls
    Serving,
    /// No longer accepting, waiting for in-flight calls
    Draining,
    /// Terminal
    Stopped,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListenerState::Idle => "idle",
            ListenerState::Bound => "bound",
            ListenerState::Serving => "serving",
            ListenerState::Draining => "draining",
            ListenerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Shared handle to a listener's state.
#[derive(Clone)]
pub struct Lifecycle {
    state_tx: Arc<watch::Sender<ListenerState>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(ListenerState::Idle);
        Self {
            state_tx: Arc::new(state_tx),
        }
    }

    /// Current state.
    pub fn state(&self) -> ListenerState {
        *self.state_tx.borrow()
    }

    /// Receiver notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<ListenerState> {
        self.state_tx.subscribe()
    }

    /// Move to `next`. States only move forward; a request to go back is
    /// ignored.
    pub fn transition(&self, next: ListenerState) {
        let mut previous = next;
        let changed = self.state_tx.send_if_modified(|state| {
            previous = *state;
            if next > *state {
                *state = next;
                true
            } else {
                false
            }
        });
        if changed {
            debug!(from = %previous, to = %next, "Listener state changed");
        }
    }

    /// Resolves once the listener reaches [`ListenerState::Stopped`].
    pub async fn stopped(&self) {
        let mut rx = self.subscribe();
        let reached = rx
            .wait_for(|state| *state == ListenerState::Stopped)
            .await
            .is_ok();
        if !reached {
            // Unreachable while `self` holds the sender.
            std::future::pending::<()>().await;
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .finish()
    }
}
