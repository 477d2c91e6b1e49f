//! Session bootstrap and lifecycle tracking.
//!
//! ```text
//! NoSession ──connect──▶ AwaitingPairing ──scan──▶ Connected
//! (stored session) ──connect──────────────────────▶ Connected
//! Connected ──disconnect / logout──▶ Disconnected   (terminal for the run)
//! ```

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{info, warn};

use super::events::ClientEvent;
use super::{ClientError, MessagingClient};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No linked device and no connection yet.
    NoSession,
    /// Connected, waiting for a pairing code to be scanned.
    AwaitingPairing,
    /// Linked and connected.
    Connected,
    /// Connection lost or logged out. No reconnect is attempted here.
    Disconnected,
}

/// Shared, cloneable view of the session state.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    state: Arc<RwLock<SessionState>>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::NoSession)),
        }
    }
}

impl SessionTracker {
    /// Tracker starting in [`SessionState::NoSession`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        match self.state.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set(&self, next: SessionState) {
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *guard != next {
            info!(from = ?*guard, to = ?next, "session state changed");
            *guard = next;
        }
    }

    /// Apply a lifecycle event. Non-lifecycle events leave the state alone.
    pub fn observe(&self, event: &ClientEvent) {
        match event {
            ClientEvent::Connected | ClientEvent::PairSuccess => self.set(SessionState::Connected),
            ClientEvent::Disconnected { .. } | ClientEvent::LoggedOut => {
                self.set(SessionState::Disconnected);
            }
            ClientEvent::Message(_)
            | ClientEvent::Receipt(_)
            | ClientEvent::PairingCode { .. }
            | ClientEvent::PairingTimeout => {}
        }
    }
}

/// How hard to try the initial connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRetry {
    /// Additional attempts after the first one. Zero means one attempt only.
    pub retries: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for ConnectRetry {
    fn default() -> Self {
        Self {
            retries: 0,
            delay: Duration::from_millis(2000),
        }
    }
}

/// Bring the session up.
///
/// A stored session connects straight to [`SessionState::Connected`]. Without
/// one the client is connected and left in [`SessionState::AwaitingPairing`];
/// pairing codes then arrive as [`ClientEvent::PairingCode`] events.
///
/// # Errors
///
/// Returns the last connect error once all attempts are exhausted. Callers
/// treat this as fatal.
pub async fn bootstrap(
    client: &dyn MessagingClient,
    tracker: &SessionTracker,
    retry: ConnectRetry,
) -> Result<SessionState, ClientError> {
    let has_session = match client.session().await {
        Ok(info) => info.logged_in,
        Err(e) => {
            warn!(error = %e, "could not read stored session, assuming none");
            false
        }
    };

    if has_session {
        info!("connecting with existing session");
    } else {
        info!("no stored session, pairing required");
        tracker.set(SessionState::AwaitingPairing);
    }

    connect_with_retry(client, retry).await?;

    if has_session {
        tracker.set(SessionState::Connected);
    }
    Ok(tracker.state())
}

async fn connect_with_retry(
    client: &dyn MessagingClient,
    retry: ConnectRetry,
) -> Result<(), ClientError> {
    let mut attempt: u32 = 0;
    loop {
        match client.connect().await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < retry.retries => {
                attempt = attempt.saturating_add(1);
                warn!(error = %e, attempt, max = retry.retries, "connect failed, retrying");
                tokio::time::sleep(retry.delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
