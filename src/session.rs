//! Connection resilience: the owning loop of the bot process.
//!
//! An explicit state machine replaces the usual pile of event callbacks:
//! one typed event enum ([`ClientEvent`]), one dispatch loop, auditable
//! transitions. The manager connects with backoff, re-applies channel
//! memberships on every (re)connection, and feeds inbound messages to
//! the router until the session dies — then starts over. Connectivity
//! loss is never fatal.

use tracing::{info, warn};

use crate::backoff::BackoffSchedule;
use crate::client::{ClientEvent, Connector, Session};
use crate::config::ChannelConfig;
use crate::model::Model;
use crate::router::Router;

/// Session lifecycle states. No terminal state: the manager runs until
/// process shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Owns the session lifecycle and the live protocol handle.
pub struct SessionManager<C, M> {
    connector: C,
    channels: Vec<ChannelConfig>,
    router: Router<M>,
    backoff: BackoffSchedule,
    state: SessionState,
}

impl<C: Connector, M: Model> SessionManager<C, M> {
    pub fn new(
        connector: C,
        channels: Vec<ChannelConfig>,
        router: Router<M>,
        backoff: BackoffSchedule,
    ) -> Self {
        Self {
            connector,
            channels,
            router,
            backoff,
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session loop. Returns only at process shutdown.
    ///
    /// The router is wired for the life of the process; each established
    /// session only lends its send handle per event.
    pub async fn run(mut self) {
        loop {
            let session = self.establish().await;

            // Memberships are re-applied in full on every reconnect, not
            // only the first connection.
            info!(channels = self.channels.len(), "joining configured channels");
            for channel in &self.channels {
                session
                    .handle
                    .join(&channel.name, channel.key.as_deref())
                    .await;
            }

            self.drive(session).await;
            self.state = SessionState::Disconnected;
        }
    }

    /// Retry until a session is established. Every failure class is
    /// retried identically; the attempt counter is fresh per outage.
    async fn establish(&mut self) -> Session {
        let mut attempt = 0usize;
        loop {
            let wait = self.backoff.delay(attempt);
            tokio::time::sleep(wait).await;

            self.state = SessionState::Connecting;
            match self.connector.connect().await {
                Ok(session) => {
                    self.state = SessionState::Connected;
                    info!(attempt, "connected");
                    return session;
                }
                Err(e) => {
                    self.state = SessionState::Disconnected;
                    warn!(
                        error = %e,
                        waited_ms = wait.as_millis() as u64,
                        "connect failed"
                    );
                }
            }
            attempt += 1;
        }
    }

    /// Dispatch session events until the connection is gone.
    async fn drive(&mut self, mut session: Session) {
        loop {
            match session.events.recv().await {
                Some(ClientEvent::Privmsg {
                    speaker,
                    target,
                    body,
                }) => {
                    self.router
                        .route(&speaker, &target, &body, &session.handle)
                        .await;
                }
                Some(ClientEvent::Closed { reason }) => {
                    info!(%reason, "disconnected");
                    return;
                }
                None => {
                    info!("event stream ended");
                    return;
                }
            }
        }
    }
}
