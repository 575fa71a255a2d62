//! Chat-protocol client: wire transport, message model, and the typed
//! event interface the session manager consumes.
//!
//! The [`Connector`] trait is the seam between the resilience loop and
//! the wire: production uses [`IrcConnector`], tests script their own.

mod codec;
mod irc;
mod message;

pub use codec::{LineCodec, MAX_LINE_LEN};
pub use irc::IrcConnector;
pub use message::Message;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Wire protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line exceeds {limit} bytes ({actual})")]
    LineTooLong { actual: usize, limit: usize },
    #[error("empty message")]
    EmptyMessage,
}

/// Why a connection attempt failed. All variants are retried identically
/// by the session manager; the distinction exists for the logs.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("invalid server address: {0}")]
    InvalidAddress(String),
    #[error("registration rejected: {0}")]
    Rejected(String),
    #[error("connection closed during registration")]
    ClosedDuringRegistration,
}

/// Inbound events delivered by a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A channel or private message.
    Privmsg {
        speaker: String,
        target: String,
        body: String,
    },
    /// The session is gone; the resilience loop takes over from here.
    Closed { reason: String },
}

/// A live, registered session: an event stream plus a send handle.
#[derive(Debug)]
pub struct Session {
    pub events: mpsc::Receiver<ClientEvent>,
    pub handle: Handle,
}

/// Cheaply cloneable sender half of a session.
///
/// Safe for concurrent use from any number of reply tasks. Sends after
/// session teardown are dropped with a debug log; the resilience loop
/// is already reconnecting by then.
#[derive(Clone, Debug)]
pub struct Handle {
    tx: mpsc::Sender<Message>,
}

impl Handle {
    pub fn new(tx: mpsc::Sender<Message>) -> Self {
        Self { tx }
    }

    pub async fn join(&self, channel: &str, key: Option<&str>) {
        self.send(Message::join(channel, key)).await;
    }

    pub async fn privmsg(&self, target: &str, text: &str) {
        self.send(Message::privmsg(target, text)).await;
    }

    async fn send(&self, msg: Message) {
        if self.tx.send(msg).await.is_err() {
            debug!("send after session teardown dropped");
        }
    }
}

/// Establishes registered sessions against a chat server.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> Result<Session, ConnectError>;
}
