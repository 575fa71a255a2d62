//! IRC wire connector: TCP/TLS transport, registration handshake, and
//! the reader/writer task split behind a connected [`Session`].

use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tracing::{debug, info, warn};

use super::{ClientEvent, ConnectError, Handle, LineCodec, Message, Session};
use async_trait::async_trait;
use tokio_util::codec::Framed;

const OUTBOUND_QUEUE: usize = 64;
const EVENT_QUEUE: usize = 64;

trait IoStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> IoStream for T {}

type Transport = Framed<Box<dyn IoStream>, LineCodec>;

/// Connects to an IRC server and registers the configured nick.
pub struct IrcConnector {
    address: String,
    host: String,
    tls: bool,
    password: Option<String>,
    nick: String,
}

impl IrcConnector {
    pub fn new(
        address: impl Into<String>,
        tls: bool,
        password: Option<String>,
        nick: impl Into<String>,
    ) -> Self {
        let address = address.into();
        let host = address
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(&address)
            .trim_matches(['[', ']'])
            .to_string();
        Self {
            address,
            host,
            tls,
            password,
            nick: nick.into(),
        }
    }

    async fn open_transport(&self) -> Result<Transport, ConnectError> {
        let tcp = TcpStream::connect(&self.address).await?;
        let stream: Box<dyn IoStream> = if self.tls {
            let connector = TlsConnector::from(Arc::new(tls_config()));
            let server_name = ServerName::try_from(self.host.clone())
                .map_err(|e| ConnectError::InvalidAddress(e.to_string()))?;
            Box::new(connector.connect(server_name, tcp).await?)
        } else {
            Box::new(tcp)
        };
        Ok(Framed::new(stream, LineCodec::new()))
    }

    /// Run the registration handshake until the server welcomes us.
    async fn register(&self, framed: &mut Transport) -> Result<(), ConnectError> {
        if let Some(password) = &self.password {
            framed.send(Message::pass(password)).await?;
        }
        framed.send(Message::nick(&self.nick)).await?;
        framed.send(Message::user(&self.nick)).await?;

        loop {
            let line = match framed.next().await {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Err(e.into()),
                None => return Err(ConnectError::ClosedDuringRegistration),
            };
            if line.is_empty() {
                continue;
            }
            let msg: Message = match line.parse() {
                Ok(msg) => msg,
                Err(e) => {
                    debug!(error = %e, "unparseable line during registration");
                    continue;
                }
            };
            match msg.command.as_str() {
                "PING" => {
                    let token = msg.params.first().map(String::as_str).unwrap_or_default();
                    framed.send(Message::pong(token)).await?;
                }
                // RPL_WELCOME: registration complete
                "001" => return Ok(()),
                // ERR_ERRONEUSNICKNAME / ERR_NICKNAMEINUSE
                "432" | "433" => {
                    return Err(ConnectError::Rejected(format!(
                        "nick {} not accepted",
                        self.nick
                    )));
                }
                // ERR_PASSWDMISMATCH / ERR_YOUREBANNEDCREEP
                "464" | "465" => {
                    return Err(ConnectError::Rejected("server refused login".to_string()));
                }
                "ERROR" => {
                    return Err(ConnectError::Rejected(
                        msg.params.first().cloned().unwrap_or_default(),
                    ));
                }
                _ => {}
            }
        }
    }
}

#[async_trait]
impl super::Connector for IrcConnector {
    async fn connect(&self) -> Result<Session, ConnectError> {
        let mut framed = self.open_transport().await?;
        self.register(&mut framed).await?;
        info!(server = %self.address, nick = %self.nick, "registered");

        let (sink, stream) = framed.split();
        let (out_tx, out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
        let (event_tx, event_rx) = mpsc::channel::<ClientEvent>(EVENT_QUEUE);

        tokio::spawn(write_loop(sink, out_rx));
        tokio::spawn(read_loop(stream, event_tx, out_tx.clone()));

        Ok(Session {
            events: event_rx,
            handle: Handle::new(out_tx),
        })
    }
}

/// Drain the outbound queue into the wire. Exits when the queue closes
/// or the wire rejects a write; the read side reports the disconnect.
async fn write_loop(mut sink: SplitSink<Transport, Message>, mut rx: mpsc::Receiver<Message>) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = sink.send(msg).await {
            warn!(error = %e, "write failed, stopping writer");
            return;
        }
    }
}

/// Translate inbound lines into typed events until the stream ends,
/// then emit a single `Closed`.
async fn read_loop(
    mut stream: SplitStream<Transport>,
    events: mpsc::Sender<ClientEvent>,
    out: mpsc::Sender<Message>,
) {
    let reason = loop {
        match stream.next().await {
            Some(Ok(line)) => {
                if line.is_empty() {
                    continue;
                }
                let msg: Message = match line.parse() {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!(error = %e, "unparseable line");
                        continue;
                    }
                };
                match msg.command.as_str() {
                    "PING" => {
                        let token = msg.params.first().map(String::as_str).unwrap_or_default();
                        let _ = out.send(Message::pong(token)).await;
                    }
                    "PRIVMSG" => {
                        let (Some(speaker), Some(target), Some(body)) =
                            (msg.source_nick(), msg.params.first(), msg.params.get(1))
                        else {
                            continue;
                        };
                        let event = ClientEvent::Privmsg {
                            speaker: speaker.to_string(),
                            target: target.clone(),
                            body: body.clone(),
                        };
                        if events.send(event).await.is_err() {
                            // Consumer gone; nothing left to deliver to.
                            return;
                        }
                    }
                    "ERROR" => {
                        break msg
                            .params
                            .first()
                            .cloned()
                            .unwrap_or_else(|| "server error".to_string());
                    }
                    _ => {}
                }
            }
            Some(Err(e)) => break e.to_string(),
            None => break "connection closed".to_string(),
        }
    };
    let _ = events.send(ClientEvent::Closed { reason }).await;
}

/// Client TLS configuration verifying against system roots.
fn tls_config() -> ClientConfig {
    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for cert in certs.certs {
        if let Err(e) = roots.add(cert) {
            warn!(error = %e, "failed to add root cert");
        }
    }
    for e in &certs.errors {
        warn!(error = %e, "error loading native certs");
    }
    ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth()
}
