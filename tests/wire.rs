//! Wire-level tests for the IRC connector against a scripted server.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::time::timeout;

use banter::client::{ClientEvent, ConnectError, Connector, IrcConnector};

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn registers_pongs_and_delivers_privmsg() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        let mut saw_nick = false;
        while let Some(line) = lines.next_line().await.unwrap() {
            if line.starts_with("NICK bork") {
                saw_nick = true;
            }
            if line.starts_with("USER") {
                break;
            }
        }
        assert!(saw_nick, "client must send NICK before USER");

        write
            .write_all(b":irc.test 001 bork :Welcome to the test net\r\n")
            .await
            .unwrap();
        write.write_all(b"PING :tok-1\r\n").await.unwrap();
        write
            .write_all(b":alice!a@host PRIVMSG #lounge :hello there\r\n")
            .await
            .unwrap();

        loop {
            let line = lines
                .next_line()
                .await
                .unwrap()
                .expect("client closed early");
            if line.starts_with("PONG") {
                assert!(line.contains("tok-1"));
                break;
            }
        }
    });

    let connector = IrcConnector::new(addr.to_string(), false, None, "bork");
    let mut session = timeout(WAIT, connector.connect())
        .await
        .expect("connect timed out")
        .expect("connect failed");

    let event = timeout(WAIT, session.events.recv())
        .await
        .expect("event timed out")
        .expect("event stream ended");
    assert_eq!(
        event,
        ClientEvent::Privmsg {
            speaker: "alice".to_string(),
            target: "#lounge".to_string(),
            body: "hello there".to_string(),
        }
    );

    timeout(WAIT, server).await.unwrap().unwrap();

    // Server task finished and dropped the socket: the session closes.
    let event = timeout(WAIT, session.events.recv())
        .await
        .expect("close timed out")
        .expect("event stream ended");
    assert!(matches!(event, ClientEvent::Closed { .. }));
}

#[tokio::test]
async fn sends_pass_before_nick_when_configured() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        let first = lines.next_line().await.unwrap().unwrap();
        assert_eq!(first, "PASS hunter2");

        while let Some(line) = lines.next_line().await.unwrap() {
            if line.starts_with("USER") {
                break;
            }
        }
        write
            .write_all(b":irc.test 001 bork :Welcome\r\n")
            .await
            .unwrap();
    });

    let connector = IrcConnector::new(
        addr.to_string(),
        false,
        Some("hunter2".to_string()),
        "bork",
    );
    timeout(WAIT, connector.connect())
        .await
        .expect("connect timed out")
        .expect("connect failed");

    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn server_error_during_registration_is_rejected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        while let Some(line) = lines.next_line().await.unwrap() {
            if line.starts_with("USER") {
                break;
            }
        }
        write
            .write_all(b"ERROR :You are banned\r\n")
            .await
            .unwrap();
    });

    let connector = IrcConnector::new(addr.to_string(), false, None, "bork");
    let err = timeout(WAIT, connector.connect())
        .await
        .expect("connect timed out")
        .expect_err("connect should fail");
    match err {
        ConnectError::Rejected(reason) => assert!(reason.contains("banned")),
        other => panic!("expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn nick_in_use_during_registration_is_rejected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        while let Some(line) = lines.next_line().await.unwrap() {
            if line.starts_with("USER") {
                break;
            }
        }
        write
            .write_all(b":irc.test 433 * bork :Nickname is already in use\r\n")
            .await
            .unwrap();
    });

    let connector = IrcConnector::new(addr.to_string(), false, None, "bork");
    let err = timeout(WAIT, connector.connect())
        .await
        .expect("connect timed out")
        .expect_err("connect should fail");
    assert!(matches!(err, ConnectError::Rejected(_)));
}
