//! End-to-end tests for the connection engine against a scripted fake RCON
//! server on a loopback `TcpListener`.
//!
//! The fake server decodes every frame the client writes, records the
//! command words and answers according to a per-test script.  Timings are
//! shrunk to milliseconds so recovery paths run quickly.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use battlecon_client::{
    ClientConfig, ConnectionEvent, ConnectionState, FrostbiteModule, GameEvent, HookDecision,
    ModuleOptions, RconClient, RconError, RecoveryReason,
};
use battlecon_core::{decode_message, encode_message, FrameDecoder, Message, SequenceId};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;

// ── Fake server ───────────────────────────────────────────────────────────────

/// What the fake server does with one command.
enum Reply {
    Words(Vec<String>),
    /// Push a server event carrying the command's sequence id, then reply.
    EventThen(Vec<String>, Vec<String>),
    Silence,
    Hangup,
}

type Script = dyn Fn(&[String]) -> Reply + Send + Sync;

struct FakeServer {
    addr: SocketAddr,
    seen: Arc<Mutex<Vec<Vec<String>>>>,
    accepted: Arc<AtomicUsize>,
}

impl FakeServer {
    fn seen(&self) -> Vec<Vec<String>> {
        self.seen.lock().unwrap().clone()
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

/// `version`, `login.plainText secret` and `admin.eventsEnabled` succeed;
/// everything else is an unknown command.
fn standard(command: &[String]) -> Reply {
    match command.first().map(String::as_str) {
        Some("version") => Reply::Words(words(&["OK", "ExampleServer", "1.0"])),
        Some("login.plainText") if command.get(1).map(String::as_str) == Some("secret") => {
            Reply::Words(words(&["OK"]))
        }
        Some("login.plainText") => Reply::Words(words(&["InvalidPassword"])),
        Some("admin.eventsEnabled") => Reply::Words(words(&["OK"])),
        _ => Reply::Words(words(&["InvalidCommand"])),
    }
}

async fn spawn_server(script: impl Fn(&[String]) -> Reply + Send + Sync + 'static) -> FakeServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let script: Arc<Script> = Arc::new(script);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let accepted = Arc::new(AtomicUsize::new(0));

    let (seen_task, accepted_task) = (Arc::clone(&seen), Arc::clone(&accepted));
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            accepted_task.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(serve(stream, Arc::clone(&script), Arc::clone(&seen_task)));
        }
    });

    FakeServer {
        addr,
        seen,
        accepted,
    }
}

async fn serve(mut stream: TcpStream, script: Arc<Script>, seen: Arc<Mutex<Vec<Vec<String>>>>) {
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        decoder.push(&buf[..n]);
        while let Ok(Some(frame)) = decoder.next_frame() {
            let request = decode_message(&frame).expect("client wrote a malformed frame");
            assert!(!request.from_server && !request.is_response);
            seen.lock().unwrap().push(request.words.clone());

            match (*script)(&request.words) {
                Reply::Words(reply) => send(&mut stream, response(request.sequence_id, reply)).await,
                Reply::EventThen(event, reply) => {
                    send(&mut stream, server_event(request.sequence_id, event)).await;
                    send(&mut stream, response(request.sequence_id, reply)).await;
                }
                Reply::Silence => {}
                Reply::Hangup => return,
            }
        }
    }
}

fn response(id: SequenceId, words: Vec<String>) -> Message {
    Message {
        sequence_id: id,
        from_server: false,
        is_response: true,
        words,
    }
}

fn server_event(id: SequenceId, words: Vec<String>) -> Message {
    Message {
        sequence_id: id,
        from_server: true,
        is_response: false,
        words,
    }
}

async fn send(stream: &mut TcpStream, message: Message) {
    let bytes = encode_message(&message).unwrap();
    let _ = stream.write_all(&bytes).await;
}

// ── Client helpers ────────────────────────────────────────────────────────────

fn fast_config(addr: SocketAddr) -> ClientConfig {
    let mut config = ClientConfig::new(addr.ip().to_string(), addr.port(), "");
    config.connect_timeout = Duration::from_secs(2);
    config.heartbeat_interval = Duration::from_secs(60);
    config.retry_delay = Duration::from_millis(50);
    config.game = None;
    config
}

async fn next_matching(
    events: &mut broadcast::Receiver<ConnectionEvent>,
    predicate: impl Fn(&ConnectionEvent) -> bool,
) -> ConnectionEvent {
    timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(e) => panic!("event stream ended: {e}"),
            }
        }
    })
    .await
    .expect("expected event was not published in time")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_version_reply_resolves_with_words_after_ok() {
    // Arrange
    let server = spawn_server(standard).await;
    let client = RconClient::builder(fast_config(server.addr)).build();
    client.connect().await.unwrap();

    // Act
    let result = client.exec("version").await;

    // Assert
    assert_eq!(result.unwrap(), words(&["ExampleServer", "1.0"]));
    assert_eq!(client.state(), ConnectionState::Connected);
    client.shutdown();
}

#[tokio::test]
async fn test_detached_command_reply_is_published_as_message() {
    // Arrange
    let server = spawn_server(standard).await;
    let client = RconClient::builder(fast_config(server.addr)).build();
    let mut events = client.subscribe();
    client.connect().await.unwrap();

    // Act
    client.exec_detached("version").unwrap();

    // Assert
    let event = next_matching(&mut events, |e| matches!(e, ConnectionEvent::Message(_))).await;
    let ConnectionEvent::Message(message) = event else {
        unreachable!()
    };
    assert!(message.is_response && !message.from_server);
    assert_eq!(message.words, words(&["OK", "ExampleServer", "1.0"]));
    assert_eq!(server.seen(), vec![words(&["version"])]);
    client.shutdown();
}

#[tokio::test]
async fn test_exec_during_connect_is_sent_once_connected() {
    // Arrange
    let server = spawn_server(standard).await;
    let client = RconClient::builder(fast_config(server.addr)).build();

    // Act – the command is queued behind the connect request
    let connecting = client.clone();
    let connect = tokio::spawn(async move { connecting.connect().await });
    tokio::task::yield_now().await;
    let result = client.exec("version").await;

    // Assert
    assert_eq!(result.unwrap(), words(&["ExampleServer", "1.0"]));
    tokio_test::assert_ok!(connect.await.unwrap());
    client.shutdown();
}

#[tokio::test]
async fn test_rejected_command_fails_with_status_text() {
    // Arrange
    let server = spawn_server(standard).await;
    let client = RconClient::builder(fast_config(server.addr)).build();
    client.connect().await.unwrap();

    // Act
    let err = client.exec("no.such.command").await.unwrap_err();

    // Assert
    assert_eq!(err.to_string(), "InvalidCommand");
    assert_eq!(err.status(), Some("InvalidCommand"));
    // The connection survives an application error.
    tokio_test::assert_ok!(client.exec("version").await);
    client.shutdown();
}

#[tokio::test]
async fn test_server_event_with_same_id_does_not_resolve_the_call() {
    // Arrange – the event reuses the pending command's sequence id
    let server = spawn_server(|command: &[String]| match command[0].as_str() {
        "serverInfo" => Reply::EventThen(
            words(&["player.onJoin", "Bob", "EA_1234"]),
            words(&["OK", "My Server", "12"]),
        ),
        _ => standard(command),
    })
    .await;
    let module = FrostbiteModule::new(ModuleOptions::default());
    let client = RconClient::builder(fast_config(server.addr))
        .module(Arc::new(module))
        .build();
    let mut events = client.subscribe();
    client.connect().await.unwrap();

    // Act
    let result = client.exec("serverInfo").await;

    // Assert
    assert_eq!(result.unwrap(), words(&["My Server", "12"]));
    let raw = next_matching(&mut events, |e| matches!(e, ConnectionEvent::ServerEvent(_))).await;
    match raw {
        ConnectionEvent::ServerEvent(message) => assert_eq!(message.words[0], "player.onJoin"),
        other => panic!("unexpected event {other:?}"),
    }
    let game = next_matching(&mut events, |e| matches!(e, ConnectionEvent::Game(_))).await;
    match game {
        ConnectionEvent::Game(event) => assert_eq!(
            event,
            GameEvent {
                name: "player.join".into(),
                args: words(&["Bob", "EA_1234"]),
            }
        ),
        other => panic!("unexpected event {other:?}"),
    }
    client.shutdown();
}

#[tokio::test]
async fn test_reconnects_after_server_drops_connection() {
    // Arrange – `quit` makes the server hang up without replying
    let server = spawn_server(|command: &[String]| match command[0].as_str() {
        "quit" => Reply::Hangup,
        _ => standard(command),
    })
    .await;
    let client = RconClient::builder(fast_config(server.addr)).build();
    let mut events = client.subscribe();
    client.connect().await.unwrap();

    // Act
    let dropped = client.exec("quit").await;

    // Assert – the in-flight call is failed, not leaked
    assert!(matches!(dropped, Err(RconError::ConnectionReset)));
    next_matching(&mut events, |e| {
        matches!(e, ConnectionEvent::Recovering(RecoveryReason::Closed))
    })
    .await;
    next_matching(&mut events, |e| matches!(e, ConnectionEvent::ReconnectScheduled { .. })).await;
    next_matching(&mut events, |e| matches!(e, ConnectionEvent::Connected { .. })).await;
    assert_eq!(
        client.exec("version").await.unwrap(),
        words(&["ExampleServer", "1.0"])
    );
    assert_eq!(server.accepted.load(Ordering::SeqCst), 2);
    client.shutdown();
}

#[tokio::test]
async fn test_exec_while_disconnected_fails_fast() {
    // Arrange – a client that was never connected
    let server = spawn_server(standard).await;
    let client = RconClient::builder(fast_config(server.addr)).build();
    let mut events = client.subscribe();

    // Act
    let result = client.exec("version").await;

    // Assert
    assert!(matches!(result, Err(RconError::NotConnected)));
    next_matching(&mut events, |e| matches!(e, ConnectionEvent::ReconnectScheduled { .. })).await;
    // The scheduled reconnect brings the link up on its own.
    next_matching(&mut events, |e| matches!(e, ConnectionEvent::Connected { .. })).await;
    client.shutdown();
}

#[tokio::test]
async fn test_frostbite_login_then_events_enabled_then_ready() {
    // Arrange
    let server = spawn_server(standard).await;
    let mut config = fast_config(server.addr);
    config.password = "secret".into();
    config.game = Some("bf4".into());
    let client = RconClient::from_config(config).unwrap();
    let mut events = client.subscribe();

    // Act
    let connected = client.connect().await;

    // Assert
    tokio_test::assert_ok!(connected);
    next_matching(&mut events, |e| matches!(e, ConnectionEvent::LoggedIn)).await;
    next_matching(&mut events, |e| matches!(e, ConnectionEvent::Ready)).await;
    assert_eq!(
        server.seen(),
        vec![
            words(&["login.plainText", "secret"]),
            words(&["admin.eventsEnabled", "true"]),
        ]
    );
    client.shutdown();
}

#[tokio::test]
async fn test_wrong_password_fails_connect() {
    let server = spawn_server(standard).await;
    let mut config = fast_config(server.addr);
    config.password = "wrong".into();
    config.game = Some("frostbite".into());
    let client = RconClient::from_config(config).unwrap();

    let err = client.connect().await.unwrap_err();

    assert_eq!(err.status(), Some("InvalidPassword"));
    // The socket stays open until the caller decides to drop it.
    assert_eq!(client.state(), ConnectionState::Connected);
    tokio_test::assert_ok!(client.exec("version").await);
    assert_eq!(server.accepted.load(Ordering::SeqCst), 1);
    client.disconnect().await.unwrap();
    assert_eq!(client.state(), ConnectionState::Idle);
    client.shutdown();
}

#[tokio::test]
async fn test_exec_hook_can_abort_a_command() {
    // Arrange
    let server = spawn_server(standard).await;
    let client = RconClient::builder(fast_config(server.addr))
        .exec_hook(|message| {
            if message.head() == Some("admin.shutDown") {
                HookDecision::Abort
            } else {
                HookDecision::Proceed
            }
        })
        .build();
    client.connect().await.unwrap();

    // Act
    let aborted = client.exec("admin.shutDown").await;
    let allowed = client.exec("version").await;

    // Assert – only the allowed command reached the server
    assert!(matches!(aborted, Err(RconError::Aborted)));
    tokio_test::assert_ok!(allowed);
    assert_eq!(server.seen(), vec![words(&["version"])]);
    client.shutdown();
}

#[tokio::test]
async fn test_empty_heartbeat_reply_triggers_recovery() {
    // Arrange – `version` answers `OK` with no payload
    let server = spawn_server(|command: &[String]| match command[0].as_str() {
        "version" => Reply::Words(words(&["OK"])),
        _ => standard(command),
    })
    .await;
    let mut config = fast_config(server.addr);
    config.heartbeat_interval = Duration::from_millis(50);
    let client = RconClient::builder(config).build();
    let mut events = client.subscribe();
    client.connect().await.unwrap();

    // Act / Assert
    next_matching(&mut events, |e| {
        matches!(e, ConnectionEvent::Recovering(RecoveryReason::Heartbeat))
    })
    .await;
    next_matching(&mut events, |e| matches!(e, ConnectionEvent::ReconnectScheduled { .. })).await;
    client.shutdown();
}

#[tokio::test]
async fn test_unanswered_heartbeat_triggers_recovery() {
    let server = spawn_server(|command: &[String]| match command[0].as_str() {
        "version" => Reply::Silence,
        _ => standard(command),
    })
    .await;
    let mut config = fast_config(server.addr);
    config.heartbeat_interval = Duration::from_millis(50);
    let client = RconClient::builder(config).build();
    let mut events = client.subscribe();
    client.connect().await.unwrap();

    next_matching(&mut events, |e| {
        matches!(e, ConnectionEvent::Recovering(RecoveryReason::Heartbeat))
    })
    .await;
    client.shutdown();
}

#[tokio::test]
async fn test_second_connect_is_rejected() {
    let server = spawn_server(standard).await;
    let client = RconClient::builder(fast_config(server.addr)).build();
    client.connect().await.unwrap();

    let second = client.connect().await;

    assert!(matches!(second, Err(RconError::AlreadyConnected)));
    tokio_test::assert_ok!(client.exec("version").await);
    assert_eq!(server.accepted.load(Ordering::SeqCst), 1);
    client.shutdown();
}

#[tokio::test]
async fn test_disconnect_fails_pending_calls_and_stays_down() {
    // Arrange – the server never answers `slow`
    let server = spawn_server(|command: &[String]| match command[0].as_str() {
        "slow" => Reply::Silence,
        _ => standard(command),
    })
    .await;
    let client = RconClient::builder(fast_config(server.addr)).build();
    client.connect().await.unwrap();
    let waiting = {
        let client = client.clone();
        tokio::spawn(async move { client.exec("slow").await })
    };
    // Let the command reach the wire.
    timeout(Duration::from_secs(5), async {
        while server.seen().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    // Act
    client.disconnect().await.unwrap();

    // Assert
    let result = waiting.await.unwrap();
    assert!(matches!(result, Err(RconError::ConnectionReset)));
    assert_eq!(client.state(), ConnectionState::Idle);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.accepted.load(Ordering::SeqCst), 1, "no reconnect after disconnect");
    client.shutdown();
}

#[tokio::test]
async fn test_calls_after_shutdown_fail() {
    let server = spawn_server(standard).await;
    let client = RconClient::builder(fast_config(server.addr)).build();

    client.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(matches!(client.exec("version").await, Err(RconError::Shutdown)));
}
