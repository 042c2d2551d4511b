//! The self-healing connection engine.
//!
//! # How it fits together (for beginners)
//!
//! ```text
//!  RconClient ──Request──▶ ┌──────────────────┐ ──ConnectionEvent──▶ subscribers
//!  (cloneable)             │ ConnectionActor  │
//!                          │  owns: socket,   │ ──ConnectionState──▶ watch
//!  reader task ──Inbound─▶ │  correlator,     │
//!  (per socket)            │  timers          │ ◀── login task (game module)
//!                          └──────────────────┘
//! ```
//!
//! All mutable state lives in one tokio task, the [`ConnectionActor`].
//! Callers never touch it directly: [`RconClient`] is a cheap, cloneable
//! handle that sends [`Request`]s over a channel and waits on a `oneshot`
//! for the answer.  Because only the actor mutates the pending-call table and
//! the sequence counter, no locks are needed and every reply resolves its
//! caller exactly once.
//!
//! # Connection lifecycle
//!
//! ```text
//!   Idle ──connect()──▶ Connecting ──TCP up──▶ Connected
//!    ▲                      │                      │
//!    └──── teardown ◀───────┴── timeout / error ───┘
//!              │
//!              └──▶ reconnect after `retry_delay` (one timer, never two)
//! ```
//!
//! Every failure (connect timeout, heartbeat failure, undecodable frame,
//! socket error, server close) runs the same recovery path: publish
//! `Recovering`, tear the socket down, fail every pending call with
//! [`RconError::ConnectionReset`] and arm the reconnect timer unless it is
//! already armed.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use battlecon_core::{Command, Message, MessageCodec, WordCodec};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::application::correlator::{Correlator, Dispatch};
use crate::application::game_module::{self, GameModule, ModuleOptions, RconSession, UnknownModule};
use crate::domain::{ClientConfig, ConnectionEvent, ConnectionState, RconError, RecoveryReason};
use crate::infrastructure::transport::{self, Inbound, InboundSender};

/// Capacity of the event broadcast channel.  A subscriber that falls further
/// behind than this skips the oldest events.
pub const EVENT_CAPACITY: usize = 256;

/// The command sent as the heartbeat.
const HEARTBEAT_COMMAND: &str = "version";

/// A hook's verdict on a command that is about to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    Proceed,
    Abort,
}

/// Inspects every outgoing command before it is written.  Returning
/// [`HookDecision::Abort`] cancels the command: nothing is written and the
/// caller gets [`RconError::Aborted`].
pub type ExecHook = Box<dyn Fn(&Message) -> HookDecision + Send + Sync>;

type Reply = oneshot::Sender<Result<Vec<String>, RconError>>;
type ConnectReply = oneshot::Sender<Result<(), RconError>>;

// ── Actor protocol ────────────────────────────────────────────────────────────

/// Messages from [`RconClient`] handles (and the login task) to the actor.
enum Request {
    Connect { reply: ConnectReply },
    Disconnect { done: oneshot::Sender<()> },
    Exec { command: Command, reply: Option<Reply> },
    LoginFinished { generation: u64, result: Result<(), RconError> },
    Shutdown,
}

/// Continuation stored for a command awaiting its reply.  Detached commands
/// register nothing.
#[derive(Debug)]
enum Pending {
    Caller(Reply),
    Heartbeat,
}

/// The socket as the actor sees it.
enum Link {
    Down,
    /// Frames for commands issued before the TCP connect finished wait in
    /// `queued` and are written, in order, once it does.
    Connecting { task: JoinHandle<()>, queued: Vec<Vec<u8>> },
    Up { writer: OwnedWriteHalf, reader: JoinHandle<()> },
}

// ── ConnectionActor ───────────────────────────────────────────────────────────

/// Owns one server connection and everything that changes with it.
struct ConnectionActor {
    config: Arc<ClientConfig>,
    codec: Arc<dyn MessageCodec>,
    module: Option<Arc<dyn GameModule>>,
    hooks: Vec<ExecHook>,

    requests: mpsc::UnboundedReceiver<Request>,
    /// Used to hand the login task a client handle without keeping the
    /// request channel open forever.
    handle: mpsc::WeakUnboundedSender<Request>,
    inbound_tx: InboundSender,
    inbound_rx: mpsc::UnboundedReceiver<(u64, Inbound)>,
    events: broadcast::Sender<ConnectionEvent>,
    state: watch::Sender<ConnectionState>,

    link: Link,
    /// Bumped for every connect attempt and every teardown.  Socket tasks
    /// tag their reports with it.
    generation: u64,
    correlator: Correlator<Pending>,
    heartbeat_outstanding: bool,
    connect_waiter: Option<ConnectReply>,

    connect_deadline: Option<Pin<Box<Sleep>>>,
    heartbeat: Option<Interval>,
    reconnect: Option<Pin<Box<Sleep>>>,
}

impl ConnectionActor {
    #[allow(clippy::too_many_arguments)]
    fn new(
        config: Arc<ClientConfig>,
        codec: Arc<dyn MessageCodec>,
        module: Option<Arc<dyn GameModule>>,
        hooks: Vec<ExecHook>,
        requests: mpsc::UnboundedReceiver<Request>,
        handle: mpsc::WeakUnboundedSender<Request>,
        events: broadcast::Sender<ConnectionEvent>,
        state: watch::Sender<ConnectionState>,
    ) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            config,
            codec,
            module,
            hooks,
            requests,
            handle,
            inbound_tx,
            inbound_rx,
            events,
            state,
            link: Link::Down,
            generation: 0,
            correlator: Correlator::new(),
            heartbeat_outstanding: false,
            connect_waiter: None,
            connect_deadline: None,
            heartbeat: None,
            reconnect: None,
        }
    }

    /// Processes requests, socket reports and timers until every client
    /// handle is gone or [`RconClient::shutdown`] is called.
    async fn run(mut self) {
        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(Request::Shutdown) | None => break,
                    Some(request) => self.handle_request(request).await,
                },
                Some((generation, inbound)) = self.inbound_rx.recv() => {
                    self.handle_inbound(generation, inbound).await;
                }
                () = wait_on(&mut self.connect_deadline) => self.on_connect_timeout(),
                _ = tick_on(&mut self.heartbeat) => self.heartbeat_tick().await,
                () = wait_on(&mut self.reconnect) => {
                    self.reconnect = None;
                    info!("reconnecting to {}", self.config.address());
                    self.start_connect();
                }
            }
        }

        debug!("connection actor shutting down");
        self.reconnect = None;
        self.teardown();
    }

    async fn handle_request(&mut self, request: Request) {
        match request {
            Request::Connect { reply } => {
                if !matches!(self.link, Link::Down) {
                    warn!("connect() ignored: a connection to {} already exists", self.config.address());
                    let _ = reply.send(Err(RconError::AlreadyConnected));
                    return;
                }
                self.reconnect = None;
                self.connect_waiter = Some(reply);
                self.start_connect();
            }
            Request::Disconnect { done } => {
                self.reconnect = None;
                if !matches!(self.link, Link::Down) {
                    info!("disconnecting from {}", self.config.address());
                    let was_up = matches!(self.link, Link::Up { .. });
                    self.set_state(ConnectionState::Closing);
                    self.teardown();
                    if was_up {
                        self.emit(ConnectionEvent::Closed);
                    }
                }
                let _ = done.send(());
            }
            Request::Exec { command, reply } => {
                self.send(command, reply.map(Pending::Caller)).await;
            }
            Request::LoginFinished { generation, result } => {
                if generation != self.generation {
                    debug!("ignoring login result for stale generation {generation}");
                    return;
                }
                if let Err(e) = &result {
                    warn!("login to {} failed: {e}", self.config.address());
                    self.emit(ConnectionEvent::Error(format!("login failed: {e}")));
                }
                if let Some(waiter) = self.connect_waiter.take() {
                    let _ = waiter.send(result);
                }
            }
            Request::Shutdown => {}
        }
    }

    async fn handle_inbound(&mut self, generation: u64, inbound: Inbound) {
        if generation != self.generation {
            debug!("dropping report from stale generation {generation}");
            return;
        }
        match inbound {
            Inbound::Connected(stream) => self.on_connected(stream).await,
            Inbound::Message(message) => self.handle_message(message),
            Inbound::Desync(e) => {
                warn!("undecodable data from {}: {e}", self.config.address());
                self.emit(ConnectionEvent::Error(e.to_string()));
                self.recover(RecoveryReason::ProtocolDesync, RconError::Protocol(e));
            }
            Inbound::Closed => {
                info!("{} closed the connection", self.config.address());
                self.emit(ConnectionEvent::Closed);
                self.recover(RecoveryReason::Closed, RconError::ConnectionReset);
            }
            Inbound::Failed(e) => {
                warn!("transport error on {}: {e}", self.config.address());
                self.emit(ConnectionEvent::Error(e.to_string()));
                self.recover(RecoveryReason::Transport, RconError::Transport(e));
            }
        }
    }

    // ── Connecting ────────────────────────────────────────────────────────────

    fn start_connect(&mut self) {
        self.generation += 1;
        info!("connecting to {}", self.config.address());
        let task = tokio::spawn(transport::connect(
            self.config.host.clone(),
            self.config.port,
            self.generation,
            self.inbound_tx.clone(),
        ));
        self.link = Link::Connecting {
            task,
            queued: Vec::new(),
        };
        self.connect_deadline = Some(Box::pin(time::sleep(self.config.connect_timeout)));
        self.set_state(ConnectionState::Connecting);
    }

    fn on_connect_timeout(&mut self) {
        self.connect_deadline = None;
        warn!(
            "no connection to {} after {:?}",
            self.config.address(),
            self.config.connect_timeout
        );
        self.emit(ConnectionEvent::Error("connect timeout".to_string()));
        self.recover(RecoveryReason::ConnectTimeout, RconError::ConnectTimeout);
    }

    async fn on_connected(&mut self, stream: TcpStream) {
        self.connect_deadline = None;
        self.reconnect = None;

        let queued = match std::mem::replace(&mut self.link, Link::Down) {
            Link::Connecting { queued, .. } => queued,
            _ => Vec::new(),
        };
        let (read_half, writer) = stream.into_split();
        let reader = tokio::spawn(transport::read_frames(
            read_half,
            Arc::clone(&self.codec),
            self.generation,
            self.inbound_tx.clone(),
        ));
        self.link = Link::Up { writer, reader };
        self.set_state(ConnectionState::Connected);
        info!("connected to {}", self.config.address());
        self.emit(ConnectionEvent::Connected {
            host: self.config.host.clone(),
            port: self.config.port,
        });

        self.heartbeat_outstanding = false;
        self.heartbeat = heartbeat_interval(self.config.heartbeat_interval);

        if !queued.is_empty() {
            debug!("flushing {} command(s) issued while connecting", queued.len());
        }
        for bytes in queued {
            if !self.write(&bytes).await {
                return;
            }
        }
        self.start_login();
    }

    /// Runs the module's login on its own task so the actor keeps serving
    /// the commands the login issues.
    fn start_login(&mut self) {
        let Some(module) = self.module.clone() else {
            if let Some(waiter) = self.connect_waiter.take() {
                let _ = waiter.send(Ok(()));
            }
            return;
        };
        let Some(requests) = self.handle.upgrade() else {
            debug!("no client handles left; skipping login");
            return;
        };

        let session = RconClient {
            requests,
            events: self.events.clone(),
            state: self.state.subscribe(),
            config: Arc::clone(&self.config),
        };
        let generation = self.generation;
        debug!("running {} login", module.name());
        tokio::spawn(async move {
            let result = module.login(&session).await;
            let _ = session.requests.send(Request::LoginFinished { generation, result });
        });
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Allocates an id, runs the exec hooks, registers the continuation,
    /// writes the frame (or queues it while connecting) and advances the
    /// counter.
    async fn send(&mut self, command: Command, pending: Option<Pending>) {
        if matches!(self.link, Link::Down) {
            warn!("cannot run '{command}': not connected to {}", self.config.address());
            self.emit(ConnectionEvent::Recovering(RecoveryReason::NotConnected));
            self.teardown();
            self.schedule_reconnect();
            if let Some(pending) = pending {
                self.fail(pending, RconError::NotConnected);
            }
            return;
        }

        let id = self.correlator.next_id();
        let message = Message::request(id, command.into_words());

        if self.hooks.iter().any(|hook| hook(&message) == HookDecision::Abort) {
            debug!("command {id} aborted by an exec hook");
            if let Some(pending) = pending {
                self.fail(pending, RconError::Aborted);
            }
            return;
        }

        let bytes = match self.codec.encode(&message) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("cannot encode command {id}: {e}");
                if let Some(pending) = pending {
                    self.fail(pending, RconError::Protocol(e));
                }
                return;
            }
        };

        debug!("-> {id} {}", message.words.join(" "));
        self.emit(ConnectionEvent::Exec(message));
        self.correlator.commit(id, pending);

        if let Link::Connecting { queued, .. } = &mut self.link {
            debug!("queueing command {id} until the connect finishes");
            queued.push(bytes);
            return;
        }
        self.write(&bytes).await;
    }

    /// Writes one frame to the open socket.  A failed write runs recovery.
    /// Returns whether the frame went out.
    async fn write(&mut self, bytes: &[u8]) -> bool {
        let Link::Up { writer, .. } = &mut self.link else {
            return false;
        };
        match transport::write_frame(writer, bytes).await {
            Ok(()) => true,
            Err(e) => {
                warn!("write to {} failed: {e}", self.config.address());
                self.emit(ConnectionEvent::Error(e.to_string()));
                self.recover(RecoveryReason::Transport, RconError::Transport(e));
                false
            }
        }
    }

    /// Resolves a continuation whose command never reached the wire.
    fn fail(&mut self, pending: Pending, error: RconError) {
        match pending {
            Pending::Caller(reply) => {
                let _ = reply.send(Err(error));
            }
            Pending::Heartbeat => self.heartbeat_outstanding = false,
        }
    }

    fn handle_message(&mut self, message: Message) {
        debug!("<- {} {}", message.sequence_id, message.words.join(" "));
        match self.correlator.dispatch(&message) {
            Dispatch::Event => {
                let translated = self
                    .module
                    .as_ref()
                    .and_then(|module| module.translate_event(&message));
                self.emit(ConnectionEvent::ServerEvent(message));
                if let Some(event) = translated {
                    self.emit(ConnectionEvent::Game(event));
                }
            }
            Dispatch::EmptyReply => {
                warn!("empty reply for sequence {}", message.sequence_id);
                self.emit(ConnectionEvent::Error(format!(
                    "empty reply for sequence {}",
                    message.sequence_id
                )));
            }
            Dispatch::Unsolicited => {
                debug!("no pending call for sequence {}", message.sequence_id);
                self.emit(ConnectionEvent::Message(message));
            }
            Dispatch::Resolved(pending, outcome) => {
                self.emit(ConnectionEvent::Message(message));
                match pending {
                    Pending::Caller(reply) => {
                        let _ = reply.send(outcome.map_err(RconError::from));
                    }
                    Pending::Heartbeat => self.on_heartbeat_reply(outcome.map_err(RconError::from)),
                }
            }
        }
    }

    // ── Heartbeat ─────────────────────────────────────────────────────────────

    async fn heartbeat_tick(&mut self) {
        if !matches!(self.link, Link::Up { .. }) {
            return;
        }
        if self.heartbeat_outstanding {
            warn!(
                "heartbeat to {} unanswered after {:?}",
                self.config.address(),
                self.config.heartbeat_interval
            );
            self.emit(ConnectionEvent::Error("heartbeat timed out".to_string()));
            self.recover(RecoveryReason::Heartbeat, RconError::ConnectionReset);
            return;
        }
        self.heartbeat_outstanding = true;
        self.send(Command::new(HEARTBEAT_COMMAND), Some(Pending::Heartbeat))
            .await;
    }

    /// An error reply or an empty `OK` both count as a dead server.
    fn on_heartbeat_reply(&mut self, result: Result<Vec<String>, RconError>) {
        self.heartbeat_outstanding = false;
        let failure = match result {
            Ok(words) if !words.is_empty() => {
                debug!("heartbeat ok: {}", words.join(" "));
                return;
            }
            Ok(_) => "heartbeat reply carried no payload".to_string(),
            Err(e) => format!("heartbeat failed: {e}"),
        };
        warn!("{failure}");
        self.emit(ConnectionEvent::Error(failure));
        self.recover(RecoveryReason::Heartbeat, RconError::ConnectionReset);
    }

    // ── Recovery ──────────────────────────────────────────────────────────────

    /// The single recovery path.  `error` completes a `connect()` still
    /// waiting on this attempt.
    fn recover(&mut self, reason: RecoveryReason, error: RconError) {
        info!("recovering connection to {}: {reason}", self.config.address());
        self.emit(ConnectionEvent::Recovering(reason));
        if let Some(waiter) = self.connect_waiter.take() {
            let _ = waiter.send(Err(error));
        }
        self.teardown();
        self.schedule_reconnect();
    }

    /// Drops the socket, its tasks and any queued frames, cancels the connect
    /// deadline and the heartbeat, and fails every pending call.  Safe to call repeatedly.
    fn teardown(&mut self) {
        match std::mem::replace(&mut self.link, Link::Down) {
            Link::Down => {}
            Link::Connecting { task, queued } => {
                task.abort();
                if !queued.is_empty() {
                    debug!("dropping {} command(s) queued for the failed connect", queued.len());
                }
            }
            Link::Up { writer, reader } => {
                reader.abort();
                drop(writer);
            }
        }
        self.generation += 1;
        self.connect_deadline = None;
        self.heartbeat = None;
        self.heartbeat_outstanding = false;

        let orphans = self.correlator.drain();
        if !orphans.is_empty() {
            debug!("failing {} pending call(s) with ConnectionReset", orphans.len());
        }
        for pending in orphans {
            if let Pending::Caller(reply) = pending {
                let _ = reply.send(Err(RconError::ConnectionReset));
            }
        }
        if let Some(waiter) = self.connect_waiter.take() {
            let _ = waiter.send(Err(RconError::ConnectionReset));
        }
        self.set_state(ConnectionState::Idle);
    }

    /// Arms the reconnect timer unless it is already armed.  Returns whether
    /// a new timer was armed.
    fn schedule_reconnect(&mut self) -> bool {
        if self.reconnect.is_some() {
            debug!("reconnect already scheduled");
            return false;
        }
        let delay = self.config.retry_delay;
        info!("reconnecting to {} in {delay:?}", self.config.address());
        self.reconnect = Some(Box::pin(time::sleep(delay)));
        self.emit(ConnectionEvent::ReconnectScheduled { delay });
        true
    }

    fn emit(&self, event: ConnectionEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("state {previous} -> {state}");
        }
    }
}

/// Waits for an optional timer; a disarmed timer never fires.
async fn wait_on(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

async fn tick_on(interval: &mut Option<Interval>) -> Instant {
    match interval {
        Some(interval) => interval.tick().await,
        None => pending().await,
    }
}

/// First tick one full period after connect.  A zero period disables the
/// heartbeat.
fn heartbeat_interval(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

// ── RconClient ────────────────────────────────────────────────────────────────

/// Handle to a connection engine.
///
/// Cloning is cheap; every clone talks to the same connection.  The engine
/// stops when the last handle is dropped or [`shutdown`](Self::shutdown) is
/// called.
///
/// # Example
///
/// ```no_run
/// use battlecon_client::{ClientConfig, RconClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RconClient::from_config(ClientConfig::new("203.0.113.10", 47200, "secret"))?;
/// client.connect().await?;
/// let version = client.exec("version").await?;
/// println!("{}", version.join(" "));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RconClient {
    requests: mpsc::UnboundedSender<Request>,
    events: broadcast::Sender<ConnectionEvent>,
    state: watch::Receiver<ConnectionState>,
    config: Arc<ClientConfig>,
}

impl RconClient {
    /// Starts configuring a client with no game module.
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// Builds a client with the game module named by `config.game`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownModule`] if no module answers to that name.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: ClientConfig) -> Result<Self, UnknownModule> {
        let options = ModuleOptions::from_config(&config);
        let module = match config.game.as_deref() {
            Some(name) => game_module::load(name, options)?,
            None => None,
        };
        let mut builder = Self::builder(config);
        if let Some(module) = module {
            builder = builder.module(module);
        }
        Ok(builder.build())
    }

    /// Opens the connection and, if a game module is attached, logs in.
    ///
    /// Resolves once the module's login has finished (or immediately after
    /// the TCP connect without a module).
    ///
    /// A failed login does not close the connection: the socket stays open,
    /// the state stays [`ConnectionState::Connected`] and the heartbeat keeps
    /// running.  Call [`disconnect`](Self::disconnect) to drop it.
    ///
    /// # Errors
    ///
    /// - [`RconError::AlreadyConnected`] if a socket or attempt exists.
    /// - [`RconError::ConnectTimeout`], [`RconError::Transport`] or
    ///   [`RconError::ConnectionReset`] if the attempt failed.  A reconnect is
    ///   already scheduled when this returns.
    /// - Whatever the module's login returned.
    pub async fn connect(&self) -> Result<(), RconError> {
        let (reply, rx) = oneshot::channel();
        self.request(Request::Connect { reply })?;
        rx.await.map_err(|_| RconError::Shutdown)?
    }

    /// Closes the connection and cancels any scheduled reconnect.  Pending
    /// calls fail with [`RconError::ConnectionReset`].
    pub async fn disconnect(&self) -> Result<(), RconError> {
        let (done, rx) = oneshot::channel();
        self.request(Request::Disconnect { done })?;
        rx.await.map_err(|_| RconError::Shutdown)
    }

    /// Runs a command and waits for its reply.
    ///
    /// On `OK` the words after the status are returned.
    ///
    /// # Errors
    ///
    /// - [`RconError::Rejected`] for any other status.
    /// - [`RconError::NotConnected`] if no socket is open and no connect is in
    ///   flight.  The engine also schedules a reconnect.  A command issued
    ///   while connecting is written as soon as the connect finishes.
    /// - [`RconError::Aborted`] if an exec hook vetoed the command.
    /// - [`RconError::ConnectionReset`] if the connection dropped first.
    pub async fn exec(&self, command: impl Into<Command>) -> Result<Vec<String>, RconError> {
        let (reply, rx) = oneshot::channel();
        self.request(Request::Exec {
            command: command.into(),
            reply: Some(reply),
        })?;
        rx.await.map_err(|_| RconError::Shutdown)?
    }

    /// Sends a command without waiting for (or registering interest in) its
    /// reply.  The reply is still published as [`ConnectionEvent::Message`].
    pub fn exec_detached(&self, command: impl Into<Command>) -> Result<(), RconError> {
        self.request(Request::Exec {
            command: command.into(),
            reply: None,
        })
    }

    /// Subscribes to engine events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Publishes an event to every subscriber.
    pub fn emit(&self, event: ConnectionEvent) {
        let _ = self.events.send(event);
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Stops the engine.  Pending calls fail with
    /// [`RconError::ConnectionReset`]; later calls on any handle fail with
    /// [`RconError::Shutdown`].
    pub fn shutdown(&self) {
        let _ = self.requests.send(Request::Shutdown);
    }

    fn request(&self, request: Request) -> Result<(), RconError> {
        self.requests.send(request).map_err(|_| RconError::Shutdown)
    }
}

impl std::fmt::Debug for RconClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RconClient")
            .field("address", &self.config.address())
            .field("state", &self.state())
            .finish()
    }
}

#[async_trait]
impl RconSession for RconClient {
    async fn exec(&self, command: Command) -> Result<Vec<String>, RconError> {
        RconClient::exec(self, command).await
    }

    fn emit(&self, event: ConnectionEvent) {
        RconClient::emit(self, event);
    }
}

// ── ClientBuilder ─────────────────────────────────────────────────────────────

/// Assembles an [`RconClient`]: codec, game module and exec hooks.
pub struct ClientBuilder {
    config: ClientConfig,
    codec: Arc<dyn MessageCodec>,
    module: Option<Arc<dyn GameModule>>,
    hooks: Vec<ExecHook>,
}

impl ClientBuilder {
    fn new(config: ClientConfig) -> Self {
        Self {
            config,
            codec: Arc::new(WordCodec),
            module: None,
            hooks: Vec::new(),
        }
    }

    /// Replaces the default [`WordCodec`].
    pub fn codec(mut self, codec: impl MessageCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Attaches a game module.
    pub fn module(mut self, module: Arc<dyn GameModule>) -> Self {
        self.module = Some(module);
        self
    }

    /// Adds a hook that sees every command before it is written.
    pub fn exec_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Message) -> HookDecision + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Spawns the connection actor and returns its handle.  Nothing connects
    /// until [`RconClient::connect`].
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> RconClient {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let config = Arc::new(self.config);

        let actor = ConnectionActor::new(
            Arc::clone(&config),
            self.codec,
            self.module,
            self.hooks,
            requests_rx,
            requests_tx.downgrade(),
            events.clone(),
            state_tx,
        );
        let span = info_span!("rcon", addr = %config.address());
        tokio::spawn(actor.run().instrument(span));

        RconClient {
            requests: requests_tx,
            events,
            state: state_rx,
            config,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
