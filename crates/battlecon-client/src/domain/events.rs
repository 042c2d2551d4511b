//! Events published by the connection engine.
//!
//! Any number of observers can subscribe with
//! [`RconClient::subscribe`](crate::RconClient::subscribe).  Events are
//! informational: nothing an observer does with them can change what the
//! engine does next.  (The one exception, vetoing a command before it is
//! written, goes through an exec hook instead.)

use std::time::Duration;

use battlecon_core::Message;
use serde::Serialize;

/// Why the recovery path (teardown + scheduled reconnect) ran.
///
/// All reasons lead to the same behaviour; the classification exists so
/// observers and logs can tell a dead link from a corrupted stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryReason {
    /// The TCP connect did not complete before the connect deadline.
    ConnectTimeout,
    /// The heartbeat command failed, came back empty, or went unanswered.
    Heartbeat,
    /// A complete frame could not be framed or decoded.
    ProtocolDesync,
    /// The socket reported an error.
    Transport,
    /// The server closed the connection.
    Closed,
    /// A command was issued while no socket existed.
    NotConnected,
}

impl std::fmt::Display for RecoveryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ConnectTimeout => "connect timeout",
            Self::Heartbeat => "heartbeat failure",
            Self::ProtocolDesync => "protocol desync",
            Self::Transport => "transport error",
            Self::Closed => "connection closed",
            Self::NotConnected => "command issued while disconnected",
        };
        f.write_str(s)
    }
}

/// A server event translated by a game module into a named event.
///
/// `player.onChat Bob "gg" all` becomes `GameEvent { name: "player.chat",
/// args: ["Bob", "gg", "all"] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameEvent {
    pub name: String,
    pub args: Vec<String>,
}

/// Everything the engine announces.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ConnectionEvent {
    /// The TCP connection is open.
    Connected { host: String, port: u16 },
    /// The server closed the TCP connection.
    Closed,
    /// Something went wrong; connection-level errors are followed by
    /// [`ConnectionEvent::Recovering`].
    Error(String),
    /// A reply to a client command (matched or not).
    Message(Message),
    /// A message the server originated.
    ServerEvent(Message),
    /// A server event translated by the game module.
    Game(GameEvent),
    /// A command is about to be written.
    Exec(Message),
    /// The game module finished authenticating.
    LoggedIn,
    /// The game module finished its whole post-connect handshake.
    Ready,
    /// The recovery path ran.
    Recovering(RecoveryReason),
    /// A reconnect attempt has been scheduled.
    ReconnectScheduled { delay: Duration },
}
