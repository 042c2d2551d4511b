//! Errors surfaced to callers of the connection engine.
//!
//! # Two kinds of failure
//!
//! - **Application errors** – the server understood the command and answered
//!   with a status other than `OK`.  These are [`CommandError`]s, scoped to the
//!   one command that caused them.  The engine never retries them.
//! - **Connection errors** – the socket, the framing or the heartbeat failed.
//!   The engine handles these itself by tearing the socket down and scheduling
//!   a reconnect; callers only see them as the error of whatever they were
//!   waiting on at the time (`ConnectionReset`, `Transport`, …).

use battlecon_core::ProtocolError;
use thiserror::Error;

/// A non-`OK` reply from the server.
///
/// `Display` prints every reply word joined by single spaces, so a bare
/// `["InvalidCommand"]` reply displays as `InvalidCommand`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    /// The first reply word, e.g. `InvalidArguments`.
    pub status: String,
    /// All reply words joined with spaces.
    pub message: String,
}

impl CommandError {
    /// Builds the error for a rejected reply.
    pub fn from_words(words: &[String]) -> Self {
        Self {
            status: words.first().cloned().unwrap_or_default(),
            message: words.join(" "),
        }
    }
}

/// Every way an engine call can fail.
#[derive(Debug, Error)]
pub enum RconError {
    /// The server answered with a non-`OK` status.
    #[error(transparent)]
    Rejected(#[from] CommandError),

    /// The command was issued while no socket was open.
    #[error("not connected to the server")]
    NotConnected,

    /// `connect` was called while a socket or connect attempt already exists.
    #[error("a connection is already open or being opened")]
    AlreadyConnected,

    /// A pre-execute hook vetoed the command; nothing was written.
    #[error("command aborted before it was sent")]
    Aborted,

    /// The connection was torn down before the reply arrived.
    #[error("connection reset before a reply arrived")]
    ConnectionReset,

    /// The transport did not confirm the connection before the deadline.
    #[error("timed out connecting to the server")]
    ConnectTimeout,

    /// A socket-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The command could not be encoded, or the stream could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The connection task has stopped; the client handle is unusable.
    #[error("connection engine has shut down")]
    Shutdown,
}

impl RconError {
    /// Returns the server's status word for a rejected command.
    pub fn status(&self) -> Option<&str> {
        match self {
            Self::Rejected(e) => Some(&e.status),
            _ => None,
        }
    }
}
