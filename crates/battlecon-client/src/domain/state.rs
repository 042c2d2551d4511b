//! Transport-level connection state.

use serde::Serialize;

/// Where the connection engine is in its socket lifecycle.
///
/// Game-level phases such as "logged in" or "ready" are not states of the
/// engine; game modules announce them with
/// [`ConnectionEvent::LoggedIn`](crate::domain::ConnectionEvent::LoggedIn) and
/// [`ConnectionEvent::Ready`](crate::domain::ConnectionEvent::Ready).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No socket.  A reconnect may be scheduled.
    #[default]
    Idle,
    /// A TCP connect is in flight and the connect deadline is armed.
    Connecting,
    /// The socket is open and the heartbeat is running.
    Connected,
    /// The socket is being torn down.
    Closing,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
        };
        f.write_str(s)
    }
}
