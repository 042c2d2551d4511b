//! Infrastructure layer for battlecon-client.
//!
//! Everything that touches a socket or a timer lives here.
//!
//! # Responsibilities
//!
//! - Opening the TCP connection and splitting the stream into frames
//! - Writing encoded commands
//! - Running the connection actor: heartbeat, connect deadline, reconnect
//! - Handing out [`RconClient`] handles
//!
//! # What does NOT belong here?
//!
//! - Pairing replies with commands (that is the application layer)
//! - Game-specific login and event names (game modules)
//! - The wire encoding itself (`battlecon-core`)

pub mod connection;
pub mod transport;

pub use connection::{ClientBuilder, ExecHook, HookDecision, RconClient, EVENT_CAPACITY};
