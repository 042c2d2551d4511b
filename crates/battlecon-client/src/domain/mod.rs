//! Domain layer for battlecon-client.
//!
//! Plain types with no I/O: configuration, connection state, the events the
//! engine publishes and the errors callers can see.  Nothing in here touches
//! a socket or a timer, so all of it can be constructed freely in tests.

pub mod config;
pub mod error;
pub mod events;
pub mod state;

pub use config::{ClientConfig, ConfigError};
pub use error::{CommandError, RconError};
pub use events::{ConnectionEvent, GameEvent, RecoveryReason};
pub use state::ConnectionState;
