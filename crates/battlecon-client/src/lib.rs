//! battlecon-client library crate.
//!
//! A self-healing client for the Frostbite remote console (Battlefield 3, 4
//! and Hardline game servers).  It keeps one TCP connection alive, pairs
//! every reply with the command that caused it, and republishes everything
//! the server pushes as events.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! caller ── exec("serverInfo") ──▶ RconClient
//!                                     │
//! [battlecon-client]                  ▼
//!   ├── domain/           ClientConfig, ConnectionState, events, errors
//!   ├── application/      Correlator, GameModule seam, FrostbiteModule
//!   └── infrastructure/
//!         ├── connection/ The connection actor and its handle
//!         └── transport/  TCP reader task (FrameDecoder + codec)
//!                                     │
//! [battlecon-core]                    ▼
//!   frames, word codec, sequence ids, tabulate
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `battlecon-core` only.
//! - `infrastructure` depends on all other layers plus `tokio`.
//!
//! # For beginners: what is "self-healing"?
//!
//! Game servers restart, networks blip.  Rather than handing every caller a
//! dead socket, the engine notices (failed connect, failed heartbeat,
//! garbage on the wire, closed socket), fails whatever was in flight, and
//! reconnects on its own after a fixed delay.  Callers see one error for the
//! one command that was unlucky, and the next command works again.

/// Domain layer: configuration, state, events and errors.
pub mod domain;

/// Application layer: reply correlation and game modules.
pub mod application;

/// Infrastructure layer: sockets, timers and the connection actor.
pub mod infrastructure;

pub use application::game_module::{load as load_module, GameModule, ModuleOptions, RconSession};
pub use application::FrostbiteModule;
pub use battlecon_core::{Command, Message};
pub use domain::{
    ClientConfig, CommandError, ConnectionEvent, ConnectionState, GameEvent, RconError,
    RecoveryReason,
};
pub use infrastructure::{ClientBuilder, HookDecision, RconClient};
