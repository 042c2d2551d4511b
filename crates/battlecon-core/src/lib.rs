//! # battlecon-core
//!
//! Wire-level building blocks for talking to a Frostbite (Battlefield 3/4,
//! Hardline) remote console.
//!
//! This crate has no dependencies on sockets, timers or async runtimes.  It
//! turns bytes into messages and back; everything stateful about a live
//! connection lives in `battlecon-client`.
//!
//! # Architecture overview
//!
//! - **`protocol::frame`** – Splits an arbitrarily chunked TCP byte stream
//!   into complete frames.  A frame is `[header:4][size:4][payload]`, where
//!   `size` is the little-endian total length including the 8 header bytes.
//!
//! - **`protocol::codec`** – The [`MessageCodec`] seam plus [`WordCodec`],
//!   the default implementation of the Frostbite word encoding.
//!
//! - **`protocol::messages`** – [`Message`] (what travels on the wire) and
//!   [`Command`] (what a caller asks the server to run).
//!
//! - **`protocol::sequence`** – 30-bit sequence numbers used to pair a
//!   command with its reply.
//!
//! - **`tabulate`** – Turns the column/row word lists that list-style
//!   commands return into rows keyed by column name.

pub mod protocol;
pub mod tabulate;

pub use protocol::codec::{decode_message, encode_message, MessageCodec, WordCodec};
pub use protocol::frame::{FrameDecoder, FrameHeader};
pub use protocol::messages::{Command, Message, STATUS_OK};
pub use protocol::sequence::{SequenceCounter, SequenceId};
pub use protocol::ProtocolError;
pub use tabulate::{tabulate, Table};
