//! Protocol module containing message types, framing and the word codec.

pub mod codec;
pub mod frame;
pub mod messages;
pub mod sequence;

pub use codec::{decode_message, encode_message, MessageCodec, ProtocolError, WordCodec};
pub use frame::{FrameDecoder, FrameHeader};
pub use messages::*;
pub use sequence::{SequenceCounter, SequenceId};
