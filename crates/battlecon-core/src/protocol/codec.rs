//! Binary codec for encoding and decoding RCON packets.
//!
//! Wire format of one packet (all integers little-endian):
//! ```text
//! [header:4][size:4][word_count:4] then word_count × [len:4][bytes:len][0x00]
//! ```
//! `header` holds the 30-bit sequence id plus the from-server (bit 31) and
//! response (bit 30) flags.  `size` is the total packet length.
//!
//! The connection engine only depends on the [`MessageCodec`] trait, so a
//! different payload encoding can be swapped in without touching framing,
//! correlation or reconnect logic.

use thiserror::Error;

use crate::protocol::frame::{read_u32_le, FrameHeader};
use crate::protocol::messages::{Message, MAX_FRAME_SIZE, PACKET_HEADER_SIZE};

/// Errors that can occur during framing, encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// A frame declared (or would need) a size outside the accepted range.
    #[error("invalid frame size {size} (allowed: 8..={max})")]
    InvalidFrameSize { size: usize, max: usize },

    /// The payload could not be parsed.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The size field does not match the number of bytes in the frame.
    #[error("packet length mismatch: header says {declared}, frame has {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },
}

/// Converts between complete frames and [`Message`]s.
///
/// Implementations must be stateless with respect to the stream: the frame
/// decoder guarantees that `decode` only ever sees exactly one whole frame.
#[cfg_attr(test, mockall::automock)]
pub trait MessageCodec: Send + Sync {
    /// Decodes one complete frame.
    fn decode(&self, frame: &[u8]) -> Result<Message, ProtocolError>;

    /// Encodes a message into one complete frame.
    fn encode(&self, message: &Message) -> Result<Vec<u8>, ProtocolError>;
}

/// The standard Frostbite word codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCodec;

impl MessageCodec for WordCodec {
    fn decode(&self, frame: &[u8]) -> Result<Message, ProtocolError> {
        decode_message(frame)
    }

    fn encode(&self, message: &Message) -> Result<Vec<u8>, ProtocolError> {
        encode_message(message)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`Message`] into a complete packet.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidFrameSize`] if the packet would exceed
/// [`MAX_FRAME_SIZE`].
///
/// # Examples
///
/// ```rust
/// use battlecon_core::{decode_message, encode_message, Message, SequenceId};
///
/// let msg = Message::request(SequenceId::new(1), vec!["serverInfo".into()]);
/// let bytes = encode_message(&msg).unwrap();
/// assert_eq!(bytes.len(), 12 + 4 + "serverInfo".len() + 1);
/// assert_eq!(decode_message(&bytes).unwrap(), msg);
/// ```
pub fn encode_message(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let size = PACKET_HEADER_SIZE
        + message
            .words
            .iter()
            .map(|w| 4 + w.len() + 1)
            .sum::<usize>();
    if size > MAX_FRAME_SIZE {
        return Err(ProtocolError::InvalidFrameSize {
            size,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut buf = Vec::with_capacity(size);
    buf.extend_from_slice(&message.header_word().to_le_bytes());
    buf.extend_from_slice(&(size as u32).to_le_bytes());
    buf.extend_from_slice(&(message.words.len() as u32).to_le_bytes());
    for word in &message.words {
        buf.extend_from_slice(&(word.len() as u32).to_le_bytes());
        buf.extend_from_slice(word.as_bytes());
        buf.push(0x00);
    }
    Ok(buf)
}

/// Decodes exactly one complete packet.
///
/// Word bytes are converted lossily: servers relay player names and chat
/// verbatim, and a single odd byte must not cost the whole connection.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the packet is truncated, its size field
/// disagrees with the frame length, or a word overruns the packet or lacks
/// its terminator.
pub fn decode_message(frame: &[u8]) -> Result<Message, ProtocolError> {
    if frame.len() < PACKET_HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: PACKET_HEADER_SIZE,
            available: frame.len(),
        });
    }

    let header = FrameHeader::parse(frame)?;
    let declared = read_u32_le(frame, 4)? as usize;
    if declared != frame.len() {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared,
            available: frame.len(),
        });
    }

    let word_count = read_u32_le(frame, 8)? as usize;
    // Each word takes at least 5 bytes, which bounds the allocation below.
    let max_words = (frame.len() - PACKET_HEADER_SIZE) / 5;
    if word_count > max_words {
        return Err(ProtocolError::MalformedPayload(format!(
            "{word_count} words cannot fit in {} payload bytes",
            frame.len() - PACKET_HEADER_SIZE
        )));
    }

    let mut words = Vec::with_capacity(word_count);
    let mut offset = PACKET_HEADER_SIZE;
    for index in 0..word_count {
        let len = read_u32_le(frame, offset)
            .map_err(|_| ProtocolError::MalformedPayload(format!("word {index}: length cut off")))?
            as usize;
        let start = offset + 4;
        let end = start + len;
        if end >= frame.len() {
            return Err(ProtocolError::MalformedPayload(format!(
                "word {index}: {len} bytes at offset {start} overrun the packet"
            )));
        }
        if frame[end] != 0x00 {
            return Err(ProtocolError::MalformedPayload(format!(
                "word {index}: missing terminator"
            )));
        }
        words.push(String::from_utf8_lossy(&frame[start..end]).into_owned());
        offset = end + 1;
    }

    if offset != frame.len() {
        return Err(ProtocolError::MalformedPayload(format!(
            "{} trailing bytes after last word",
            frame.len() - offset
        )));
    }

    Ok(Message {
        sequence_id: header.sequence_id,
        from_server: header.from_server,
        is_response: header.is_response,
        words,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
