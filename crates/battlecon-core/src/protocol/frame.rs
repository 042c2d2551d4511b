//! Stream framing for the RCON protocol.
//!
//! # Why a frame decoder is needed
//!
//! TCP is a *stream* protocol: a single `read()` may return half a packet,
//! exactly one packet, or several packets glued together.  The
//! [`FrameDecoder`] accumulates whatever arrives and hands out complete
//! frames only, in arrival order.
//!
//! Wire layout of one frame:
//!
//! ```text
//! [header:4][size:4][payload:size-8]
//! ```
//!
//! `size` is a little-endian `u32` holding the *total* frame length,
//! including the 8 bytes of header.  The decoder never looks inside the
//! payload; that is the codec's job.

use crate::protocol::codec::ProtocolError;
use crate::protocol::messages::{
    FLAG_FROM_SERVER, FLAG_RESPONSE, FRAME_HEADER_SIZE, MAX_FRAME_SIZE,
};
use crate::protocol::sequence::SequenceId;
use tracing::{debug, trace};

/// The 4-byte header word at the start of every frame, unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub sequence_id: SequenceId,
    pub from_server: bool,
    pub is_response: bool,
}

impl FrameHeader {
    /// Unpacks a raw header word.
    pub fn from_word(word: u32) -> Self {
        Self {
            sequence_id: SequenceId::new(word),
            from_server: word & FLAG_FROM_SERVER != 0,
            is_response: word & FLAG_RESPONSE != 0,
        }
    }

    /// Reads the header word from the first four bytes of `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InsufficientData`] if `frame` is shorter than
    /// four bytes.
    pub fn parse(frame: &[u8]) -> Result<Self, ProtocolError> {
        let word = read_u32_le(frame, 0)?;
        Ok(Self::from_word(word))
    }
}

/// Accumulates stream bytes and splits them into complete frames.
///
/// # Examples
///
/// ```rust
/// use battlecon_core::FrameDecoder;
///
/// let mut decoder = FrameDecoder::new();
/// let frame = [0u8, 0, 0, 0, 12, 0, 0, 0, 0, 0, 0, 0];
///
/// decoder.push(&frame[..5]);
/// assert_eq!(decoder.next_frame().unwrap(), None);
///
/// decoder.push(&frame[5..]);
/// assert_eq!(decoder.next_frame().unwrap(), Some(frame.to_vec()));
/// assert_eq!(decoder.buffered(), 0);
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    max_frame_size: usize,
}

impl FrameDecoder {
    /// Creates an empty decoder with the default [`MAX_FRAME_SIZE`].
    pub fn new() -> Self {
        Self::with_max_frame_size(MAX_FRAME_SIZE)
    }

    /// Creates an empty decoder that rejects frames larger than `max`.
    pub fn with_max_frame_size(max: usize) -> Self {
        Self {
            buf: Vec::with_capacity(4096),
            max_frame_size: max,
        }
    }

    /// Appends a chunk of stream bytes.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Splits the next complete frame off the front of the buffer.
    ///
    /// Returns `Ok(None)` when the buffer does not yet hold a complete
    /// frame; the partial bytes stay buffered for the next call.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidFrameSize`] when the declared size is
    /// smaller than the 8-byte header or larger than the configured maximum.
    /// The stream is desynchronised at that point; the buffer is left as-is
    /// and the caller is expected to drop the connection.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        if self.buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let size = read_u32_le(&self.buf, 4)? as usize;
        if size < FRAME_HEADER_SIZE || size > self.max_frame_size {
            debug!("rejecting frame with declared size {size}");
            return Err(ProtocolError::InvalidFrameSize {
                size,
                max: self.max_frame_size,
            });
        }
        if self.buf.len() < size {
            return Ok(None);
        }

        // `drain` shifts the remaining bytes to the front.  Frames are small,
        // so the copy is cheaper than keeping a separate read cursor.
        let frame: Vec<u8> = self.buf.drain(..size).collect();
        trace!("split {size}-byte frame, {} bytes left", self.buf.len());
        Ok(Some(frame))
    }

    /// Number of bytes currently buffered (always less than one frame after
    /// [`next_frame`](Self::next_frame) has returned `Ok(None)`).
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Discards any buffered bytes.  Called when a connection is torn down so
    /// a reconnect starts from a clean stream.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> Result<u32, ProtocolError> {
    if buf.len() < offset + 4 {
        return Err(ProtocolError::InsufficientData {
            needed: offset + 4,
            available: buf.len(),
        });
    }
    Ok(u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
