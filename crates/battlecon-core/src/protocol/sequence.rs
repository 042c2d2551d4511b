//! Sequence numbers for pairing commands with their replies.
//!
//! # What is a sequence number? (for beginners)
//!
//! Every command the client sends carries an integer called a *sequence
//! number*.  The server copies it into the reply, which is how the client
//! knows which of several outstanding commands a reply belongs to.
//!
//! Frostbite packs the sequence number into the low 30 bits of the frame
//! header; the two high bits are flags.  The counter therefore wraps at
//! 2^30, not at `u32::MAX`.
//!
//! # Ownership
//!
//! Unlike a shared atomic counter, [`SequenceCounter`] is a plain value
//! owned by exactly one task (the connection actor).  Allocation needs to
//! consult the table of outstanding calls anyway, so there is nothing to
//! gain from making the counter itself lock-free.

use serde::{Deserialize, Serialize};

/// Number of distinct sequence ids (2^30).
pub const SEQUENCE_MODULUS: u32 = 1 << 30;

/// Bit mask selecting the sequence id out of a frame header.
pub const SEQUENCE_MASK: u32 = SEQUENCE_MODULUS - 1;

/// A 30-bit sequence id.
///
/// Construction masks off the flag bits, so a `SequenceId` is always in
/// `[0, 2^30)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(u32);

impl SequenceId {
    /// Creates a sequence id, discarding anything above bit 29.
    pub fn new(raw: u32) -> Self {
        Self(raw & SEQUENCE_MASK)
    }

    /// Returns the raw 30-bit value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Returns the id that follows this one, wrapping at 2^30.
    pub fn next(self) -> Self {
        Self::new(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for SequenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A wrapping counter handing out [`SequenceId`]s.
///
/// The counter separates *peeking* at the next id from *advancing* past it.
/// A command is only committed after its pre-write hooks have run; if a
/// hook aborts the command, the id is never advanced and will be reused by
/// the next command.
///
/// # Examples
///
/// ```rust
/// use battlecon_core::protocol::SequenceCounter;
///
/// let mut counter = SequenceCounter::new();
/// let first = counter.current();
/// counter.advance();
/// assert_eq!(counter.current(), first.next());
/// ```
#[derive(Debug, Clone)]
pub struct SequenceCounter {
    current: SequenceId,
}

impl SequenceCounter {
    /// Creates a counter positioned at the highest 30-bit id, so the first
    /// command is `0x3FFF_FFFF` and the second wraps to 0.
    pub fn new() -> Self {
        Self::starting_at(SequenceId::new(SEQUENCE_MASK))
    }

    /// Creates a counter whose next id is `start`.
    pub fn starting_at(start: SequenceId) -> Self {
        Self { current: start }
    }

    /// Returns the id the next command will use, without consuming it.
    pub fn current(&self) -> SequenceId {
        self.current
    }

    /// Moves past the current id.
    pub fn advance(&mut self) {
        self.current = self.current.next();
    }

    /// Moves forward until `in_use` returns `false` for the current id.
    ///
    /// Gives up after one full lap, which can only happen if 2^30 calls are
    /// outstanding at once.
    pub fn skip_while(&mut self, mut in_use: impl FnMut(SequenceId) -> bool) {
        for _ in 0..SEQUENCE_MODULUS {
            if !in_use(self.current) {
                return;
            }
            self.advance();
        }
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}
