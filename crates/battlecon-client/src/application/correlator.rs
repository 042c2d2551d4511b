//! Request/response correlation.
//!
//! Every command goes out with a sequence id; the server echoes the id in its
//! reply.  The [`Correlator`] remembers which continuation is waiting on
//! which id and decides what each incoming message means.
//!
//! The correlator is generic over the continuation type `C` and performs no
//! I/O.  The connection actor owns the only instance, so the "resolved at
//! most once" guarantee comes from ownership: a continuation is moved out of
//! the table before anyone can act on it.

use std::collections::HashMap;

use battlecon_core::{Message, SequenceCounter, SequenceId, STATUS_OK};

use crate::domain::CommandError;

/// What a reply means for the command that caused it.
pub type Outcome = Result<Vec<String>, CommandError>;

/// What the caller should do with an incoming message.
#[derive(Debug)]
pub enum Dispatch<C> {
    /// Server-originated: publish as an event; no pending call is touched.
    Event,
    /// A reply with no words at all: a protocol anomaly, report and ignore.
    EmptyReply,
    /// A reply nobody is waiting for (unknown or already-resolved id).
    Unsolicited,
    /// A reply whose continuation has been removed from the table.
    Resolved(C, Outcome),
}

/// Table of outstanding commands keyed by sequence id.
#[derive(Debug)]
pub struct Correlator<C> {
    sequence: SequenceCounter,
    pending: HashMap<SequenceId, C>,
}

impl<C> Correlator<C> {
    /// Creates an empty table whose first id is `0x3FFF_FFFF`.
    pub fn new() -> Self {
        Self::with_counter(SequenceCounter::new())
    }

    /// Creates an empty table using `sequence` for id allocation.
    pub fn with_counter(sequence: SequenceCounter) -> Self {
        Self {
            sequence,
            pending: HashMap::new(),
        }
    }

    /// Returns the id the next command should carry.
    ///
    /// Ids still awaiting a reply are skipped, so a wrap-around can never
    /// hand out an id that is already in the table.  The id is not consumed
    /// until [`commit`](Self::commit).
    pub fn next_id(&mut self) -> SequenceId {
        let pending = &self.pending;
        self.sequence.skip_while(|id| pending.contains_key(&id));
        self.sequence.current()
    }

    /// Records that the command with `id` was written, registering its
    /// continuation if it has one, and advances the counter.
    pub fn commit(&mut self, id: SequenceId, continuation: Option<C>) {
        if let Some(c) = continuation {
            self.pending.insert(id, c);
        }
        self.sequence.advance();
    }

    /// Number of registered continuations.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Classifies an incoming message, removing the matching continuation
    /// (if any) from the table before returning it.
    pub fn dispatch(&mut self, message: &Message) -> Dispatch<C> {
        if message.from_server {
            return Dispatch::Event;
        }
        if message.words.is_empty() {
            return Dispatch::EmptyReply;
        }
        match self.pending.remove(&message.sequence_id) {
            Some(continuation) => Dispatch::Resolved(continuation, outcome(&message.words)),
            None => Dispatch::Unsolicited,
        }
    }

    /// Removes and returns every registered continuation.
    pub fn drain(&mut self) -> Vec<C> {
        self.pending.drain().map(|(_, c)| c).collect()
    }
}

impl<C> Default for Correlator<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// `OK` → the remaining words; anything else → a [`CommandError`] carrying
/// all words.
pub fn outcome(words: &[String]) -> Outcome {
    match words.split_first() {
        Some((status, rest)) if status == STATUS_OK => Ok(rest.to_vec()),
        _ => Err(CommandError::from_words(words)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
