//! Message and command types carried by the RCON protocol.
//!
//! A Frostbite RCON conversation is a stream of *packets*, each holding a
//! list of words.  The first word of a command names it (`serverInfo`,
//! `admin.say`, …); the first word of a reply is a status (`OK`,
//! `InvalidArguments`, …).

use serde::{Deserialize, Serialize};

use crate::protocol::sequence::SequenceId;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size of the framing header: 4-byte header word + 4-byte total size.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Size of the packet header used by [`crate::WordCodec`]: framing header
/// plus the 4-byte word count.
pub const PACKET_HEADER_SIZE: usize = 12;

/// Largest frame the decoder accepts (1 MiB).
///
/// Stock servers never send more than 16 KiB in one packet; the limit only
/// exists so a corrupted size field cannot grow the receive buffer forever.
pub const MAX_FRAME_SIZE: usize = 1 << 20;

/// Header bit set when the exchange was initiated by the server.
pub const FLAG_FROM_SERVER: u32 = 0x8000_0000;

/// Header bit set when the packet is a response rather than a request.
pub const FLAG_RESPONSE: u32 = 0x4000_0000;

/// Status word the server uses for a successful reply.
pub const STATUS_OK: &str = "OK";

// ── Message ───────────────────────────────────────────────────────────────────

/// One decoded protocol packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sequence number pairing a request with its response.
    pub sequence_id: SequenceId,
    /// `true` when the server started this exchange (an event), `false` when
    /// the client did (a command and its reply).
    pub from_server: bool,
    /// `true` for the second half of an exchange.
    pub is_response: bool,
    /// The words of the packet, in order.
    pub words: Vec<String>,
}

impl Message {
    /// Builds a client-originated request, the shape of every outgoing
    /// command.
    pub fn request(sequence_id: SequenceId, words: Vec<String>) -> Self {
        Self {
            sequence_id,
            from_server: false,
            is_response: false,
            words,
        }
    }

    /// Returns the first word (command name or status), if any.
    pub fn head(&self) -> Option<&str> {
        self.words.first().map(String::as_str)
    }

    /// Packs the sequence id and flags into the 4-byte header word.
    pub fn header_word(&self) -> u32 {
        let mut header = self.sequence_id.get();
        if self.from_server {
            header |= FLAG_FROM_SERVER;
        }
        if self.is_response {
            header |= FLAG_RESPONSE;
        }
        header
    }
}

// ── Command ───────────────────────────────────────────────────────────────────

/// A command to run on the server: a name followed by zero or more
/// arguments.
///
/// Commands can be built word by word, or converted from a string, in which
/// case the string is split on whitespace (the same convenience the classic
/// JavaScript client offered).  Arguments containing spaces must be added
/// with [`Command::arg`].
///
/// # Examples
///
/// ```rust
/// use battlecon_core::Command;
///
/// let cmd = Command::new("admin.say").arg("hello world").arg("all");
/// assert_eq!(cmd.words(), ["admin.say", "hello world", "all"]);
///
/// let cmd: Command = "mapList.list 0".into();
/// assert_eq!(cmd.words(), ["mapList.list", "0"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    words: Vec<String>,
}

impl Command {
    /// Starts a command with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            words: vec![name.into()],
        }
    }

    /// Appends one argument verbatim.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.words.push(arg.into());
        self
    }

    /// Appends several arguments verbatim.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.extend(args.into_iter().map(Into::into));
        self
    }

    /// Returns the command name.
    pub fn name(&self) -> &str {
        self.words.first().map(String::as_str).unwrap_or_default()
    }

    /// Returns every word, name first.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Consumes the command, returning its words.
    pub fn into_words(self) -> Vec<String> {
        self.words
    }
}

impl From<&str> for Command {
    fn from(line: &str) -> Self {
        Self {
            words: line.split_whitespace().map(str::to_string).collect(),
        }
    }
}

impl From<String> for Command {
    fn from(line: String) -> Self {
        Self::from(line.as_str())
    }
}

impl From<Vec<String>> for Command {
    fn from(words: Vec<String>) -> Self {
        Self { words }
    }
}

impl<const N: usize> From<[&str; N]> for Command {
    fn from(words: [&str; N]) -> Self {
        Self {
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.words.join(" "))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
