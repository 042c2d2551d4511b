//! TCP plumbing for the RCON connection.
//!
//! # Binary streaming protocol
//!
//! TCP is a *stream* protocol: a single `read()` call may return less than one
//! complete RCON frame, or several frames at once.  [`read_frames`] feeds
//! every chunk into a [`FrameDecoder`], which only ever hands out complete
//! frames, and decodes each frame with the configured [`MessageCodec`].
//!
//! # Generations
//!
//! The connection actor opens a new socket for every (re)connect.  Each
//! socket's tasks tag what they report with the *generation* they were
//! started for, so the actor can drop anything a torn-down socket still
//! manages to deliver.

use std::io;
use std::sync::Arc;

use battlecon_core::{FrameDecoder, Message, MessageCodec, ProtocolError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Size of the scratch buffer handed to each `read()` call.
const READ_CHUNK: usize = 4096;

/// What a socket task reports back to the connection actor.
#[derive(Debug)]
pub enum Inbound {
    /// The TCP connect finished.
    Connected(TcpStream),
    /// A complete, decoded message.
    Message(Message),
    /// A complete frame could not be framed or decoded.  Nothing more will be
    /// read from this socket.
    Desync(ProtocolError),
    /// The server closed the connection (EOF).
    Closed,
    /// The connect or a read failed.
    Failed(io::Error),
}

/// Channel on which socket tasks report to the actor, tagged by generation.
pub type InboundSender = mpsc::UnboundedSender<(u64, Inbound)>;

/// Opens a TCP connection and reports the outcome on `tx`.
pub async fn connect(host: String, port: u16, generation: u64, tx: InboundSender) {
    let inbound = match TcpStream::connect((host.as_str(), port)).await {
        Ok(stream) => {
            if let Err(e) = stream.set_nodelay(true) {
                debug!("could not set TCP_NODELAY on {host}:{port}: {e}");
            }
            Inbound::Connected(stream)
        }
        Err(e) => Inbound::Failed(e),
    };
    let _ = tx.send((generation, inbound));
}

/// Reads frames from the socket until EOF, a read error or a decode error,
/// forwarding each decoded message in arrival order.
pub async fn read_frames(
    mut read_half: OwnedReadHalf,
    codec: Arc<dyn MessageCodec>,
    generation: u64,
    tx: InboundSender,
) {
    let mut decoder = FrameDecoder::new();
    let mut read_tmp = vec![0u8; READ_CHUNK];

    loop {
        let n = match read_half.read(&mut read_tmp).await {
            Ok(0) => {
                debug!("generation {generation}: server closed the connection (EOF)");
                let _ = tx.send((generation, Inbound::Closed));
                return;
            }
            Ok(n) => n,
            Err(e) => {
                warn!("generation {generation}: read failed: {e}");
                let _ = tx.send((generation, Inbound::Failed(e)));
                return;
            }
        };

        decoder.push(&read_tmp[..n]);

        loop {
            let inbound = match decoder.next_frame() {
                Ok(None) => break,
                Ok(Some(frame)) => match codec.decode(&frame) {
                    Ok(message) => {
                        trace!("generation {generation}: decoded {message:?}");
                        Inbound::Message(message)
                    }
                    Err(e) => Inbound::Desync(e),
                },
                Err(e) => Inbound::Desync(e),
            };

            let stop = matches!(inbound, Inbound::Desync(_));
            if tx.send((generation, inbound)).is_err() {
                debug!("generation {generation}: actor gone; exiting reader");
                return;
            }
            if stop {
                return;
            }
        }
    }
}

/// Writes one encoded frame, all bytes or an error.
pub async fn write_frame(write_half: &mut OwnedWriteHalf, bytes: &[u8]) -> io::Result<()> {
    write_half.write_all(bytes).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
