//! One game bound to one connection
//!
//! A session owns its board outright. Requests are read one line at a time and
//! answered in order; nothing is shared with any other session, so no locking
//! is involved anywhere on this path.
//!
//! The per-request logic lives in [`Session::handle_line`], which is pure and
//! returns the lines to send. [`Session::run`] drives it over a byte stream and
//! inserts the mismatch announcement delay.

use crate::board::{Board, BoardError, RevealOutcome};
use log::{debug, info, warn};
use shared::{Coord, Message};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

/// Default pause between the second `CARD` of a mismatched pair and `MISMATCH`
pub const DEFAULT_MISMATCH_DELAY: Duration = Duration::from_millis(1000);

/// Longest request line accepted, excluding the line terminator
pub const MAX_REQUEST_LEN: usize = 256;

/// Parameters applied identically to every session of a server
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub dim: usize,
    pub mismatch_delay: Duration,
    /// Log the solution when a board is dealt
    pub cheat: bool,
}

impl SessionConfig {
    /// Validates the board dimension up front so bad configuration is caught
    /// before any connection is accepted.
    pub fn new(dim: usize, mismatch_delay: Duration, cheat: bool) -> Result<Self, BoardError> {
        if !shared::is_valid_dim(dim) {
            return Err(BoardError::InvalidDimension(dim));
        }
        Ok(Self {
            dim,
            mismatch_delay,
            cheat,
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dim: 4,
            mismatch_delay: DEFAULT_MISMATCH_DELAY,
            cheat: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitFirstReveal,
    AwaitSecondReveal,
    GameOver,
}

/// Lines to send back for one request
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Sent right away, in order
    pub immediate: Vec<Message>,
    /// Sent after the mismatch delay
    pub delayed: Option<Message>,
    /// The session ends once the reply is out
    pub finished: bool,
}

impl Reply {
    fn error(reason: impl std::fmt::Display) -> Self {
        Self {
            immediate: vec![Message::error(reason)],
            ..Self::default()
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    GameOver,
    Disconnected,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Session {
    id: u32,
    board: Board,
    state: SessionState,
    mismatch_delay: Duration,
}

impl Session {
    /// Deals a fresh board for a new session.
    pub fn new(id: u32, config: &SessionConfig) -> Result<Self, BoardError> {
        let board = Board::new(config.dim)?;
        if config.cheat {
            info!("Session {} solution:\n{}", id, board.solution());
        }
        Ok(Self::with_board(id, board, config.mismatch_delay))
    }

    pub fn with_board(id: u32, board: Board, mismatch_delay: Duration) -> Self {
        Self {
            id,
            board,
            state: SessionState::AwaitFirstReveal,
            mismatch_delay,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// First line of every session
    pub fn greeting(&self) -> Message {
        Message::BoardDim {
            dim: self.board.dim(),
        }
    }

    /// Decodes one request line and applies it to the board.
    ///
    /// Malformed lines and illegal moves produce a single `ERROR` and change nothing.
    pub fn handle_line(&mut self, line: &str) -> Reply {
        let request = match line.parse::<Message>() {
            Ok(request) => request,
            Err(e) => {
                warn!("Session {}: malformed request {:?}: {}", self.id, line, e);
                return Reply::error(e);
            }
        };

        match request {
            Message::Reveal(at) => self.handle_reveal(at),
            other => {
                warn!("Session {}: unexpected {} from client", self.id, other.tag());
                Reply::error(format!("Unexpected message {}", other.tag()))
            }
        }
    }

    fn handle_reveal(&mut self, at: Coord) -> Reply {
        debug!("Session {}: reveal {}", self.id, at);

        let outcome = match self.board.reveal(at) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Session {}: illegal move: {}", self.id, e);
                return Reply::error(e);
            }
        };

        let (at, letter) = outcome.revealed();
        let mut reply = Reply {
            immediate: vec![Message::Card { at, letter }],
            ..Reply::default()
        };

        match outcome {
            RevealOutcome::Single { .. } => {
                self.state = SessionState::AwaitSecondReveal;
            }
            RevealOutcome::Match { .. } => {
                reply.immediate.push(Message::Match);
                if self.board.is_game_over() {
                    reply.immediate.push(Message::GameOver);
                    reply.finished = true;
                    self.state = SessionState::GameOver;
                } else {
                    self.state = SessionState::AwaitFirstReveal;
                }
            }
            RevealOutcome::Mismatch { first, second, .. } => {
                // Hide the pair now; the delay only affects when the client hears about it.
                match self.board.conceal(first, second) {
                    Ok(()) => reply.delayed = Some(Message::Mismatch { first, second }),
                    Err(e) => reply.immediate.push(Message::error(e)),
                }
                self.state = SessionState::AwaitFirstReveal;
            }
        }

        reply
    }

    /// Plays the session over `stream` until the game is won or the peer goes away.
    ///
    /// There is no read timeout: a silent client keeps its session open.
    pub async fn run<S>(mut self, stream: S) -> Result<SessionEnd, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::with_capacity(MAX_REQUEST_LEN + 1);

        send(&mut writer, &self.greeting()).await?;

        loop {
            let reply = match read_frame(&mut reader, &mut buf).await? {
                Frame::Line(line) => self.handle_line(&line),
                Frame::TooLong => {
                    warn!("Session {}: request longer than {} bytes", self.id, MAX_REQUEST_LEN);
                    Reply::error(format!("Request longer than {} bytes", MAX_REQUEST_LEN))
                }
                Frame::Closed => break,
            };

            for message in &reply.immediate {
                send(&mut writer, message).await?;
            }

            if let Some(message) = &reply.delayed {
                tokio::time::sleep(self.mismatch_delay).await;
                send(&mut writer, message).await?;
            }

            if reply.finished {
                writer.shutdown().await?;
                info!(
                    "Session {}: game over after {} matches",
                    self.id,
                    self.board.matches()
                );
                return Ok(SessionEnd::GameOver);
            }
        }

        debug!("Session {}: peer closed the connection", self.id);
        Ok(SessionEnd::Disconnected)
    }
}

enum Frame {
    Line(String),
    TooLong,
    Closed,
}

/// Reads one request line, decoding invalid UTF-8 lossily so it reaches the
/// codec as a malformed request rather than failing the transport.
///
/// An oversized line is consumed up to its terminator and reported as `TooLong`.
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let limit = MAX_REQUEST_LEN as u64 + 2;
    if (&mut *reader).take(limit).read_until(b'\n', buf).await? == 0 {
        return Ok(Frame::Closed);
    }

    let line = trim_terminator(buf);
    if line.len() > MAX_REQUEST_LEN {
        while buf.last() != Some(&b'\n') {
            buf.clear();
            if (&mut *reader).take(limit).read_until(b'\n', buf).await? == 0 {
                break;
            }
        }
        return Ok(Frame::TooLong);
    }

    Ok(Frame::Line(String::from_utf8_lossy(line).into_owned()))
}

fn trim_terminator(buf: &[u8]) -> &[u8] {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    line.strip_suffix(b"\r").unwrap_or(line)
}

async fn send<W>(writer: &mut W, message: &Message) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(message.to_line().as_bytes()).await?;
    writer.flush().await
}
