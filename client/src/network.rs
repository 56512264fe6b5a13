use crate::game::{ClientGameState, Status, ViewEvent};
use log::{debug, info, warn};
use shared::{Coord, Message, ProtocolError};
use thiserror::Error;
use tokio::io::{
    split, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines, ReadHalf,
    WriteHalf,
};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("handshake failed: {0}")]
    Handshake(String),
}

/// Client end of one game session
///
/// Sends reveal requests for cells the local state says are still face-down,
/// and turns server lines into [`ViewEvent`]s for whatever is drawing the board.
pub struct Client<S> {
    lines: Lines<BufReader<ReadHalf<S>>>,
    writer: WriteHalf<S>,
    state: ClientGameState,
}

impl Client<TcpStream> {
    pub async fn connect(server_addr: &str) -> Result<Self, ClientError> {
        info!("Connecting to {}...", server_addr);
        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;
        Self::handshake(stream).await
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Waits for the server's `BOARD_DIM` line and sets up the local board.
    pub async fn handshake(stream: S) -> Result<Self, ClientError> {
        let (reader, writer) = split(stream);
        let mut lines = BufReader::new(reader).lines();

        let first = lines
            .next_line()
            .await?
            .ok_or_else(|| ClientError::Handshake("server closed the connection".to_string()))?;

        let dim = match first.parse::<Message>()? {
            Message::BoardDim { dim } if shared::is_valid_dim(dim) => dim,
            Message::BoardDim { dim } => {
                return Err(ClientError::Handshake(format!(
                    "unsupported board dimension {}",
                    dim
                )))
            }
            other => {
                return Err(ClientError::Handshake(format!(
                    "expected {} but got {}",
                    shared::BOARD_DIM,
                    other.tag()
                )))
            }
        };

        info!("Connected! Board is {}x{}", dim, dim);

        Ok(Client {
            lines,
            writer,
            state: ClientGameState::new(dim),
        })
    }

    pub fn state(&self) -> &ClientGameState {
        &self.state
    }

    /// Sends `REVEAL` for `at` unless the local state rules the move out.
    ///
    /// Returns whether a request actually went out.
    pub async fn request_reveal(&mut self, at: Coord) -> Result<bool, ClientError> {
        if !self.state.select(at) {
            debug!("Not requesting {}: face-up, pending or pair full", at);
            return Ok(false);
        }

        self.writer
            .write_all(Message::Reveal(at).to_line().as_bytes())
            .await?;
        self.writer.flush().await?;
        Ok(true)
    }

    /// Decodes one server line and applies it. Unknown or garbled lines are skipped.
    pub fn handle_line(&mut self, line: &str) -> Vec<ViewEvent> {
        match line.parse::<Message>() {
            Ok(message) => self.state.apply(&message),
            Err(ProtocolError::UnknownTag(tag)) => {
                debug!("Ignoring unknown message {}", tag);
                Vec::new()
            }
            Err(e) => {
                warn!("Ignoring malformed line {:?}: {}", line, e);
                Vec::new()
            }
        }
    }

    /// Reads the next server line. `None` once the server has closed the connection.
    pub async fn next_events(&mut self) -> Result<Option<Vec<ViewEvent>>, ClientError> {
        match self.lines.next_line().await? {
            Some(line) => Ok(Some(self.handle_line(&line))),
            None => Ok(None),
        }
    }

    /// Plays until the game ends, the server hangs up, or `moves` is closed.
    ///
    /// Every view event is forwarded to `events`; the final local state is returned.
    pub async fn run(
        mut self,
        mut moves: mpsc::Receiver<Coord>,
        events: mpsc::UnboundedSender<ViewEvent>,
    ) -> Result<ClientGameState, ClientError> {
        loop {
            tokio::select! {
                batch = self.next_events() => {
                    let Some(batch) = batch? else {
                        info!("Server closed the connection");
                        break;
                    };
                    for event in batch {
                        // A vanished renderer does not stop the game
                        let _ = events.send(event);
                    }
                    if *self.state.status() == Status::GameOver {
                        info!("Game over after {} moves", self.state.moves_made());
                        self.writer.shutdown().await?;
                        break;
                    }
                },

                next_move = moves.recv() => {
                    match next_move {
                        Some(at) => {
                            self.request_reveal(at).await?;
                        }
                        None => {
                            info!("Input closed, leaving the game");
                            self.writer.shutdown().await?;
                            break;
                        }
                    }
                },
            }
        }

        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::CellView;

    fn at(row: usize, col: usize) -> Coord {
        Coord::new(row, col)
    }

    #[tokio::test]
    async fn test_handshake_reads_board_dim() {
        let stream = tokio_test::io::Builder::new().read(b"BOARD_DIM 4\n").build();
        let client = Client::handshake(stream).await.unwrap();
        assert_eq!(client.state().current_dimension(), 4);
    }

    #[tokio::test]
    async fn test_handshake_rejects_other_first_line() {
        let stream = tokio_test::io::Builder::new().read(b"MATCH\n").build();
        let result = Client::handshake(stream).await;
        assert!(matches!(result, Err(ClientError::Handshake(_))));

        let stream = tokio_test::io::Builder::new().read(b"BOARD_DIM 3\n").build();
        let result = Client::handshake(stream).await;
        assert!(matches!(result, Err(ClientError::Handshake(_))));

        let stream = tokio_test::io::Builder::new().build();
        let result = Client::handshake(stream).await;
        assert!(matches!(result, Err(ClientError::Handshake(_))));
    }

    #[tokio::test]
    async fn test_request_reveal_skips_known_cells() {
        let stream = tokio_test::io::Builder::new()
            .read(b"BOARD_DIM 2\n")
            .write(b"REVEAL 0 1\n")
            .read(b"CARD 0 1 A\n")
            .build();
        let mut client = Client::handshake(stream).await.unwrap();

        assert!(client.request_reveal(at(0, 1)).await.unwrap());
        let events = client.next_events().await.unwrap().unwrap();
        assert_eq!(
            events,
            vec![ViewEvent::Show {
                at: at(0, 1),
                letter: 'A'
            }]
        );

        // known face-up now, so nothing is written
        assert!(!client.request_reveal(at(0, 1)).await.unwrap());
        assert!(client.next_events().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_tags_are_ignored() {
        let stream = tokio_test::io::Builder::new()
            .read(b"BOARD_DIM 2\n")
            .read(b"SCORE 10\n")
            .read(b"CARD 0 0\n")
            .build();
        let mut client = Client::handshake(stream).await.unwrap();

        assert!(client.next_events().await.unwrap().unwrap().is_empty());
        assert!(client.next_events().await.unwrap().unwrap().is_empty());
        assert_eq!(client.state().status(), &Status::Ok);
    }

    #[tokio::test]
    async fn test_run_forwards_events_until_game_over() {
        let (client_side, server_side) = tokio::io::duplex(1024);
        let (server_read, mut server_write) = tokio::io::split(server_side);
        let mut requests = BufReader::new(server_read).lines();

        server_write.write_all(b"BOARD_DIM 2\n").await.unwrap();
        let client = Client::handshake(client_side).await.unwrap();

        let (move_tx, move_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(client.run(move_rx, event_tx));

        move_tx.send(at(0, 0)).await.unwrap();
        assert_eq!(requests.next_line().await.unwrap().unwrap(), "REVEAL 0 0");
        server_write.write_all(b"CARD 0 0 A\n").await.unwrap();

        move_tx.send(at(1, 1)).await.unwrap();
        assert_eq!(requests.next_line().await.unwrap().unwrap(), "REVEAL 1 1");
        server_write
            .write_all(b"CARD 1 1 A\nMATCH\nGAME_OVER\n")
            .await
            .unwrap();

        let state = handle.await.unwrap().unwrap();
        assert_eq!(state.status(), &Status::GameOver);
        assert_eq!(state.matches_made(), 1);
        assert_eq!(state.cell(at(1, 1)), Some(CellView::Revealed('A')));

        let mut received = Vec::new();
        while let Some(event) = event_rx.recv().await {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                ViewEvent::Show {
                    at: at(0, 0),
                    letter: 'A'
                },
                ViewEvent::Show {
                    at: at(1, 1),
                    letter: 'A'
                },
                ViewEvent::MatchMade,
                ViewEvent::StatusChanged(Status::GameOver),
            ]
        );
    }

    #[tokio::test]
    async fn test_run_stops_when_input_closes() {
        let (client_side, server_side) = tokio::io::duplex(1024);
        let (server_read, mut server_write) = tokio::io::split(server_side);

        server_write.write_all(b"BOARD_DIM 4\n").await.unwrap();
        let client = Client::handshake(client_side).await.unwrap();

        let (move_tx, move_rx) = mpsc::channel(1);
        let (event_tx, _event_rx) = mpsc::unbounded_channel();
        drop(move_tx);

        let state = client.run(move_rx, event_tx).await.unwrap();
        assert_eq!(state.moves_made(), 0);

        // the server sees the connection close
        let mut requests = BufReader::new(server_read).lines();
        assert!(requests.next_line().await.unwrap().is_none());
    }
}
