//! Client-side view of one game
//!
//! The client never sees a letter until the server reveals it, so every cell is
//! either known to be face-down or known to show a letter. The state here is
//! only ever updated from server messages; each update yields the view events a
//! renderer needs to mirror it.

use log::warn;
use shared::{Coord, Message};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Hidden,
    Revealed(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error(String),
    GameOver,
}

/// What the rendering side has to do in response to a server message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Show { at: Coord, letter: char },
    Hide { at: Coord },
    MatchMade,
    StatusChanged(Status),
}

#[derive(Debug, Clone)]
pub struct ClientGameState {
    dim: usize,
    cells: Vec<CellView>,
    status: Status,
    moves_made: usize,
    matches_made: usize,
    /// Reveal requests sent but not yet answered, oldest first
    in_flight: VecDeque<Coord>,
    /// Cards revealed in the pair currently in progress
    pair: Vec<Coord>,
}

impl ClientGameState {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            cells: vec![CellView::Hidden; dim * dim],
            status: Status::Ok,
            moves_made: 0,
            matches_made: 0,
            in_flight: VecDeque::new(),
            pair: Vec::with_capacity(2),
        }
    }

    pub fn current_dimension(&self) -> usize {
        self.dim
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn moves_made(&self) -> usize {
        self.moves_made
    }

    pub fn matches_made(&self) -> usize {
        self.matches_made
    }

    pub fn cell(&self, at: Coord) -> Option<CellView> {
        self.index(at).map(|i| self.cells[i])
    }

    pub fn is_known_revealed(&self, at: Coord) -> bool {
        matches!(self.cell(at), Some(CellView::Revealed(_)))
    }

    fn index(&self, at: Coord) -> Option<usize> {
        (at.row < self.dim && at.col < self.dim).then(|| at.row * self.dim + at.col)
    }

    /// Records a reveal request if it is worth sending.
    ///
    /// Returns false for cells outside the board, cells already face-up or
    /// already requested, a third card while a pair is still unresolved, and
    /// anything after the game is over.
    pub fn select(&mut self, at: Coord) -> bool {
        if self.status == Status::GameOver || self.index(at).is_none() {
            return false;
        }
        if self.is_known_revealed(at) || self.in_flight.contains(&at) {
            return false;
        }
        if self.in_flight.len() + self.pair.len() >= 2 {
            return false;
        }

        self.in_flight.push_back(at);
        true
    }

    /// Applies one server message and returns the resulting view events.
    pub fn apply(&mut self, message: &Message) -> Vec<ViewEvent> {
        match message {
            Message::BoardDim { dim } => {
                if !shared::is_valid_dim(*dim) {
                    warn!("Ignoring invalid board dimension {}", dim);
                    return Vec::new();
                }
                *self = Self::new(*dim);
                vec![ViewEvent::StatusChanged(Status::Ok)]
            }
            Message::Card { at, letter } => {
                let Some(index) = self.index(*at) else {
                    warn!("Ignoring card outside the board at {}", at);
                    return Vec::new();
                };

                self.cells[index] = CellView::Revealed(*letter);
                self.moves_made += 1;
                self.in_flight.retain(|pending| pending != at);
                if !self.pair.contains(at) {
                    // a pair never holds more than its two latest cards
                    if self.pair.len() == 2 {
                        self.pair.remove(0);
                    }
                    self.pair.push(*at);
                }

                let mut events = vec![ViewEvent::Show {
                    at: *at,
                    letter: *letter,
                }];
                if self.status != Status::Ok {
                    self.status = Status::Ok;
                    events.push(ViewEvent::StatusChanged(Status::Ok));
                }
                events
            }
            Message::Match => {
                self.matches_made += 1;
                self.pair.clear();
                vec![ViewEvent::MatchMade]
            }
            Message::Mismatch { first, second } => {
                self.pair.clear();
                let mut events = Vec::with_capacity(2);
                for at in [*first, *second] {
                    if let Some(index) = self.index(at) {
                        self.cells[index] = CellView::Hidden;
                        events.push(ViewEvent::Hide { at });
                    }
                }
                events
            }
            Message::GameOver => {
                self.status = Status::GameOver;
                self.in_flight.clear();
                vec![ViewEvent::StatusChanged(Status::GameOver)]
            }
            Message::Error { message } => {
                self.in_flight.pop_front();
                self.status = Status::Error(message.clone());
                vec![ViewEvent::StatusChanged(self.status.clone())]
            }
            Message::Reveal(_) => {
                warn!("Ignoring client request sent by the server");
                Vec::new()
            }
        }
    }
}
