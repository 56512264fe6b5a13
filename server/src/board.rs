//! Authoritative concentration board
//!
//! The board owns a `dim x dim` grid of face-down cards holding `dim²/2` letters,
//! each exactly twice. Players turn cards over two at a time; the board remembers
//! the first card of the current pair and judges the pair when the second arrives.
//!
//! The board knows nothing about connections or the wire format. It is owned by
//! exactly one session and is never shared.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{is_valid_dim, Coord, HIDDEN_GLYPH};
use std::fmt;
use thiserror::Error;

/// Ways a board operation can be refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("Board size must be even and between 2 and 6: {0}")]
    InvalidDimension(usize),
    #[error("Coordinates out of range {row} {col}")]
    OutOfRange { row: usize, col: usize },
    #[error("Card already revealed at {row} {col}")]
    AlreadyRevealed { row: usize, col: usize },
    #[error("Game is already over")]
    GameAlreadyOver,
    #[error("Invalid board layout: {0}")]
    InvalidLayout(String),
}

/// A single card on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub at: Coord,
    pub letter: char,
    hidden: bool,
}

impl Card {
    fn new(at: Coord, letter: char) -> Self {
        Self {
            at,
            letter,
            hidden: true,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

/// Result of a successful reveal
///
/// `first` is always the card revealed earlier in the pair, `second` the one
/// that was just revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// First card of a pair; nothing to judge yet
    Single { at: Coord, letter: char },
    /// Both cards carry the same letter and stay face-up for good
    Match {
        first: Coord,
        second: Coord,
        letter: char,
    },
    /// Letters differ; the caller turns both cards back over with [`Board::conceal`]
    Mismatch {
        first: Coord,
        second: Coord,
        letter: char,
    },
}

impl RevealOutcome {
    /// Position and letter of the card this reveal turned over
    pub fn revealed(&self) -> (Coord, char) {
        match *self {
            RevealOutcome::Single { at, letter } => (at, letter),
            RevealOutcome::Match { second, letter, .. } => (second, letter),
            RevealOutcome::Mismatch { second, letter, .. } => (second, letter),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    dim: usize,
    cards: Vec<Card>,
    /// First card of the pair in progress, if any
    pending: Option<Coord>,
    matches: usize,
}

impl Board {
    /// Creates a shuffled, fully hidden board using the thread-local RNG.
    pub fn new(dim: usize) -> Result<Self, BoardError> {
        Self::with_rng(dim, &mut rand::thread_rng())
    }

    /// Creates a shuffled, fully hidden board from the given RNG.
    pub fn with_rng<R: Rng + ?Sized>(dim: usize, rng: &mut R) -> Result<Self, BoardError> {
        if !is_valid_dim(dim) {
            return Err(BoardError::InvalidDimension(dim));
        }

        let mut letters = Self::letter_pairs(dim);
        letters.shuffle(rng);
        Self::with_layout(dim, &letters)
    }

    /// Creates a hidden board with the letters laid out row by row.
    ///
    /// The layout must hold every one of the `dim²/2` letters exactly twice.
    pub fn with_layout(dim: usize, letters: &[char]) -> Result<Self, BoardError> {
        if !is_valid_dim(dim) {
            return Err(BoardError::InvalidDimension(dim));
        }
        if letters.len() != dim * dim {
            return Err(BoardError::InvalidLayout(format!(
                "expected {} letters, got {}",
                dim * dim,
                letters.len()
            )));
        }

        let mut sorted = letters.to_vec();
        sorted.sort_unstable();
        if sorted != Self::letter_pairs(dim) {
            return Err(BoardError::InvalidLayout(
                "every letter must appear exactly twice".to_string(),
            ));
        }

        let cards = letters
            .iter()
            .enumerate()
            .map(|(i, &letter)| Card::new(Coord::new(i / dim, i % dim), letter))
            .collect();

        Ok(Self {
            dim,
            cards,
            pending: None,
            matches: 0,
        })
    }

    /// The sorted list `A, A, B, B, ...` of letters for a board of this size
    fn letter_pairs(dim: usize) -> Vec<char> {
        (0..(dim * dim / 2) as u8)
            .flat_map(|i| {
                let letter = char::from(b'A' + i);
                [letter, letter]
            })
            .collect()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn matches(&self) -> usize {
        self.matches
    }

    pub fn total_pairs(&self) -> usize {
        self.dim * self.dim / 2
    }

    /// The first card of the pair in progress
    pub fn pending(&self) -> Option<Coord> {
        self.pending
    }

    pub fn is_game_over(&self) -> bool {
        self.matches >= self.total_pairs()
    }

    pub fn card(&self, at: Coord) -> Result<&Card, BoardError> {
        self.index(at).map(|i| &self.cards[i])
    }

    fn index(&self, at: Coord) -> Result<usize, BoardError> {
        if at.row >= self.dim || at.col >= self.dim {
            return Err(BoardError::OutOfRange {
                row: at.row,
                col: at.col,
            });
        }
        Ok(at.row * self.dim + at.col)
    }

    /// Turns over the hidden card at `at` and judges the pair if it is the second one.
    ///
    /// A failed reveal leaves the board untouched.
    pub fn reveal(&mut self, at: Coord) -> Result<RevealOutcome, BoardError> {
        if self.is_game_over() {
            return Err(BoardError::GameAlreadyOver);
        }

        let index = self.index(at)?;
        let card = &mut self.cards[index];
        if !card.hidden {
            return Err(BoardError::AlreadyRevealed {
                row: at.row,
                col: at.col,
            });
        }
        card.hidden = false;
        let letter = card.letter;

        let outcome = match self.pending.take() {
            None => {
                self.pending = Some(at);
                RevealOutcome::Single { at, letter }
            }
            Some(first) => {
                let first_letter = self.cards[first.row * self.dim + first.col].letter;
                if first_letter == letter {
                    self.matches += 1;
                    RevealOutcome::Match {
                        first,
                        second: at,
                        letter,
                    }
                } else {
                    RevealOutcome::Mismatch {
                        first,
                        second: at,
                        letter,
                    }
                }
            }
        };

        debug!("Reveal {} -> {:?} ({} matches)", at, outcome, self.matches);
        Ok(outcome)
    }

    /// Turns a mismatched pair face-down again.
    pub fn conceal(&mut self, first: Coord, second: Coord) -> Result<(), BoardError> {
        let first = self.index(first)?;
        let second = self.index(second)?;
        self.cards[first].hidden = true;
        self.cards[second].hidden = true;
        Ok(())
    }

    /// Renders the grid with every card face-up.
    pub fn solution(&self) -> String {
        self.render(|_| false)
    }

    fn render(&self, hidden: impl Fn(&Card) -> bool) -> String {
        let mut out = String::from("  ");
        for col in 0..self.dim {
            out.push_str(&col.to_string());
        }
        out.push('\n');

        for (row, cards) in self.cards.chunks(self.dim).enumerate() {
            out.push_str(&row.to_string());
            out.push('|');
            for card in cards {
                out.push(if hidden(card) { HIDDEN_GLYPH } else { card.letter });
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Card::is_hidden))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn small_board() -> Board {
        // A A
        // B B
        Board::with_layout(2, &['A', 'A', 'B', 'B']).unwrap()
    }

    fn at(row: usize, col: usize) -> Coord {
        Coord::new(row, col)
    }

    #[test]
    fn test_rejects_invalid_dimensions() {
        for dim in [0, 1, 3, 5, 7, 8] {
            assert_eq!(
                Board::new(dim).unwrap_err(),
                BoardError::InvalidDimension(dim)
            );
        }
    }

    #[test]
    fn test_new_board_has_each_letter_twice() {
        for dim in [2, 4, 6] {
            let board = Board::new(dim).unwrap();
            let mut counts: HashMap<char, usize> = HashMap::new();
            for row in 0..dim {
                for col in 0..dim {
                    let card = board.card(at(row, col)).unwrap();
                    assert!(card.is_hidden());
                    assert_eq!(card.at, at(row, col));
                    *counts.entry(card.letter).or_default() += 1;
                }
            }
            assert_eq!(counts.len(), dim * dim / 2);
            assert!(counts.values().all(|&n| n == 2));
            assert_eq!(board.matches(), 0);
            assert!(!board.is_game_over());
        }
    }

    #[test]
    fn test_seeded_boards_are_reproducible() {
        let a = Board::with_rng(6, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = Board::with_rng(6, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a.solution(), b.solution());
    }

    #[test]
    fn test_layout_must_pair_letters() {
        assert!(matches!(
            Board::with_layout(2, &['A', 'A', 'B']),
            Err(BoardError::InvalidLayout(_))
        ));
        assert!(matches!(
            Board::with_layout(2, &['A', 'A', 'A', 'B']),
            Err(BoardError::InvalidLayout(_))
        ));
        assert!(matches!(
            Board::with_layout(2, &['A', 'A', 'C', 'C']),
            Err(BoardError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_first_reveal_is_pending() {
        let mut board = small_board();
        let outcome = board.reveal(at(0, 0)).unwrap();
        assert_eq!(
            outcome,
            RevealOutcome::Single {
                at: at(0, 0),
                letter: 'A'
            }
        );
        assert_eq!(board.pending(), Some(at(0, 0)));
        assert!(!board.card(at(0, 0)).unwrap().is_hidden());
    }

    #[test]
    fn test_reveal_same_card_twice_fails() {
        let mut board = small_board();
        board.reveal(at(0, 0)).unwrap();
        assert_eq!(
            board.reveal(at(0, 0)).unwrap_err(),
            BoardError::AlreadyRevealed { row: 0, col: 0 }
        );
        // the failed reveal did not disturb the pair in progress
        assert_eq!(board.pending(), Some(at(0, 0)));
    }

    #[test]
    fn test_reveal_out_of_range() {
        let mut board = small_board();
        assert_eq!(
            board.reveal(at(2, 0)).unwrap_err(),
            BoardError::OutOfRange { row: 2, col: 0 }
        );
        assert_eq!(
            board.reveal(at(0, 5)).unwrap_err(),
            BoardError::OutOfRange { row: 0, col: 5 }
        );
        assert_eq!(board.pending(), None);
    }

    #[test]
    fn test_match_keeps_cards_revealed() {
        let mut board = small_board();
        board.reveal(at(0, 0)).unwrap();
        let outcome = board.reveal(at(0, 1)).unwrap();

        assert_eq!(
            outcome,
            RevealOutcome::Match {
                first: at(0, 0),
                second: at(0, 1),
                letter: 'A'
            }
        );
        assert_eq!(board.matches(), 1);
        assert_eq!(board.pending(), None);
        assert!(!board.card(at(0, 0)).unwrap().is_hidden());
        assert!(!board.card(at(0, 1)).unwrap().is_hidden());
        assert!(!board.is_game_over());
    }

    #[test]
    fn test_mismatch_then_conceal() {
        let mut board = small_board();
        board.reveal(at(0, 0)).unwrap();
        let outcome = board.reveal(at(1, 0)).unwrap();

        let (first, second) = match outcome {
            RevealOutcome::Mismatch { first, second, .. } => (first, second),
            other => panic!("Expected mismatch, got {:?}", other),
        };
        assert_eq!((first, second), (at(0, 0), at(1, 0)));
        assert_eq!(board.matches(), 0);
        assert_eq!(board.pending(), None);

        board.conceal(first, second).unwrap();
        assert!(board.card(first).unwrap().is_hidden());
        assert!(board.card(second).unwrap().is_hidden());

        // both cells can be played again
        board.reveal(at(1, 0)).unwrap();
        board.reveal(at(0, 0)).unwrap();
    }

    #[test]
    fn test_pair_order_follows_reveal_order() {
        let mut board = small_board();
        board.reveal(at(1, 1)).unwrap();
        let outcome = board.reveal(at(0, 0)).unwrap();
        assert!(matches!(
            outcome,
            RevealOutcome::Mismatch { first, second, letter: 'A' }
                if first == at(1, 1) && second == at(0, 0)
        ));
    }

    #[test]
    fn test_game_over_after_all_pairs() {
        let mut board = small_board();
        board.reveal(at(0, 0)).unwrap();
        board.reveal(at(0, 1)).unwrap();
        board.reveal(at(1, 1)).unwrap();
        board.reveal(at(1, 0)).unwrap();

        assert_eq!(board.matches(), 2);
        assert!(board.is_game_over());
        assert_eq!(
            board.reveal(at(0, 0)).unwrap_err(),
            BoardError::GameAlreadyOver
        );
    }

    #[test]
    fn test_render_hides_face_down_cards() {
        let mut board = small_board();
        assert_eq!(board.to_string(), "  01\n0|..\n1|..\n");

        board.reveal(at(1, 0)).unwrap();
        assert_eq!(board.to_string(), "  01\n0|..\n1|B.\n");
        assert_eq!(board.solution(), "  01\n0|AA\n1|BB\n");
    }
}
