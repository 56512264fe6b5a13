//! Wire protocol shared by the concentration server and client.
//!
//! One message per line, fields separated by single spaces, tag first:
//!
//! ```text
//! BOARD_DIM 4
//! REVEAL 1 2
//! CARD 1 2 C
//! MATCH
//! MISMATCH 0 0 1 2
//! GAME_OVER
//! ERROR Card already revealed at 1 2
//! ```
//!
//! Encoding is the `Display` impl of [`Message`], decoding is its `FromStr` impl.
//! Both ends use the same code so the two directions can never drift apart.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Smallest legal board dimension.
pub const MIN_DIM: usize = 2;
/// Largest legal board dimension.
pub const MAX_DIM: usize = 6;
/// Port the server listens on when none is given.
pub const DEFAULT_PORT: u16 = 8080;
/// Glyph used when rendering a face-down card.
pub const HIDDEN_GLYPH: char = '.';

pub const BOARD_DIM: &str = "BOARD_DIM";
pub const REVEAL: &str = "REVEAL";
pub const CARD: &str = "CARD";
pub const MATCH: &str = "MATCH";
pub const MISMATCH: &str = "MISMATCH";
pub const GAME_OVER: &str = "GAME_OVER";
pub const ERROR: &str = "ERROR";

/// Returns true if `dim` is a playable board dimension.
pub fn is_valid_dim(dim: usize) -> bool {
    (MIN_DIM..=MAX_DIM).contains(&dim) && dim % 2 == 0
}

/// A cell position on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.row, self.col)
    }
}

/// Every message that can travel over a session, in either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// server -> client, once at session start
    BoardDim { dim: usize },
    /// client -> server
    Reveal(Coord),
    /// server -> client, echoes the card that was just turned over
    Card { at: Coord, letter: char },
    /// server -> client, the last pair matched
    Match,
    /// server -> client, the last pair did not match and must be hidden again
    Mismatch { first: Coord, second: Coord },
    /// server -> client, the session closes after this line
    GameOver,
    /// server -> client, the request was rejected; the session carries on
    Error { message: String },
}

impl Message {
    pub fn tag(&self) -> &'static str {
        match self {
            Message::BoardDim { .. } => BOARD_DIM,
            Message::Reveal(_) => REVEAL,
            Message::Card { .. } => CARD,
            Message::Match => MATCH,
            Message::Mismatch { .. } => MISMATCH,
            Message::GameOver => GAME_OVER,
            Message::Error { .. } => ERROR,
        }
    }

    /// Builds an `ERROR` message from anything printable.
    pub fn error(reason: impl fmt::Display) -> Self {
        Message::Error {
            message: reason.to_string().replace(['\r', '\n'], " "),
        }
    }

    /// Encodes the message as a newline-terminated frame.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::BoardDim { dim } => write!(f, "{} {}", BOARD_DIM, dim),
            Message::Reveal(at) => write!(f, "{} {}", REVEAL, at),
            Message::Card { at, letter } => write!(f, "{} {} {}", CARD, at, letter),
            Message::Match => f.write_str(MATCH),
            Message::Mismatch { first, second } => {
                write!(f, "{} {} {}", MISMATCH, first, second)
            }
            Message::GameOver => f.write_str(GAME_OVER),
            Message::Error { message } => write!(f, "{} {}", ERROR, message),
        }
    }
}

/// Reasons a line could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Empty message")]
    Empty,
    #[error("Unknown message {0}")]
    UnknownTag(String),
    #[error("Invalid Arguments: {tag} takes {expected} field(s), got {found}")]
    FieldCount {
        tag: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Invalid Coordinates: {field} is not a number: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("Invalid letter {0}")]
    InvalidLetter(String),
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut fields = line.split_whitespace();
        let tag = fields.next().ok_or(ProtocolError::Empty)?;

        // The error text is free-form and may contain spaces.
        if tag == ERROR {
            let rest = line.trim_start()[ERROR.len()..].to_string();
            let message = rest.strip_prefix(' ').unwrap_or(&rest).to_string();
            return Ok(Message::Error { message });
        }

        let args: Vec<&str> = fields.collect();
        match tag {
            BOARD_DIM => {
                expect_fields(BOARD_DIM, &args, 1)?;
                Ok(Message::BoardDim {
                    dim: parse_number("dim", args[0])?,
                })
            }
            REVEAL => {
                expect_fields(REVEAL, &args, 2)?;
                Ok(Message::Reveal(parse_coord(args[0], args[1])?))
            }
            CARD => {
                expect_fields(CARD, &args, 3)?;
                Ok(Message::Card {
                    at: parse_coord(args[0], args[1])?,
                    letter: parse_letter(args[2])?,
                })
            }
            MATCH => {
                expect_fields(MATCH, &args, 0)?;
                Ok(Message::Match)
            }
            MISMATCH => {
                expect_fields(MISMATCH, &args, 4)?;
                Ok(Message::Mismatch {
                    first: parse_coord(args[0], args[1])?,
                    second: parse_coord(args[2], args[3])?,
                })
            }
            GAME_OVER => {
                expect_fields(GAME_OVER, &args, 0)?;
                Ok(Message::GameOver)
            }
            other => Err(ProtocolError::UnknownTag(other.to_string())),
        }
    }
}

fn expect_fields(tag: &'static str, args: &[&str], expected: usize) -> Result<(), ProtocolError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ProtocolError::FieldCount {
            tag,
            expected,
            found: args.len(),
        })
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<usize, ProtocolError> {
    value.parse().map_err(|_| ProtocolError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_coord(row: &str, col: &str) -> Result<Coord, ProtocolError> {
    Ok(Coord::new(parse_number("row", row)?, parse_number("col", col)?))
}

fn parse_letter(value: &str) -> Result<char, ProtocolError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => Ok(letter),
        _ => Err(ProtocolError::InvalidLetter(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_dimensions() {
        let valid: Vec<usize> = (0..10).filter(|d| is_valid_dim(*d)).collect();
        assert_eq!(valid, vec![2, 4, 6]);
    }

    #[test]
    fn test_encode_server_messages() {
        assert_eq!(Message::BoardDim { dim: 4 }.to_string(), "BOARD_DIM 4");
        assert_eq!(
            Message::Card {
                at: Coord::new(1, 3),
                letter: 'B'
            }
            .to_string(),
            "CARD 1 3 B"
        );
        assert_eq!(Message::Match.to_string(), "MATCH");
        assert_eq!(
            Message::Mismatch {
                first: Coord::new(0, 1),
                second: Coord::new(2, 3)
            }
            .to_string(),
            "MISMATCH 0 1 2 3"
        );
        assert_eq!(Message::GameOver.to_line(), "GAME_OVER\n");
    }

    #[test]
    fn test_decode_reveal() {
        let msg: Message = "REVEAL 2 5".parse().unwrap();
        assert_eq!(msg, Message::Reveal(Coord::new(2, 5)));
    }

    #[test]
    fn test_decode_tolerates_line_endings() {
        let msg: Message = "REVEAL 0 1\r\n".parse().unwrap();
        assert_eq!(msg, Message::Reveal(Coord::new(0, 1)));
    }

    #[test]
    fn test_decode_error_keeps_spaces() {
        let msg: Message = "ERROR Card already revealed at 1 2".parse().unwrap();
        assert_eq!(
            msg,
            Message::Error {
                message: "Card already revealed at 1 2".to_string()
            }
        );
    }

    #[test]
    fn test_decode_rejects_bad_numbers() {
        let err = "REVEAL abc 1".parse::<Message>().unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidNumber {
                field: "row",
                value: "abc".to_string()
            }
        );

        let err = "REVEAL -1 0".parse::<Message>().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidNumber { field: "row", .. }));
    }

    #[test]
    fn test_decode_rejects_wrong_field_count() {
        let err = "REVEAL 1".parse::<Message>().unwrap_err();
        assert_eq!(
            err,
            ProtocolError::FieldCount {
                tag: REVEAL,
                expected: 2,
                found: 1
            }
        );
        assert!("MATCH 1 2".parse::<Message>().is_err());
        assert!("MISMATCH 0 0 1".parse::<Message>().is_err());
    }

    #[test]
    fn test_decode_unknown_and_empty() {
        assert_eq!(
            "HELLO there".parse::<Message>().unwrap_err(),
            ProtocolError::UnknownTag("HELLO".to_string())
        );
        assert_eq!("".parse::<Message>().unwrap_err(), ProtocolError::Empty);
        assert_eq!("   \n".parse::<Message>().unwrap_err(), ProtocolError::Empty);
    }

    #[test]
    fn test_decode_rejects_long_letter() {
        let err = "CARD 0 0 AB".parse::<Message>().unwrap_err();
        assert_eq!(err, ProtocolError::InvalidLetter("AB".to_string()));
    }

    #[test]
    fn test_error_constructor_strips_newlines() {
        let msg = Message::error("bad\nthing");
        assert_eq!(msg.to_line(), "ERROR bad thing\n");
    }

    #[test]
    fn test_message_roundtrip() {
        let messages = vec![
            Message::BoardDim { dim: 6 },
            Message::Reveal(Coord::new(5, 4)),
            Message::Card {
                at: Coord::new(3, 0),
                letter: 'R',
            },
            Message::Match,
            Message::Mismatch {
                first: Coord::new(1, 1),
                second: Coord::new(0, 3),
            },
            Message::GameOver,
            Message::error("Coordinates out of range 9 9"),
            Message::error(""),
        ];

        for msg in messages {
            let decoded: Message = msg.to_line().parse().unwrap();
            assert_eq!(decoded, msg);
        }
    }
}
