//! Terminal move input: turns typed lines into reveal requests

use shared::Coord;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reveal(Coord),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("type a move as `row col`, or `quit`")]
    Unrecognised,
    #[error("`{0}` is not a row or column number")]
    NotANumber(String),
}

/// Parses `row col` (space or comma separated) or `q`/`quit`.
pub fn parse_command(line: &str) -> Result<Command, InputError> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Ok(Command::Quit);
    }

    let fields: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|field| !field.is_empty())
        .collect();

    match fields.as_slice() {
        [row, col] => Ok(Command::Reveal(Coord::new(number(row)?, number(col)?))),
        _ => Err(InputError::Unrecognised),
    }
}

fn number(field: &str) -> Result<usize, InputError> {
    field
        .parse()
        .map_err(|_| InputError::NotANumber(field.to_string()))
}
