use crate::game::{CellView, Status, ViewEvent};
use shared::{Coord, HIDDEN_GLYPH};

/// Text renderer that mirrors the board purely from view events
pub struct Renderer {
    dim: usize,
    cells: Vec<CellView>,
    matches: usize,
    status: Status,
}

impl Renderer {
    pub fn new(dim: usize) -> Self {
        Renderer {
            dim,
            cells: vec![CellView::Hidden; dim * dim],
            matches: 0,
            status: Status::Ok,
        }
    }

    pub fn apply(&mut self, event: &ViewEvent) {
        match event {
            ViewEvent::Show { at, letter } => {
                self.set(*at, CellView::Revealed(*letter));
            }
            ViewEvent::Hide { at } => {
                self.set(*at, CellView::Hidden);
            }
            ViewEvent::MatchMade => self.matches += 1,
            ViewEvent::StatusChanged(status) => self.status = status.clone(),
        }
    }

    fn set(&mut self, at: Coord, view: CellView) {
        if at.row < self.dim && at.col < self.dim {
            self.cells[at.row * self.dim + at.col] = view;
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("  ");
        for col in 0..self.dim {
            out.push_str(&col.to_string());
        }
        out.push('\n');

        for (row, cells) in self.cells.chunks(self.dim).enumerate() {
            out.push_str(&row.to_string());
            out.push('|');
            for cell in cells {
                out.push(match cell {
                    CellView::Hidden => HIDDEN_GLYPH,
                    CellView::Revealed(letter) => *letter,
                });
            }
            out.push('\n');
        }

        let status = match &self.status {
            Status::Ok => "OK".to_string(),
            Status::Error(message) => format!("ERROR: {}", message),
            Status::GameOver => "GAME OVER".to_string(),
        };
        out.push_str(&format!(
            "Matches: {}/{}  Status: {}\n",
            self.matches,
            self.dim * self.dim / 2,
            status
        ));
        out
    }
}
