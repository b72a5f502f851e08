//! Read-through board mirror
//!
//! The oracle owns the authoritative board. The controller keeps this copy
//! only so the presentation layer can read cells without going through the
//! oracle on every frame.

use crate::core::types::{Cell, Position, BOARD_SIZE};
use crate::oracle::MoveOracle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 15x15 grid of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// An all-empty board
    pub fn empty() -> Self {
        Board {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Copy every cell out of an oracle
    pub fn read_from(oracle: &dyn MoveOracle) -> Self {
        let mut board = Board::empty();
        for pos in Position::all() {
            board.set(pos, oracle.read_cell(pos));
        }
        board
    }

    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.row()][pos.col()]
    }

    pub fn set(&mut self, pos: Position, cell: Cell) {
        self.cells[pos.row()][pos.col()] = cell;
    }

    /// Number of stones on the board
    pub fn stone_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.stone_count() == 0
    }

    /// Rows of cells, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; BOARD_SIZE]> {
        self.cells.iter()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for cell in row {
                let glyph = match cell {
                    Cell::Empty => '.',
                    Cell::Black => 'X',
                    Cell::White => 'O',
                };
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board() {
        let board = Board::empty();
        assert!(board.is_empty());
        assert_eq!(board.get(Position::center()), Cell::Empty);
    }

    #[test]
    fn test_set_and_count() {
        let mut board = Board::empty();
        board.set(Position::new(3, 4).unwrap(), Cell::Black);
        board.set(Position::new(3, 5).unwrap(), Cell::White);
        assert_eq!(board.stone_count(), 2);
        assert_eq!(board.get(Position::new(3, 4).unwrap()), Cell::Black);

        let text = board.to_string();
        assert_eq!(text.lines().count(), BOARD_SIZE);
        assert_eq!(&text.lines().nth(3).unwrap()[4..6], "XO");
    }
}
