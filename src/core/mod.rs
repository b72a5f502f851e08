//! Core value types shared across the crate

pub mod board;
pub mod types;

pub use board::Board;
pub use types::{Cell, DifficultyLevel, GameMode, Outcome, Position, Side, BOARD_SIZE, WIN_LENGTH};
