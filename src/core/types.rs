//! Strongly-typed wrappers for board-game concepts
//!
//! This module provides the small value types shared by every other part of
//! the crate. Coordinates are wrapped in [`Position`] so that an unchecked
//! `(usize, usize)` pair never reaches the oracle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Board edge length (the board is always square)
pub const BOARD_SIZE: usize = 15;

/// Number of stones in an unbroken line needed to win
pub const WIN_LENGTH: usize = 5;

/// Contents of a single board intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Black,
    White,
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

impl From<Side> for Cell {
    fn from(side: Side) -> Self {
        match side {
            Side::Black => Cell::Black,
            Side::White => Cell::White,
        }
    }
}

/// Stone colour of a player. Black always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Black,
    White,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Black => Side::White,
            Side::White => Side::Black,
        }
    }

    /// Side expected to make ply number `ply` (zero-based)
    pub fn for_ply(ply: usize) -> Side {
        if ply % 2 == 0 {
            Side::Black
        } else {
            Side::White
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::Black => "Black",
            Side::White => "White",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A validated board coordinate
///
/// Deserialization goes through the same bounds check as [`Position::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    row: u8,
    col: u8,
}

/// Unchecked wire form of a [`Position`]
#[derive(Deserialize)]
struct RawPosition {
    row: usize,
    col: usize,
}

impl TryFrom<RawPosition> for Position {
    type Error = String;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Position::new(raw.row, raw.col)
            .ok_or_else(|| format!("position ({}, {}) is off the board", raw.row, raw.col))
    }
}

impl Position {
    /// Create a position, returning `None` when it lies off the board
    pub fn new(row: usize, col: usize) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Position {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// Centre intersection, the conventional opening move
    pub fn center() -> Self {
        Position {
            row: (BOARD_SIZE / 2) as u8,
            col: (BOARD_SIZE / 2) as u8,
        }
    }

    pub fn row(self) -> usize {
        self.row as usize
    }

    pub fn col(self) -> usize {
        self.col as usize
    }

    /// Step by a signed offset, staying on the board
    pub fn offset(self, dr: isize, dc: isize) -> Option<Self> {
        let row = self.row as isize + dr;
        let col = self.col as isize + dc;
        if row < 0 || col < 0 {
            return None;
        }
        Position::new(row as usize, col as usize)
    }

    /// Iterate over every intersection in row-major order
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|row| {
            (0..BOARD_SIZE).map(move |col| Position {
                row: row as u8,
                col: col as u8,
            })
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Who controls each side for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Human plays Black, the oracle plays White
    #[default]
    HumanVsOracle,
    HumanVsHuman,
    OracleVsOracle,
}

impl GameMode {
    /// Whether `side` is moved by the oracle in this mode
    pub fn is_oracle_controlled(self, side: Side) -> bool {
        match self {
            GameMode::HumanVsOracle => side == Side::White,
            GameMode::HumanVsHuman => false,
            GameMode::OracleVsOracle => true,
        }
    }

    /// Whether this mode ever needs a searching oracle
    pub fn needs_oracle(self) -> bool {
        self != GameMode::HumanVsHuman
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::HumanVsOracle => "Player vs AI",
            GameMode::HumanVsHuman => "Player vs Player",
            GameMode::OracleVsOracle => "AI vs AI",
        };
        write!(f, "{name}")
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hvo" | "pvai" | "human-vs-oracle" => Ok(GameMode::HumanVsOracle),
            "hvh" | "pvp" | "human-vs-human" => Ok(GameMode::HumanVsHuman),
            "ovo" | "aivai" | "oracle-vs-oracle" => Ok(GameMode::OracleVsOracle),
            _ => Err(format!("invalid game mode '{s}' (expected: hvo, hvh, ovo)")),
        }
    }
}

/// Oracle strength setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl DifficultyLevel {
    /// Numeric strength understood by foreign engines (1, 3 and 5)
    pub fn strength(self) -> u8 {
        match self {
            DifficultyLevel::Easy => 1,
            DifficultyLevel::Medium => 3,
            DifficultyLevel::Hard => 5,
        }
    }

    /// Inverse of [`DifficultyLevel::strength`]; values in between round to Medium
    pub fn from_strength(level: u8) -> Self {
        if level <= 1 {
            DifficultyLevel::Easy
        } else if level >= 5 {
            DifficultyLevel::Hard
        } else {
            DifficultyLevel::Medium
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DifficultyLevel::Easy => "Easy",
            DifficultyLevel::Medium => "Medium",
            DifficultyLevel::Hard => "Hard",
        };
        write!(f, "{name}")
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(level) = s.parse::<u8>() {
            return Ok(DifficultyLevel::from_strength(level));
        }
        match s.to_lowercase().as_str() {
            "easy" => Ok(DifficultyLevel::Easy),
            "medium" => Ok(DifficultyLevel::Medium),
            "hard" => Ok(DifficultyLevel::Hard),
            _ => Err(format!(
                "invalid difficulty '{s}' (expected: easy, medium, hard or a strength 1-5)"
            )),
        }
    }
}

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win(Side),
    Draw,
}

impl Outcome {
    pub fn winner(self) -> Option<Side> {
        match self {
            Outcome::Win(side) => Some(side),
            Outcome::Draw => None,
        }
    }
}
