//! Outcome counters accumulated across sessions
//!
//! Side A is the side that moves first (Black) and side B the second
//! (White), whatever the mode. Counters only ever grow.

use crate::core::{Outcome, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub games_played: u64,
    pub side_a_wins: u64,
    pub side_b_wins: u64,
    pub draws: u64,
}

impl Statistics {
    pub fn wins_for(&self, side: Side) -> u64 {
        match side {
            Side::Black => self.side_a_wins,
            Side::White => self.side_b_wins,
        }
    }

    /// Share of finished games won by `side` (0.0 before any game)
    pub fn win_rate(&self, side: Side) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins_for(side) as f64 / self.games_played as f64
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Games played: {}", self.games_played)?;
        writeln!(
            f,
            "Black wins:   {} ({:.1}%)",
            self.side_a_wins,
            self.win_rate(Side::Black) * 100.0
        )?;
        writeln!(
            f,
            "White wins:   {} ({:.1}%)",
            self.side_b_wins,
            self.win_rate(Side::White) * 100.0
        )?;
        write!(f, "Draws:        {}", self.draws)
    }
}

/// Counts finished games
#[derive(Debug, Clone, Default)]
pub struct StatisticsTracker {
    stats: Statistics,
}

impl StatisticsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue counting from previously persisted totals
    pub fn from_statistics(stats: Statistics) -> Self {
        StatisticsTracker { stats }
    }

    /// Count one finished game and return the new totals
    pub fn record(&mut self, outcome: Outcome) -> Statistics {
        self.stats.games_played += 1;
        match outcome {
            Outcome::Win(Side::Black) => self.stats.side_a_wins += 1,
            Outcome::Win(Side::White) => self.stats.side_b_wins += 1,
            Outcome::Draw => self.stats.draws += 1,
        }
        self.stats
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }
}
