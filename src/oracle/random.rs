//! Random oracle for testing and baseline play
//!
//! Uses the native engine for rules and picks a random candidate move.
//! Serves as a fast stand-in for a real engine.

use crate::core::{Cell, DifficultyLevel, Position, Side};
use crate::oracle::{MoveOracle, NativeEngine, OracleError, OracleFactory};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};

/// An oracle that makes random choices
pub struct RandomOracle {
    rules: NativeEngine,
    rng: StdRng,
}

impl RandomOracle {
    /// Create a random oracle with an entropy-seeded RNG
    pub fn new() -> Self {
        RandomOracle {
            rules: NativeEngine::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a random oracle with a seeded RNG (for deterministic testing)
    pub fn with_seed(seed: u64) -> Self {
        RandomOracle {
            rules: NativeEngine::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveOracle for RandomOracle {
    fn reset(&mut self) {
        self.rules.reset();
    }

    fn apply_move(&mut self, pos: Position, side: Side) -> bool {
        self.rules.apply_move(pos, side)
    }

    fn query_best_move(&mut self) -> Result<Option<Position>, OracleError> {
        if self.rules.is_terminal() {
            return Ok(None);
        }
        let candidates = self.rules.candidates();
        if candidates.is_empty() {
            return Ok(None);
        }
        let index = self.rng.gen_range(0..candidates.len());
        Ok(Some(candidates[index]))
    }

    fn is_terminal(&self) -> bool {
        self.rules.is_terminal()
    }

    fn winner(&self) -> Option<Side> {
        self.rules.winner()
    }

    fn set_strength(&mut self, level: DifficultyLevel) {
        self.rules.set_strength(level);
    }

    fn undo_one_ply(&mut self) -> bool {
        self.rules.undo_one_ply()
    }

    fn can_undo(&self) -> bool {
        self.rules.can_undo()
    }

    fn read_cell(&self, pos: Position) -> Cell {
        self.rules.read_cell(pos)
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Hands out [`RandomOracle`]s; each instance gets the next seed in sequence
#[derive(Debug)]
pub struct RandomOracleFactory {
    next_seed: AtomicU64,
}

impl RandomOracleFactory {
    pub fn with_seed(seed: u64) -> Self {
        RandomOracleFactory {
            next_seed: AtomicU64::new(seed),
        }
    }
}

impl OracleFactory for RandomOracleFactory {
    fn create(&self) -> Result<Box<dyn MoveOracle>, OracleError> {
        let seed = self.next_seed.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(RandomOracle::with_seed(seed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_move_is_center() {
        let mut oracle = RandomOracle::with_seed(42);
        assert_eq!(oracle.query_best_move().unwrap(), Some(Position::center()));
    }

    #[test]
    fn test_seeded_determinism() {
        let mut a = RandomOracle::with_seed(7);
        let mut b = RandomOracle::with_seed(7);
        for oracle in [&mut a, &mut b] {
            oracle.apply_move(Position::center(), Side::Black);
        }
        assert_eq!(a.query_best_move().unwrap(), b.query_best_move().unwrap());
    }

    #[test]
    fn test_choice_is_legal_neighbor() {
        let mut oracle = RandomOracle::with_seed(3);
        oracle.apply_move(Position::center(), Side::Black);
        let choice = oracle.query_best_move().unwrap().unwrap();
        assert_eq!(oracle.read_cell(choice), Cell::Empty);
        assert!(choice.row().abs_diff(7) <= 1 && choice.col().abs_diff(7) <= 1);
    }
}
