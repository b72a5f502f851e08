//! Detached oracle queries
//!
//! A [`QueryTicket`] is a self-contained description of one "what should
//! the side to move play?" question. It carries only plain data, so it can
//! be moved to a blocking worker while the controller keeps serving
//! commands. Resolving a ticket builds a fresh oracle from the factory,
//! replays the ledger into it and asks for a move; the live oracle is never
//! touched off the controller's thread.

use crate::core::{DifficultyLevel, Position, Side};
use crate::ledger::Move;
use crate::oracle::{OracleError, OracleFactory};

/// A pending oracle question tagged with the session epoch it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub epoch: u64,
    pub side: Side,
    pub difficulty: DifficultyLevel,
    pub moves: Vec<Move>,
}

/// Answer to a [`QueryTicket`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleReply {
    pub epoch: u64,
    pub side: Side,
    pub result: Result<Option<Position>, OracleError>,
}

impl QueryTicket {
    /// Run the query to completion on the calling thread
    ///
    /// This blocks for as long as the search takes and is meant to run
    /// inside `spawn_blocking`.
    pub fn resolve(&self, factory: &dyn OracleFactory) -> OracleReply {
        OracleReply {
            epoch: self.epoch,
            side: self.side,
            result: self.search(factory),
        }
    }

    fn search(&self, factory: &dyn OracleFactory) -> Result<Option<Position>, OracleError> {
        let mut oracle = factory.create()?;
        oracle.set_strength(self.difficulty);
        for mv in &self.moves {
            if !oracle.apply_move(mv.position, mv.side) {
                return Err(OracleError::Desync { ply: mv.ply });
            }
        }
        oracle.query_best_move()
    }
}
