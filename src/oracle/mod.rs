//! Move oracle interface
//!
//! This module defines the boundary between the session controller and the
//! engine that decides moves. The controller treats the oracle as the sole
//! arbiter of legality and board truth: it never keeps a parallel rules
//! checker, it only asks.
//!
//! An oracle instance is a scoped resource. It is acquired through an
//! [`OracleFactory`] and released when the owning `Box` is dropped, so
//! replacing the controller's oracle destroys the previous engine.

pub mod native;
pub mod query;
pub mod random;

use crate::core::{Cell, DifficultyLevel, Position, Side};
use thiserror::Error;

pub use native::{NativeEngine, NativeEngineFactory};
pub use query::{OracleReply, QueryTicket};
pub use random::{RandomOracle, RandomOracleFactory};

/// Failures reported by an oracle or its factory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("engine failed to initialize: {0}")]
    Unavailable(String),

    #[error("engine crashed during search: {0}")]
    Crashed(String),

    #[error("engine refused ledger move at ply {ply}")]
    Desync { ply: usize },
}

/// The functional contract every move-decision engine provides
///
/// Implementations must be `Send` so that a detached search instance can be
/// moved onto a blocking worker thread.
pub trait MoveOracle: Send {
    /// Clear the board and history
    fn reset(&mut self);

    /// Place a stone; returns `false` if the engine refuses the move
    fn apply_move(&mut self, pos: Position, side: Side) -> bool;

    /// Ask the engine for its preferred move for the side to move
    ///
    /// `Ok(None)` means the engine has nothing to offer (e.g. a full board).
    fn query_best_move(&mut self) -> Result<Option<Position>, OracleError>;

    /// Whether the current position is a win or a draw
    fn is_terminal(&self) -> bool;

    /// Winner of a terminal position (`None` for a draw or an open game)
    fn winner(&self) -> Option<Side>;

    /// Adjust search strength; takes effect on the next query
    fn set_strength(&mut self, level: DifficultyLevel);

    /// Take back the most recent ply; returns `false` if there is none
    fn undo_one_ply(&mut self) -> bool;

    fn can_undo(&self) -> bool;

    fn read_cell(&self, pos: Position) -> Cell;

    /// Short engine name for status and log messages
    fn name(&self) -> &str {
        "oracle"
    }
}

/// Creates oracle instances
///
/// Shared between the controller (live instance) and background search
/// tasks (detached instances), hence `Send + Sync`.
pub trait OracleFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn MoveOracle>, OracleError>;
}

impl<F> OracleFactory for F
where
    F: Fn() -> Result<Box<dyn MoveOracle>, OracleError> + Send + Sync,
{
    fn create(&self) -> Result<Box<dyn MoveOracle>, OracleError> {
        self()
    }
}
