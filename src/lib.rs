//! Gomoku session controller
//!
//! Turn-based connect-five on a 15x15 board in three modes: human vs
//! oracle, human vs human and oracle vs oracle. The crate manages the
//! session around a move-decision oracle: turn ownership, an append-only
//! move ledger with undo and replay, epoch-tagged background oracle
//! queries, save games and statistics.

pub mod core;
pub mod error;
pub mod ledger;
pub mod oracle;
pub mod persist;
pub mod session;
pub mod stats;
pub mod tui;

pub use error::{PersistenceError, Result, SessionError};
