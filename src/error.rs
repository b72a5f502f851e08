//! Error types for the session controller

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not your turn")]
    OutOfTurn,

    #[error("Cell ({row}, {col}) is already occupied")]
    CellOccupied { row: usize, col: usize },

    #[error("Position ({row}, {col}) is off the board")]
    OutOfBounds { row: usize, col: usize },

    #[error("Oracle rejected move at ({row}, {col})")]
    MoveRejected { row: usize, col: usize },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Undo is not available right now")]
    UndoUnavailable,

    #[error("Not in replay mode")]
    NotInReplay,

    #[error("No moves to replay")]
    NothingToReplay,

    #[error("Already in replay mode")]
    AlreadyInReplay,

    #[error("Replay cursor {requested} out of range for {len} moves")]
    ReplayCursorOutOfRange { requested: isize, len: usize },

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

/// Errors raised while saving or loading session documents
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Unsupported save format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Malformed ledger at move {index}: {reason}")]
    MalformedLedger { index: usize, reason: String },

    #[error("Failed to serialize: {0}")]
    Serialization(String),

    #[error("Failed to deserialize: {0}")]
    Deserialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<crate::oracle::OracleError> for SessionError {
    fn from(err: crate::oracle::OracleError) -> Self {
        SessionError::OracleUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
