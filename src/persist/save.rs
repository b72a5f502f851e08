//! Save-game documents
//!
//! A save holds the move ledger rather than a board grid. Loading replays
//! the ledger through a fresh oracle, so a document can never produce a
//! position that was not reached by legal play.

use crate::core::{DifficultyLevel, GameMode, Position, Side};
use crate::error::PersistenceError;
use crate::session::SessionController;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current on-disk format version
pub const SAVE_FORMAT_VERSION: u32 = 1;

fn current_version() -> u32 {
    SAVE_FORMAT_VERSION
}

/// Versioned description of a session
///
/// Unknown fields are ignored; missing ones fall back to their defaults
/// (mode `HumanVsOracle`, difficulty `Medium`, no elapsed time, no moves).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub elapsed_seconds: u64,
    #[serde(default)]
    pub ledger: Vec<SavedMove>,
}

/// One ledger entry as written to disk
///
/// Coordinates are signed so that out-of-range values in a hand-edited
/// file are reported as a malformed ledger instead of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMove {
    pub row: i64,
    pub col: i64,
    pub side: Side,
}

impl SaveDocument {
    /// Capture the full ledger of a session (not the replay cursor)
    pub fn capture(session: &SessionController) -> Self {
        SaveDocument {
            version: SAVE_FORMAT_VERSION,
            mode: session.mode(),
            difficulty: session.difficulty(),
            elapsed_seconds: session.elapsed_seconds(),
            ledger: session
                .ledger()
                .moves()
                .iter()
                .map(|mv| SavedMove {
                    row: mv.row() as i64,
                    col: mv.col() as i64,
                    side: mv.side,
                })
                .collect(),
        }
    }

    /// Validate the document and return the move positions in order
    ///
    /// Checks the version, coordinate ranges, side alternation and repeated
    /// cells. Rules that need an engine (moves after a finished game) are
    /// checked while the ledger is replayed.
    pub fn positions(&self) -> Result<Vec<Position>, PersistenceError> {
        if self.version == 0 || self.version > SAVE_FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: self.version,
                supported: SAVE_FORMAT_VERSION,
            });
        }

        let mut seen = FxHashSet::default();
        self.ledger
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let malformed = |reason: String| PersistenceError::MalformedLedger { index, reason };
                let pos = usize::try_from(entry.row)
                    .ok()
                    .zip(usize::try_from(entry.col).ok())
                    .and_then(|(row, col)| Position::new(row, col))
                    .ok_or_else(|| {
                        malformed(format!("({}, {}) is off the board", entry.row, entry.col))
                    })?;
                let expected = Side::for_ply(index);
                if entry.side != expected {
                    return Err(malformed(format!(
                        "expected {expected} to move, found {}",
                        entry.side
                    )));
                }
                if !seen.insert(pos) {
                    return Err(malformed(format!("cell {pos} is already occupied")));
                }
                Ok(pos)
            })
            .collect()
    }

    /// Save as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        std::fs::write(path.as_ref(), json).map_err(|e| PersistenceError::Io(e.to_string()))?;

        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PersistenceError::Io(e.to_string()))?;

        serde_json::from_str(&json).map_err(|e| PersistenceError::Deserialization(e.to_string()))
    }

    pub fn move_count(&self) -> usize {
        self.ledger.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(row: i64, col: i64, side: Side) -> SavedMove {
        SavedMove { row, col, side }
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let doc: SaveDocument = serde_json::from_str(r#"{"futureField": true}"#).unwrap();
        assert_eq!(doc.version, SAVE_FORMAT_VERSION);
        assert_eq!(doc.mode, GameMode::HumanVsOracle);
        assert_eq!(doc.difficulty, DifficultyLevel::Medium);
        assert_eq!(doc.elapsed_seconds, 0);
        assert!(doc.positions().unwrap().is_empty());
    }

    #[test]
    fn test_camel_case_keys() {
        let json = r#"{
            "version": 1,
            "mode": "HumanVsHuman",
            "difficulty": "Hard",
            "elapsedSeconds": 42,
            "ledger": [{"row": 7, "col": 7, "side": "Black"}]
        }"#;
        let doc: SaveDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.elapsed_seconds, 42);
        assert_eq!(doc.positions().unwrap(), vec![Position::center()]);

        let written = serde_json::to_string(&doc).unwrap();
        assert!(written.contains("\"elapsedSeconds\":42"));
    }

    #[test]
    fn test_rejects_unsupported_versions() {
        for version in [0, SAVE_FORMAT_VERSION + 1] {
            let doc = SaveDocument {
                version,
                mode: GameMode::HumanVsHuman,
                difficulty: DifficultyLevel::Easy,
                elapsed_seconds: 0,
                ledger: Vec::new(),
            };
            assert_eq!(
                doc.positions(),
                Err(PersistenceError::UnsupportedVersion {
                    found: version,
                    supported: SAVE_FORMAT_VERSION
                })
            );
        }
    }

    #[test]
    fn test_malformed_ledgers() {
        let base: SaveDocument = serde_json::from_str("{}").unwrap();

        let off_board = SaveDocument {
            ledger: vec![entry(7, 7, Side::Black), entry(-1, 3, Side::White)],
            ..base.clone()
        };
        assert!(matches!(
            off_board.positions(),
            Err(PersistenceError::MalformedLedger { index: 1, .. })
        ));

        let wrong_side = SaveDocument {
            ledger: vec![entry(7, 7, Side::White)],
            ..base.clone()
        };
        assert!(matches!(
            wrong_side.positions(),
            Err(PersistenceError::MalformedLedger { index: 0, .. })
        ));

        let repeated = SaveDocument {
            ledger: vec![
                entry(7, 7, Side::Black),
                entry(7, 8, Side::White),
                entry(7, 7, Side::Black),
            ],
            ..base
        };
        assert!(matches!(
            repeated.positions(),
            Err(PersistenceError::MalformedLedger { index: 2, .. })
        ));
    }
}
