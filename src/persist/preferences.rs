//! User preferences and persisted statistics
//!
//! Kept apart from save games: one small JSON document that is read once at
//! start-up and rewritten whenever a preference or a counter changes.

use crate::core::{DifficultyLevel, GameMode};
use crate::error::PersistenceError;
use crate::stats::Statistics;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default preferences file name
pub const DEFAULT_PREFERENCES_FILE: &str = "gomoku_prefs.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub difficulty: DifficultyLevel,
    pub mode: GameMode,
    pub statistics: Statistics,
}

/// Reads and writes the preferences document at a fixed path
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PreferencesStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences, falling back to defaults when the file does not exist
    pub fn load(&self) -> Result<Preferences, PersistenceError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Preferences::default()),
            Err(e) => return Err(PersistenceError::Io(e.to_string())),
        };
        serde_json::from_str(&json).map_err(|e| PersistenceError::Deserialization(e.to_string()))
    }

    pub fn save(&self, preferences: &Preferences) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(preferences)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| PersistenceError::Io(e.to_string()))
    }
}

impl Default for PreferencesStore {
    fn default() -> Self {
        Self::new(DEFAULT_PREFERENCES_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferencesStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load().unwrap(), Preferences::default());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferencesStore::new(dir.path().join("prefs.json"));
        let prefs = Preferences {
            difficulty: DifficultyLevel::Hard,
            mode: GameMode::HumanVsHuman,
            statistics: Statistics {
                games_played: 5,
                side_a_wins: 2,
                side_b_wins: 2,
                draws: 1,
            },
        };
        store.save(&prefs).unwrap();
        assert_eq!(store.load().unwrap(), prefs);
    }

    #[test]
    fn test_partial_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"difficulty": "Easy", "theme": "dark"}"#).unwrap();
        let prefs = PreferencesStore::new(&path).load().unwrap();
        assert_eq!(prefs.difficulty, DifficultyLevel::Easy);
        assert_eq!(prefs.mode, GameMode::HumanVsOracle);
        assert_eq!(prefs.statistics, Statistics::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            PreferencesStore::new(&path).load(),
            Err(PersistenceError::Deserialization(_))
        ));
    }
}
