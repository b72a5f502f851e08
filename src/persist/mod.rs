//! On-disk documents: save games and preferences

pub mod preferences;
pub mod save;

pub use preferences::{Preferences, PreferencesStore, DEFAULT_PREFERENCES_FILE};
pub use save::{SaveDocument, SavedMove, SAVE_FORMAT_VERSION};
