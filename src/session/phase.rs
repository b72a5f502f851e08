//! Session phases

use crate::ledger::ReplayCursor;
use std::fmt;

/// Exactly one phase is active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    /// No session started yet
    #[default]
    Idle,
    InProgress,
    GameOver,
    Replay,
}

impl SessionPhase {
    /// Phases from which replay can be entered and that replay returns to
    pub fn is_resumable(self) -> bool {
        matches!(self, SessionPhase::InProgress | SessionPhase::GameOver)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::InProgress => "InProgress",
            SessionPhase::GameOver => "GameOver",
            SessionPhase::Replay => "Replay",
        };
        write!(f, "{name}")
    }
}

/// Bookkeeping held only while the phase is [`SessionPhase::Replay`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayState {
    /// Phase restored by `exit_replay`
    pub resume_to: SessionPhase,
    pub cursor: ReplayCursor,
}
