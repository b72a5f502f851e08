//! Replay navigation
//!
//! Replay walks a cursor over the ledger without changing it. Every board
//! shown is rebuilt by resetting the oracle and replaying the prefix up to
//! the cursor, so what is displayed is always something the oracle accepted.

use crate::error::{Result, SessionError};
use crate::ledger::ReplayCursor;
use crate::session::controller::SessionController;
use crate::session::events::SessionEvent;
use crate::session::phase::{ReplayState, SessionPhase};

impl SessionController {
    /// Enter replay positioned on the most recent move
    pub fn enter_replay(&mut self) -> Result<isize> {
        match self.phase {
            SessionPhase::Replay => return Err(SessionError::AlreadyInReplay),
            phase if !phase.is_resumable() => return Err(SessionError::NothingToReplay),
            _ => {}
        }
        if self.ledger.is_empty() {
            return Err(SessionError::NothingToReplay);
        }

        // A search for the live position must not land while the oracle
        // holds a replayed one
        self.invalidate_queries();

        let cursor = ReplayCursor::at_end(self.ledger.len());
        self.replay = Some(ReplayState {
            resume_to: self.phase,
            cursor,
        });
        self.set_phase(SessionPhase::Replay);
        self.show_cursor(cursor);
        Ok(cursor.value())
    }

    /// Step one move forward (clamped at the last move)
    pub fn next_move(&mut self) -> Result<isize> {
        let state = self.replay.ok_or(SessionError::NotInReplay)?;
        self.move_cursor(state.cursor.forward(self.ledger.len()))
    }

    /// Step one move back (clamped at the empty board)
    pub fn previous_move(&mut self) -> Result<isize> {
        let state = self.replay.ok_or(SessionError::NotInReplay)?;
        self.move_cursor(state.cursor.back())
    }

    /// Jump straight to `target` (-1 for the empty board)
    pub fn seek_replay(&mut self, target: isize) -> Result<isize> {
        if self.replay.is_none() {
            return Err(SessionError::NotInReplay);
        }
        let len = self.ledger.len();
        let cursor = ReplayCursor::seek(target, len).ok_or(SessionError::ReplayCursorOutOfRange {
            requested: target,
            len,
        })?;
        self.move_cursor(cursor)
    }

    /// Leave replay and return to the live game
    pub fn exit_replay(&mut self) -> Result<()> {
        let state = self.replay.ok_or(SessionError::NotInReplay)?;
        self.rebuild_oracle(self.ledger.len())?;

        self.replay = None;
        self.last_move = self.ledger.last().map(|mv| mv.position);
        self.set_phase(state.resume_to);

        match (state.resume_to, self.outcome) {
            (SessionPhase::GameOver, Some(outcome)) => self.announce_outcome(outcome),
            _ => {
                self.emit(SessionEvent::TurnChanged(self.side_to_move()));
                self.prompt_next_turn();
            }
        }
        Ok(())
    }

    fn move_cursor(&mut self, cursor: ReplayCursor) -> Result<isize> {
        let Some(state) = self.replay else {
            return Err(SessionError::NotInReplay);
        };
        if cursor != state.cursor {
            self.rebuild_oracle(cursor.shown())?;
            self.replay = Some(ReplayState { cursor, ..state });
            self.show_cursor(cursor);
        }
        Ok(cursor.value())
    }

    /// Highlight the move under the cursor and report it
    fn show_cursor(&mut self, cursor: ReplayCursor) {
        let shown = cursor.index().and_then(|index| self.ledger.get(index)).copied();
        self.last_move = shown.map(|mv| mv.position);
        self.emit(SessionEvent::ReplayMoved {
            cursor: cursor.value(),
        });
        match shown {
            Some(mv) => {
                let total = self.ledger.len();
                self.announce(format_args!(
                    "Replay: Move {}/{} - {}",
                    cursor.shown(),
                    total,
                    mv.side
                ))
            }
            None => self.announce(format_args!("Replay: Initial board")),
        }
    }
}
