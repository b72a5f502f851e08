//! Session state machine
//!
//! `SessionController` owns the live oracle, the move ledger and the phase.
//! All mutations go through it, one at a time. Anything slow (oracle
//! searches) is handed out as a [`QueryTicket`] and comes back through
//! [`SessionController::apply_oracle_reply`], where the epoch tag decides
//! whether the answer still applies.
//!
//! Side to move is never stored: it is derived from the ledger length.

use crate::core::{Board, DifficultyLevel, GameMode, Outcome, Position, Side};
use crate::error::{PersistenceError, Result, SessionError};
use crate::ledger::{Move, MoveLedger};
use crate::oracle::{MoveOracle, NativeEngine, OracleError, OracleFactory, OracleReply, QueryTicket};
use crate::persist::SaveDocument;
use crate::session::events::{SessionEvent, SessionObserver};
use crate::session::logger::{SessionLogger, VerbosityLevel, STATUS_CATEGORY};
use crate::session::phase::{ReplayState, SessionPhase};
use crate::stats::{Statistics, StatisticsTracker};
use std::fmt;
use std::sync::Arc;

/// Result of delivering an oracle answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(Move),
    /// The answer belonged to an earlier epoch and was dropped
    Stale,
}

pub struct SessionController {
    pub(super) factory: Arc<dyn OracleFactory>,
    /// Live oracle; `None` until the first successful reset
    pub(super) oracle: Option<Box<dyn MoveOracle>>,
    pub(super) oracle_available: bool,
    pub(super) mode: GameMode,
    pub(super) difficulty: DifficultyLevel,
    pub(super) phase: SessionPhase,
    pub(super) replay: Option<ReplayState>,
    pub(super) ledger: MoveLedger,
    pub(super) board: Board,
    pub(super) last_move: Option<Position>,
    pub(super) outcome: Option<Outcome>,
    pub(super) epoch: u64,
    pub(super) pending_query: Option<QueryTicket>,
    pub(super) in_flight: Option<u64>,
    pub(super) elapsed_seconds: u64,
    pub(super) stats: StatisticsTracker,
    pub(super) logger: SessionLogger,
    pub(super) status: String,
    pub(super) observers: Vec<Box<dyn SessionObserver>>,
}

impl SessionController {
    /// Create an idle controller; call [`reset`](Self::reset) to start playing
    pub fn new(factory: Arc<dyn OracleFactory>) -> Self {
        SessionController {
            factory,
            oracle: None,
            oracle_available: true,
            mode: GameMode::default(),
            difficulty: DifficultyLevel::default(),
            phase: SessionPhase::Idle,
            replay: None,
            ledger: MoveLedger::new(),
            board: Board::empty(),
            last_move: None,
            outcome: None,
            epoch: 0,
            pending_query: None,
            in_flight: None,
            elapsed_seconds: 0,
            stats: StatisticsTracker::new(),
            logger: SessionLogger::new(),
            status: String::new(),
            observers: Vec::new(),
        }
    }

    /// Continue counting from previously persisted statistics
    pub fn with_statistics(mut self, stats: Statistics) -> Self {
        self.stats = StatisticsTracker::from_statistics(stats);
        self
    }

    pub fn with_difficulty(mut self, level: DifficultyLevel) -> Self {
        self.difficulty = level;
        self
    }

    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn logger(&self) -> &SessionLogger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut SessionLogger {
        &mut self.logger
    }

    // ------------------------------------------------------------------
    // Accessors for the presentation layer
    // ------------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Side {
        self.ledger.expected_side()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    /// Highlighted move: the latest move, or the move under the replay cursor
    pub fn last_move(&self) -> Option<Position> {
        self.last_move
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Replay cursor (-1 for the empty board), `None` outside replay
    pub fn replay_cursor(&self) -> Option<isize> {
        self.replay.map(|state| state.cursor.value())
    }

    /// `(moves shown, total moves)` while replaying
    pub fn replay_position(&self) -> Option<(usize, usize)> {
        self.replay
            .map(|state| (state.cursor.shown(), self.ledger.len()))
    }

    /// Most recent status line
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn ledger(&self) -> &MoveLedger {
        &self.ledger
    }

    pub fn statistics(&self) -> Statistics {
        self.stats.statistics()
    }

    pub fn oracle_available(&self) -> bool {
        self.oracle_available
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Epoch of the oracle query awaiting an answer, if any
    pub fn in_flight_epoch(&self) -> Option<u64> {
        self.in_flight
    }

    /// Hand the scheduled oracle query to a driver
    ///
    /// The query stays in flight until its reply is applied or the epoch
    /// moves on.
    pub fn take_pending_query(&mut self) -> Option<QueryTicket> {
        self.pending_query.take()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_plan().is_ok()
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Start a fresh session in `mode`
    ///
    /// The previous oracle instance is dropped and a new one acquired. If
    /// the oracle cannot be created for a mode that needs it, the call fails
    /// and the current session is left as it was.
    pub fn reset(&mut self, mode: GameMode) -> Result<()> {
        let (mut oracle, available) = match self.create_oracle(mode) {
            Ok(created) => created,
            Err(err) => {
                self.oracle_available = false;
                self.announce(format_args!("AI unavailable: {err}"));
                return Err(err.into());
            }
        };
        oracle.reset();
        oracle.set_strength(self.difficulty);

        self.board = Board::read_from(oracle.as_ref());
        self.oracle = Some(oracle);
        self.oracle_available = available;
        self.mode = mode;
        self.ledger.clear();
        self.last_move = None;
        self.outcome = None;
        self.replay = None;
        self.elapsed_seconds = 0;
        self.invalidate_queries();

        self.logger.normal(&format!("New game: {mode} ({})", self.difficulty));
        self.set_phase(SessionPhase::InProgress);
        self.emit(SessionEvent::TurnChanged(Side::Black));
        self.prompt_next_turn();
        Ok(())
    }

    /// Start a fresh session in the current mode
    pub fn new_game(&mut self) -> Result<()> {
        self.reset(self.mode)
    }

    /// Place a stone for the human whose turn it is
    pub fn submit_move(&mut self, row: usize, col: usize) -> Result<Move> {
        if self.phase != SessionPhase::InProgress
            || self.mode.is_oracle_controlled(self.side_to_move())
        {
            return Err(SessionError::OutOfTurn);
        }
        let pos = Position::new(row, col).ok_or(SessionError::OutOfBounds { row, col })?;
        self.play(pos)
    }

    /// Deliver an oracle move computed for `epoch`
    ///
    /// A stale epoch (or an epoch with no outstanding query) is dropped
    /// without touching the session.
    pub fn apply_oracle_result(&mut self, row: usize, col: usize, epoch: u64) -> Result<ApplyOutcome> {
        if epoch != self.epoch || self.in_flight != Some(epoch) {
            crate::log_if_verbose!(
                self.logger,
                "Dropped stale oracle move ({row}, {col}) from epoch {epoch} (current {})",
                self.epoch
            );
            return Ok(ApplyOutcome::Stale);
        }
        // An illegal suggestion for the live epoch is an oracle failure: no
        // other reply is coming for this query
        let Some(pos) = Position::new(row, col) else {
            let err = OracleError::Crashed(format!("suggested ({row}, {col}), off the board"));
            return Err(self.oracle_failed(err));
        };

        self.in_flight = None;
        match self.play(pos) {
            Ok(mv) => Ok(ApplyOutcome::Applied(mv)),
            Err(err) => Err(self.oracle_failed(OracleError::Crashed(format!(
                "suggested {pos}: {err}"
            )))),
        }
    }

    /// Deliver a complete oracle reply, including failures
    pub fn apply_oracle_reply(&mut self, reply: OracleReply) -> Result<ApplyOutcome> {
        if reply.epoch != self.epoch || self.in_flight != Some(reply.epoch) {
            crate::log_if_verbose!(
                self.logger,
                "Dropped stale oracle reply from epoch {} (current {})",
                reply.epoch,
                self.epoch
            );
            return Ok(ApplyOutcome::Stale);
        }
        match reply.result {
            Ok(Some(pos)) => self.apply_oracle_result(pos.row(), pos.col(), reply.epoch),
            Ok(None) => Err(self.oracle_failed(OracleError::Crashed(format!(
                "no move offered for {}",
                reply.side
            )))),
            Err(err) => Err(self.oracle_failed(err)),
        }
    }

    /// Take back moves according to the mode's undo policy
    ///
    /// Returns the number of plies removed.
    pub fn undo(&mut self) -> Result<usize> {
        let count = self.undo_plan()?;
        let removed = self
            .ledger
            .truncate_last(count)
            .ok_or(SessionError::NothingToUndo)?;

        let oracle = self
            .oracle
            .as_mut()
            .ok_or_else(|| SessionError::OracleUnavailable("no active session".to_string()))?;
        let undone = (0..count).take_while(|_| oracle.undo_one_ply()).count();
        if undone < count {
            self.logger
                .normal("Oracle could not take back every ply; rebuilding from the ledger");
            self.rebuild_oracle(self.ledger.len())?;
        } else {
            self.board = Board::read_from(oracle.as_ref());
        }

        self.invalidate_queries();
        self.outcome = None;
        self.last_move = self.ledger.last().map(|mv| mv.position);
        self.set_phase(SessionPhase::InProgress);

        crate::log_if_verbose!(
            self.logger,
            "Undid {}",
            removed
                .iter()
                .map(|mv| format!("{} {}", mv.side, mv.position))
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.emit(SessionEvent::MovesUndone { count: removed.len() });

        let side = self.side_to_move();
        self.emit(SessionEvent::TurnChanged(side));
        match self.mode {
            GameMode::HumanVsOracle => self.announce(format_args!("Move undone. Your turn ({side})")),
            _ => self.announce(format_args!("Move undone. {side}'s turn")),
        }
        if self.mode.is_oracle_controlled(side) {
            self.prompt_next_turn();
        }
        Ok(removed.len())
    }

    /// Change oracle strength; the next query uses the new level
    pub fn set_difficulty(&mut self, level: DifficultyLevel) {
        self.difficulty = level;
        if let Some(oracle) = self.oracle.as_mut() {
            oracle.set_strength(level);
        }
        self.logger.normal(&format!("Difficulty set to {level}"));
    }

    /// Advance the game clock by one second while play is in progress
    pub fn tick(&mut self) -> u64 {
        if self.phase == SessionPhase::InProgress {
            self.elapsed_seconds += 1;
        }
        self.elapsed_seconds
    }

    /// Replace the session with the one described by `document`
    ///
    /// The document is validated and replayed into a fresh oracle first; the
    /// current session is only replaced once that has fully succeeded.
    pub fn restore(&mut self, document: &SaveDocument) -> Result<()> {
        let positions = document.positions()?;
        let mode = document.mode;
        let (mut oracle, available) = self.create_oracle(mode)?;
        oracle.reset();
        oracle.set_strength(document.difficulty);

        let mut ledger = MoveLedger::new();
        for (index, &pos) in positions.iter().enumerate() {
            let reason = if oracle.is_terminal() {
                Some("move after the game ended".to_string())
            } else if !oracle.read_cell(pos).is_empty() {
                Some(format!("cell {pos} is already occupied"))
            } else if !oracle.apply_move(pos, ledger.expected_side()) {
                Some(format!("oracle rejected {pos}"))
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(PersistenceError::MalformedLedger { index, reason }.into());
            }
            ledger.record(pos);
        }

        let outcome = oracle
            .is_terminal()
            .then(|| oracle.winner().map_or(Outcome::Draw, Outcome::Win));
        self.board = Board::read_from(oracle.as_ref());
        self.oracle = Some(oracle);
        self.oracle_available = available;
        self.mode = mode;
        self.difficulty = document.difficulty;
        self.last_move = ledger.last().map(|mv| mv.position);
        self.ledger = ledger;
        self.outcome = outcome;
        self.replay = None;
        self.elapsed_seconds = document.elapsed_seconds;
        self.invalidate_queries();

        self.logger.normal(&format!(
            "Loaded {mode} game with {} moves",
            self.ledger.len()
        ));
        match outcome {
            Some(outcome) => {
                self.set_phase(SessionPhase::GameOver);
                self.announce_outcome(outcome);
            }
            None => {
                self.set_phase(SessionPhase::InProgress);
                self.emit(SessionEvent::TurnChanged(self.side_to_move()));
                self.prompt_next_turn();
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Create an oracle for `mode` without touching the session
    ///
    /// Also reports whether the factory supplied it: human-only modes fall
    /// back to the built-in referee when the factory fails.
    fn create_oracle(
        &self,
        mode: GameMode,
    ) -> std::result::Result<(Box<dyn MoveOracle>, bool), OracleError> {
        match self.factory.create() {
            Ok(oracle) => Ok((oracle, true)),
            Err(err) if !mode.needs_oracle() => {
                self.logger
                    .normal(&format!("{err}; using the built-in referee"));
                Ok((Box::new(NativeEngine::new()), false))
            }
            Err(err) => Err(err),
        }
    }

    /// Which undo the current state allows, as a ply count
    fn undo_plan(&self) -> Result<usize> {
        match self.phase {
            SessionPhase::InProgress | SessionPhase::GameOver => {}
            SessionPhase::Replay => return Err(SessionError::UndoUnavailable),
            SessionPhase::Idle => return Err(SessionError::NothingToUndo),
        }
        let len = self.ledger.len();
        match self.mode {
            GameMode::OracleVsOracle => Err(SessionError::UndoUnavailable),
            GameMode::HumanVsHuman if len == 0 => Err(SessionError::NothingToUndo),
            GameMode::HumanVsHuman => Ok(1),
            GameMode::HumanVsOracle => {
                if self.in_flight.is_some() {
                    Err(SessionError::UndoUnavailable)
                } else if len < 2 {
                    Err(SessionError::NothingToUndo)
                } else if len % 2 == 1 {
                    // The human's move is the last one: either it ended the
                    // game or the oracle failed before replying
                    if self.phase == SessionPhase::GameOver || !self.oracle_available {
                        Ok(1)
                    } else {
                        Err(SessionError::UndoUnavailable)
                    }
                } else {
                    Ok(2)
                }
            }
        }
    }

    /// Apply a move for the side to move, bypassing turn ownership
    fn play(&mut self, pos: Position) -> Result<Move> {
        let oracle = self
            .oracle
            .as_mut()
            .ok_or_else(|| SessionError::OracleUnavailable("no active session".to_string()))?;
        if !oracle.read_cell(pos).is_empty() {
            return Err(SessionError::CellOccupied {
                row: pos.row(),
                col: pos.col(),
            });
        }
        let side = self.ledger.expected_side();
        if !oracle.apply_move(pos, side) {
            return Err(SessionError::MoveRejected {
                row: pos.row(),
                col: pos.col(),
            });
        }
        let terminal = oracle.is_terminal();
        let winner = oracle.winner();
        self.board = Board::read_from(oracle.as_ref());

        let mv = self.ledger.record(pos);
        self.last_move = Some(pos);
        self.logger
            .record_fmt(VerbosityLevel::Normal, None, format_args!("{side} plays {pos}"));
        self.emit(SessionEvent::MoveApplied(mv));

        if terminal {
            self.finish(winner.map_or(Outcome::Draw, Outcome::Win));
        } else {
            self.emit(SessionEvent::TurnChanged(side.opponent()));
            self.prompt_next_turn();
        }
        Ok(mv)
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        self.in_flight = None;
        self.pending_query = None;
        self.set_phase(SessionPhase::GameOver);

        let stats = self.stats.record(outcome);
        self.emit(SessionEvent::GameOver(outcome));
        self.emit(SessionEvent::StatisticsChanged(stats));
        self.announce_outcome(outcome);
    }

    /// Announce whose turn it is and schedule a query if that side is the oracle's
    pub(super) fn prompt_next_turn(&mut self) {
        let side = self.side_to_move();
        if !self.mode.is_oracle_controlled(side) {
            match self.mode {
                GameMode::HumanVsOracle => self.announce(format_args!("Your turn ({side})")),
                _ => self.announce(format_args!("{side}'s turn")),
            }
            return;
        }
        if !self.oracle_available {
            self.announce(format_args!("AI unavailable; start a Player vs Player game"));
            return;
        }

        let epoch = self.epoch;
        self.pending_query = Some(QueryTicket {
            epoch,
            side,
            difficulty: self.difficulty,
            moves: self.ledger.moves().to_vec(),
        });
        self.in_flight = Some(epoch);
        crate::log_if_verbose!(self.logger, "Scheduled {side} query at epoch {epoch}");
        self.emit(SessionEvent::OracleQueryScheduled { epoch, side });
        match self.mode {
            GameMode::OracleVsOracle => self.announce(format_args!("{side} AI is thinking...")),
            _ => self.announce(format_args!("AI is thinking...")),
        }
    }

    pub(super) fn announce_outcome(&mut self, outcome: Outcome) {
        match (self.mode, outcome) {
            (_, Outcome::Draw) => self.announce(format_args!("It's a draw!")),
            (GameMode::HumanVsOracle, Outcome::Win(Side::Black)) => {
                self.announce(format_args!("You win! Congratulations!"))
            }
            (GameMode::HumanVsOracle, Outcome::Win(Side::White)) => {
                self.announce(format_args!("AI wins! Better luck next time."))
            }
            (GameMode::HumanVsHuman, Outcome::Win(side)) => {
                self.announce(format_args!("{side} player wins!"))
            }
            (GameMode::OracleVsOracle, Outcome::Win(side)) => {
                self.announce(format_args!("{side} AI wins!"))
            }
        }
    }

    /// Disable oracle-driven play after the oracle failed mid-game
    fn oracle_failed(&mut self, err: OracleError) -> SessionError {
        self.in_flight = None;
        self.pending_query = None;
        self.oracle_available = false;
        self.announce(format_args!("AI unavailable: {err}"));
        err.into()
    }

    /// Bump the epoch so every outstanding query becomes stale
    pub(super) fn invalidate_queries(&mut self) {
        self.epoch += 1;
        self.in_flight = None;
        self.pending_query = None;
    }

    /// Reset the live oracle and replay the first `upto` ledger moves into it
    pub(super) fn rebuild_oracle(&mut self, upto: usize) -> Result<()> {
        let oracle = self
            .oracle
            .as_mut()
            .ok_or_else(|| SessionError::OracleUnavailable("no active session".to_string()))?;
        oracle.reset();
        oracle.set_strength(self.difficulty);
        for mv in &self.ledger.moves()[..upto.min(self.ledger.len())] {
            if !oracle.apply_move(mv.position, mv.side) {
                return Err(OracleError::Desync { ply: mv.ply }.into());
            }
        }
        self.board = Board::read_from(oracle.as_ref());
        Ok(())
    }

    pub(super) fn set_phase(&mut self, to: SessionPhase) {
        let from = self.phase;
        if from != to {
            self.phase = to;
            crate::log_if_verbose!(self.logger, "Phase {from} -> {to}");
            self.emit(SessionEvent::PhaseChanged { from, to });
        }
    }

    /// Record a status line and publish it
    pub(super) fn announce(&mut self, args: fmt::Arguments<'_>) {
        let text = self
            .logger
            .record_fmt(VerbosityLevel::Normal, Some(STATUS_CATEGORY), args);
        self.status = text.clone();
        self.emit(SessionEvent::Status(text));
    }

    pub(super) fn emit(&mut self, event: SessionEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(&event);
        }
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("moves", &self.ledger.len())
            .field("epoch", &self.epoch)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
