//! Async driver for a session
//!
//! `SessionRuntime` owns the controller and is the only thing that mutates
//! it. Oracle searches run on tokio's blocking pool and report back over an
//! unbounded channel; replies are applied one at a time, interleaved with
//! user commands, so the session never sees two mutations at once.

use crate::core::{DifficultyLevel, GameMode};
use crate::error::{Result, SessionError};
use crate::oracle::{OracleFactory, OracleReply};
use crate::persist::{Preferences, PreferencesStore, SaveDocument};
use crate::session::controller::{ApplyOutcome, SessionController};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Requests a presentation layer can make
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    NewGame(GameMode),
    Submit { row: usize, col: usize },
    Undo,
    SetDifficulty(DifficultyLevel),
    EnterReplay,
    ExitReplay,
    Next,
    Previous,
    Seek(isize),
    Save(PathBuf),
    Load(PathBuf),
    /// Advance the game clock by one second
    Tick,
    Shutdown,
}

pub struct SessionRuntime {
    controller: SessionController,
    factory: Arc<dyn OracleFactory>,
    reply_tx: mpsc::UnboundedSender<OracleReply>,
    reply_rx: mpsc::UnboundedReceiver<OracleReply>,
    preferences: Option<PreferencesStore>,
    last_saved: Option<Preferences>,
}

impl SessionRuntime {
    /// Build a runtime around a fresh controller using `factory` for every oracle
    pub fn new(factory: Arc<dyn OracleFactory>) -> Self {
        Self::with_controller(SessionController::new(Arc::clone(&factory)), factory)
    }

    /// Drive an existing controller; `factory` supplies detached search instances
    pub fn with_controller(controller: SessionController, factory: Arc<dyn OracleFactory>) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        SessionRuntime {
            controller,
            factory,
            reply_tx,
            reply_rx,
            preferences: None,
            last_saved: None,
        }
    }

    /// Rewrite `store` whenever difficulty, mode or statistics change
    pub fn with_preferences(mut self, store: PreferencesStore, current: Preferences) -> Self {
        self.preferences = Some(store);
        self.last_saved = Some(current);
        self
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut SessionController {
        &mut self.controller
    }

    pub fn into_controller(self) -> SessionController {
        self.controller
    }

    /// Apply one command, then start any oracle search it scheduled
    ///
    /// Must be called from within a tokio runtime.
    pub fn execute(&mut self, command: SessionCommand) -> Result<()> {
        let ctrl = &mut self.controller;
        let result = match command {
            SessionCommand::NewGame(mode) => ctrl.reset(mode),
            SessionCommand::Submit { row, col } => ctrl.submit_move(row, col).map(|_| ()),
            SessionCommand::Undo => ctrl.undo().map(|_| ()),
            SessionCommand::SetDifficulty(level) => {
                ctrl.set_difficulty(level);
                Ok(())
            }
            SessionCommand::EnterReplay => ctrl.enter_replay().map(|_| ()),
            SessionCommand::ExitReplay => ctrl.exit_replay(),
            SessionCommand::Next => ctrl.next_move().map(|_| ()),
            SessionCommand::Previous => ctrl.previous_move().map(|_| ()),
            SessionCommand::Seek(target) => ctrl.seek_replay(target).map(|_| ()),
            SessionCommand::Save(path) => SaveDocument::capture(ctrl)
                .save_to_file(&path)
                .map_err(SessionError::from)
                .map(|()| ctrl.logger().normal(&format!("Game saved to {}", path.display()))),
            SessionCommand::Load(path) => SaveDocument::load_from_file(&path)
                .map_err(SessionError::from)
                .and_then(|document| ctrl.restore(&document)),
            SessionCommand::Tick => {
                ctrl.tick();
                Ok(())
            }
            SessionCommand::Shutdown => Ok(()),
        };
        self.dispatch_pending();
        self.sync_preferences();
        result
    }

    /// Wait for the next oracle reply and apply it
    ///
    /// Returns `None` without waiting when no query is outstanding.
    pub async fn next_reply(&mut self) -> Option<Result<ApplyOutcome>> {
        self.controller.in_flight_epoch()?;
        let reply = self.reply_rx.recv().await?;
        Some(self.apply_reply(reply))
    }

    /// Apply oracle replies until no query is outstanding
    ///
    /// In oracle-vs-oracle mode this plays the game to the end.
    pub async fn settle(&mut self) -> Result<()> {
        while let Some(result) = self.next_reply().await {
            result?;
        }
        Ok(())
    }

    /// Serve commands until `Shutdown` or the sender is dropped
    ///
    /// Command errors are reported through the session logger and do not
    /// stop the loop. Returns the controller for inspection.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) -> SessionController {
        let mut clock = tokio::time::interval(Duration::from_secs(1));
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        clock.tick().await;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => {
                        if let Err(err) = self.execute(command) {
                            self.controller.logger().normal(&format!("Command failed: {err}"));
                        }
                    }
                },
                Some(reply) = self.reply_rx.recv() => {
                    if let Err(err) = self.apply_reply(reply) {
                        self.controller.logger().normal(&format!("Oracle reply failed: {err}"));
                    }
                }
                _ = clock.tick() => {
                    self.controller.tick();
                }
            }
        }
        self.controller
    }

    fn apply_reply(&mut self, reply: OracleReply) -> Result<ApplyOutcome> {
        let result = self.controller.apply_oracle_reply(reply);
        self.dispatch_pending();
        self.sync_preferences();
        result
    }

    /// Move a scheduled query onto the blocking pool
    fn dispatch_pending(&mut self) {
        let Some(ticket) = self.controller.take_pending_query() else {
            return;
        };
        crate::log_if_verbose!(
            self.controller.logger(),
            "Searching for {} at epoch {} ({} moves)",
            ticket.side,
            ticket.epoch,
            ticket.moves.len()
        );
        let factory = Arc::clone(&self.factory);
        let reply_tx = self.reply_tx.clone();
        tokio::task::spawn_blocking(move || {
            let reply = ticket.resolve(factory.as_ref());
            // The runtime may already be gone
            let _ = reply_tx.send(reply);
        });
    }

    /// Write preferences if they changed
    ///
    /// A failed write is logged and retried after the next command; it never
    /// turns a successful command into an error.
    fn sync_preferences(&mut self) {
        let Some(store) = &self.preferences else {
            return;
        };
        let current = Preferences {
            difficulty: self.controller.difficulty(),
            mode: self.controller.mode(),
            statistics: self.controller.statistics(),
        };
        if self.last_saved == Some(current) {
            return;
        }
        match store.save(&current) {
            Ok(()) => self.last_saved = Some(current),
            Err(err) => self.controller.logger().normal(&format!(
                "Could not save preferences to {}: {err}",
                store.path().display()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::NativeEngineFactory;
    use crate::session::SessionPhase;

    #[tokio::test]
    async fn test_oracle_reply_arrives() {
        let mut runtime = SessionRuntime::new(Arc::new(NativeEngineFactory));
        runtime.execute(SessionCommand::NewGame(GameMode::HumanVsOracle)).unwrap();
        runtime.execute(SessionCommand::Submit { row: 7, col: 7 }).unwrap();

        let outcome = runtime.next_reply().await.unwrap().unwrap();
        assert!(matches!(outcome, ApplyOutcome::Applied(_)));
        assert_eq!(runtime.controller().ledger().len(), 2);
        assert!(runtime.next_reply().await.is_none());
    }

    #[tokio::test]
    async fn test_errors_are_returned() {
        let mut runtime = SessionRuntime::new(Arc::new(NativeEngineFactory));
        runtime.execute(SessionCommand::NewGame(GameMode::HumanVsHuman)).unwrap();
        assert!(runtime.execute(SessionCommand::Next).is_err());
        assert_eq!(runtime.controller().phase(), SessionPhase::InProgress);
    }
}
