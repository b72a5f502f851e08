//! Async runtime end-to-end tests
//!
//! Oracle searches run on tokio's blocking pool here, so these tests cover
//! the real hand-off between background searches and the session.

use gomoku_session::{
    core::{Cell, DifficultyLevel, GameMode, Outcome, Position, Side},
    oracle::{
        MoveOracle, NativeEngine, NativeEngineFactory, OracleError, OracleFactory,
        RandomOracleFactory,
    },
    persist::{Preferences, PreferencesStore, SaveDocument},
    session::{
        ApplyOutcome, EventRecorder, SessionCommand, SessionController, SessionEvent, SessionPhase,
        SessionRuntime,
    },
    Result, SessionError,
};
use similar_asserts::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

fn random_factory(seed: u64) -> Arc<dyn OracleFactory> {
    Arc::new(RandomOracleFactory::with_seed(seed))
}

/// Follows the rules but always suggests the centre, taken or not
struct CenterOnlyOracle(NativeEngine);

impl MoveOracle for CenterOnlyOracle {
    fn reset(&mut self) {
        self.0.reset();
    }

    fn apply_move(&mut self, pos: Position, side: Side) -> bool {
        self.0.apply_move(pos, side)
    }

    fn query_best_move(&mut self) -> std::result::Result<Option<Position>, OracleError> {
        Ok(Some(Position::center()))
    }

    fn is_terminal(&self) -> bool {
        self.0.is_terminal()
    }

    fn winner(&self) -> Option<Side> {
        self.0.winner()
    }

    fn set_strength(&mut self, level: DifficultyLevel) {
        self.0.set_strength(level);
    }

    fn undo_one_ply(&mut self) -> bool {
        self.0.undo_one_ply()
    }

    fn can_undo(&self) -> bool {
        self.0.can_undo()
    }

    fn read_cell(&self, pos: Position) -> Cell {
        self.0.read_cell(pos)
    }

    fn name(&self) -> &str {
        "center-only"
    }
}

fn center_only_factory() -> Arc<dyn OracleFactory> {
    let create = || -> std::result::Result<Box<dyn MoveOracle>, OracleError> {
        Ok(Box::new(CenterOnlyOracle(NativeEngine::new())))
    };
    Arc::new(create)
}

#[tokio::test]
async fn test_oracle_vs_oracle_settles_to_game_over() -> Result<()> {
    let mut runtime = SessionRuntime::new(random_factory(42));
    runtime.execute(SessionCommand::NewGame(GameMode::OracleVsOracle))?;
    runtime.settle().await?;

    let session = runtime.controller();
    println!(
        "Game finished after {} plies: {}",
        session.ledger().len(),
        session.status()
    );
    assert_eq!(session.phase(), SessionPhase::GameOver);
    assert!(session.outcome().is_some());
    assert!(session.ledger().is_consistent());
    assert_eq!(session.board().stone_count(), session.ledger().len());
    assert_eq!(session.statistics().games_played, 1);
    Ok(())
}

#[tokio::test]
async fn test_human_vs_oracle_turns_alternate() -> Result<()> {
    let mut runtime = SessionRuntime::new(Arc::new(NativeEngineFactory));
    runtime.execute(SessionCommand::NewGame(GameMode::HumanVsOracle))?;

    for (row, col) in [(7, 7), (3, 3), (11, 11)] {
        if runtime.execute(SessionCommand::Submit { row, col }).is_err() {
            continue;
        }
        assert_eq!(runtime.controller().status(), "AI is thinking...");
        runtime.settle().await?;
        assert_eq!(runtime.controller().side_to_move(), Side::Black);
    }

    let ledger = runtime.controller().ledger();
    assert_eq!(ledger.len() % 2, 0);
    assert!(ledger.moves().iter().skip(1).step_by(2).all(|mv| mv.side == Side::White));
    Ok(())
}

#[tokio::test]
async fn test_new_game_drops_search_in_flight() -> Result<()> {
    let mut runtime = SessionRuntime::new(Arc::new(NativeEngineFactory));
    runtime.execute(SessionCommand::NewGame(GameMode::HumanVsOracle))?;
    runtime.execute(SessionCommand::Submit { row: 7, col: 7 })?;
    let abandoned = runtime.controller().epoch();

    // Start over before the search comes back
    runtime.execute(SessionCommand::NewGame(GameMode::HumanVsOracle))?;
    assert!(runtime.controller().epoch() > abandoned);
    assert!(runtime.next_reply().await.is_none());
    assert!(runtime.controller().ledger().is_empty());

    runtime.execute(SessionCommand::Submit { row: 2, col: 2 })?;
    let mut applied = Vec::new();
    while let Some(outcome) = runtime.next_reply().await {
        if let ApplyOutcome::Applied(mv) = outcome? {
            applied.push(mv);
        }
    }

    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].side, Side::White);
    let ledger = runtime.controller().ledger();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.moves()[0].row(), 2);
    Ok(())
}

#[tokio::test]
async fn test_preferences_follow_the_session() -> Result<()> {
    let dir = TempDir::new()?;
    let store = PreferencesStore::new(dir.path().join("prefs.json"));

    let mut runtime = SessionRuntime::new(Arc::new(NativeEngineFactory))
        .with_preferences(store.clone(), Preferences::default());
    runtime.execute(SessionCommand::NewGame(GameMode::HumanVsHuman))?;
    assert_eq!(store.load()?.mode, GameMode::HumanVsHuman);

    for col in 0..4 {
        runtime.execute(SessionCommand::Submit { row: 4, col })?;
        runtime.execute(SessionCommand::Submit { row: 5, col })?;
    }
    runtime.execute(SessionCommand::Submit { row: 4, col: 4 })?;
    assert_eq!(runtime.controller().outcome(), Some(Outcome::Win(Side::Black)));

    let saved = store.load()?;
    assert_eq!(saved.statistics.games_played, 1);
    assert_eq!(saved.statistics.side_a_wins, 1);

    // A new runtime picks the counters back up
    let preferences = store.load()?;
    let controller = SessionController::new(Arc::new(NativeEngineFactory))
        .with_statistics(preferences.statistics);
    assert_eq!(controller.statistics(), saved.statistics);
    Ok(())
}

#[tokio::test]
async fn test_save_and_load_commands() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("save.json");

    let mut runtime = SessionRuntime::new(Arc::new(NativeEngineFactory));
    runtime.execute(SessionCommand::NewGame(GameMode::HumanVsOracle))?;
    runtime.execute(SessionCommand::Submit { row: 7, col: 7 })?;
    runtime.settle().await?;
    runtime.execute(SessionCommand::Save(path.clone()))?;
    let ledger = runtime.controller().ledger().clone();

    runtime.execute(SessionCommand::NewGame(GameMode::HumanVsHuman))?;
    runtime.execute(SessionCommand::Load(path.clone()))?;
    assert_eq!(runtime.controller().ledger(), &ledger);
    assert_eq!(runtime.controller().mode(), GameMode::HumanVsOracle);
    assert_eq!(SaveDocument::load_from_file(&path)?.move_count(), 2);

    // A failed load leaves the session alone
    let missing = dir.path().join("missing.json");
    assert!(runtime.execute(SessionCommand::Load(missing)).is_err());
    assert_eq!(runtime.controller().ledger(), &ledger);
    Ok(())
}

#[tokio::test]
async fn test_run_loop_serves_commands_until_shutdown() -> Result<()> {
    let mut controller = SessionController::new(random_factory(7));
    let recorder = EventRecorder::new();
    controller.subscribe(Box::new(recorder.clone()));

    let runtime = SessionRuntime::with_controller(controller, random_factory(7));
    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(runtime.run(rx));

    tx.send(SessionCommand::NewGame(GameMode::OracleVsOracle))
        .await
        .expect("runtime alive");

    let finished = tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            if recorder
                .events()
                .iter()
                .any(|e| matches!(e, SessionEvent::GameOver(_)))
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(finished.is_ok(), "oracle self-play did not finish");

    tx.send(SessionCommand::Shutdown).await.expect("runtime alive");
    let controller = handle.await?;
    assert_eq!(controller.phase(), SessionPhase::GameOver);
    assert_eq!(controller.statistics().games_played, 1);
    assert!(controller.ledger().is_consistent());
    Ok(())
}

#[tokio::test]
async fn test_run_loop_stops_when_sender_dropped() -> Result<()> {
    let runtime = SessionRuntime::new(Arc::new(NativeEngineFactory));
    let (tx, rx) = mpsc::channel(4);
    tx.send(SessionCommand::NewGame(GameMode::HumanVsHuman))
        .await
        .expect("runtime alive");
    tx.send(SessionCommand::Submit { row: 7, col: 7 })
        .await
        .expect("runtime alive");
    // Occupied cell: logged and skipped
    tx.send(SessionCommand::Submit { row: 7, col: 7 })
        .await
        .expect("runtime alive");
    drop(tx);

    let controller = runtime.run(rx).await;
    assert_eq!(controller.ledger().len(), 1);
    assert_eq!(controller.side_to_move(), Side::White);
    Ok(())
}

#[tokio::test]
async fn test_illegal_oracle_move_does_not_stall_the_session() -> Result<()> {
    let mut runtime = SessionRuntime::new(center_only_factory());
    runtime.execute(SessionCommand::NewGame(GameMode::HumanVsOracle))?;
    runtime.execute(SessionCommand::Submit { row: 7, col: 7 })?;

    let result = runtime.next_reply().await.expect("reply delivered");
    assert!(matches!(result, Err(SessionError::OracleUnavailable(_))));

    // Nothing is left in flight, so waiting returns at once
    assert!(runtime.next_reply().await.is_none());
    let session = runtime.controller();
    assert!(session.in_flight_epoch().is_none());
    assert!(!session.oracle_available());
    assert_eq!(session.ledger().len(), 1);

    // A fresh game gets a working oracle again
    runtime.execute(SessionCommand::NewGame(GameMode::HumanVsOracle))?;
    assert!(runtime.controller().oracle_available());
    Ok(())
}

#[tokio::test]
async fn test_preferences_write_failure_keeps_command_result() -> Result<()> {
    let dir = TempDir::new()?;
    let store = PreferencesStore::new(dir.path().join("no_such_dir").join("prefs.json"));

    let mut runtime = SessionRuntime::new(Arc::new(NativeEngineFactory))
        .with_preferences(store, Preferences::default());
    runtime.execute(SessionCommand::NewGame(GameMode::HumanVsHuman))?;
    runtime.execute(SessionCommand::Submit { row: 7, col: 7 })?;

    assert_eq!(runtime.controller().ledger().len(), 1);
    assert!(runtime
        .controller()
        .logger()
        .logs()
        .iter()
        .any(|entry| entry.message.starts_with("Could not save preferences")));
    Ok(())
}
