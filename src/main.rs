//! Gomoku session - Main Binary
//!
//! Text front end for the session controller: interactive play, oracle
//! self-play and persisted statistics.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gomoku_session::{
    core::{DifficultyLevel, GameMode},
    oracle::{NativeEngineFactory, OracleFactory, RandomOracleFactory},
    persist::{Preferences, PreferencesStore, DEFAULT_PREFERENCES_FILE},
    session::{
        OutputMode, SessionCommand, SessionController, SessionPhase, SessionRuntime,
        VerbosityLevel,
    },
    tui::{parse_command, render_board, render_status, TuiCommand, HELP},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Which oracle implementation backs the session
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OracleKind {
    /// Built-in alpha-beta engine
    Native,
    /// Random adjacent moves (fast, for demos)
    Random,
}

/// Verbosity level for session output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "gomoku")]
#[command(about = "Gomoku session controller - connect five on a 15x15 board", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play an interactive game on stdin/stdout
    Play {
        /// Game mode: hvo (you play Black), hvh or ovo (defaults to the saved preference)
        #[arg(long)]
        mode: Option<GameMode>,

        /// Oracle strength: easy, medium or hard (defaults to the saved preference)
        #[arg(long)]
        difficulty: Option<DifficultyLevel>,

        /// Oracle implementation
        #[arg(long, value_enum, default_value = "native")]
        oracle: OracleKind,

        /// Set random seed for deterministic testing
        #[arg(long)]
        seed: Option<u64>,

        /// Preferences and statistics file
        #[arg(long, default_value = DEFAULT_PREFERENCES_FILE)]
        prefs: PathBuf,

        /// Verbosity level (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,

        /// Resume a saved game
        #[arg(long, value_name = "SAVE_FILE")]
        load: Option<PathBuf>,
    },

    /// Watch the oracle play itself
    Watch {
        #[arg(long)]
        difficulty: Option<DifficultyLevel>,

        #[arg(long, value_enum, default_value = "native")]
        oracle: OracleKind,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value = DEFAULT_PREFERENCES_FILE)]
        prefs: PathBuf,

        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,

        /// Stop after this many plies even if the game is still open
        #[arg(long, default_value_t = 225)]
        max_plies: usize,
    },

    /// Print persisted statistics
    Stats {
        #[arg(long, default_value = DEFAULT_PREFERENCES_FILE)]
        prefs: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            mode,
            difficulty,
            oracle,
            seed,
            prefs,
            verbosity,
            load,
        } => {
            run_play(
                mode,
                difficulty,
                make_factory(oracle, seed),
                prefs,
                verbosity.into(),
                load,
            )
            .await?
        }
        Commands::Watch {
            difficulty,
            oracle,
            seed,
            prefs,
            verbosity,
            max_plies,
        } => {
            run_watch(
                difficulty,
                make_factory(oracle, seed),
                prefs,
                verbosity.into(),
                max_plies,
            )
            .await?
        }
        Commands::Stats { prefs } => {
            let preferences = PreferencesStore::new(&prefs)
                .load()
                .with_context(|| format!("reading {}", prefs.display()))?;
            println!("{}", preferences.statistics);
        }
    }

    Ok(())
}

fn make_factory(kind: OracleKind, seed: Option<u64>) -> Arc<dyn OracleFactory> {
    match kind {
        OracleKind::Native => Arc::new(NativeEngineFactory),
        OracleKind::Random => Arc::new(RandomOracleFactory::with_seed(
            seed.unwrap_or_else(rand::random),
        )),
    }
}

/// Load preferences and build a runtime that keeps them up to date
fn build_runtime(
    factory: Arc<dyn OracleFactory>,
    prefs: PathBuf,
    difficulty: Option<DifficultyLevel>,
    verbosity: VerbosityLevel,
) -> Result<(SessionRuntime, Preferences)> {
    let store = PreferencesStore::new(prefs);
    let preferences = store
        .load()
        .with_context(|| format!("reading preferences from {}", store.path().display()))?;

    let mut controller = SessionController::new(Arc::clone(&factory))
        .with_statistics(preferences.statistics)
        .with_difficulty(difficulty.unwrap_or(preferences.difficulty));
    let logger = controller.logger_mut();
    logger.set_verbosity(verbosity);
    if verbosity >= VerbosityLevel::Verbose {
        logger.set_output_mode(OutputMode::Both);
    }

    let runtime = SessionRuntime::with_controller(controller, factory).with_preferences(store, preferences);
    Ok((runtime, preferences))
}

async fn run_play(
    mode: Option<GameMode>,
    difficulty: Option<DifficultyLevel>,
    factory: Arc<dyn OracleFactory>,
    prefs: PathBuf,
    verbosity: VerbosityLevel,
    load: Option<PathBuf>,
) -> Result<()> {
    let (mut runtime, preferences) = build_runtime(factory, prefs, difficulty, verbosity)?;
    let start = match load {
        Some(path) => SessionCommand::Load(path),
        None => SessionCommand::NewGame(mode.unwrap_or(preferences.mode)),
    };
    runtime.execute(start).context("starting the game")?;

    println!("=== Gomoku ===  (type 'help' for commands)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut clock = tokio::time::interval(Duration::from_secs(1));
    let mut redraw = true;

    loop {
        if redraw {
            print_session(runtime.controller());
            runtime.controller_mut().logger_mut().clear_logs();
            redraw = false;
        }

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(msg) => {
                        println!("{msg}");
                        continue;
                    }
                };
                let session_command = match command {
                    TuiCommand::Session(command) => command,
                    TuiCommand::NewGame(mode) => {
                        SessionCommand::NewGame(mode.unwrap_or(runtime.controller().mode()))
                    }
                    TuiCommand::ShowBoard => {
                        redraw = true;
                        continue;
                    }
                    TuiCommand::ShowStats => {
                        println!("{}", runtime.controller().statistics());
                        continue;
                    }
                    TuiCommand::Help => {
                        println!("{HELP}");
                        continue;
                    }
                    TuiCommand::Quit => break,
                };
                if let Err(err) = runtime.execute(session_command) {
                    println!("Error: {err}");
                }
                redraw = true;
            }
            Some(result) = runtime.next_reply() => {
                if let Err(err) = result {
                    println!("Error: {err}");
                }
                redraw = true;
            }
            _ = clock.tick() => {
                runtime.controller_mut().tick();
            }
        }
    }

    println!("{}", runtime.controller().statistics());
    Ok(())
}

async fn run_watch(
    difficulty: Option<DifficultyLevel>,
    factory: Arc<dyn OracleFactory>,
    prefs: PathBuf,
    verbosity: VerbosityLevel,
    max_plies: usize,
) -> Result<()> {
    let (mut runtime, _) = build_runtime(factory, prefs, difficulty, verbosity)?;
    runtime
        .execute(SessionCommand::NewGame(GameMode::OracleVsOracle))
        .context("starting the game")?;

    while runtime.controller().ledger().len() < max_plies {
        match runtime.next_reply().await {
            Some(result) => {
                result.context("oracle failed")?;
                if verbosity >= VerbosityLevel::Normal {
                    print_session(runtime.controller());
                }
            }
            None => break,
        }
    }

    let session = runtime.controller();
    if session.phase() != SessionPhase::GameOver {
        println!("Stopped after {} plies", session.ledger().len());
    }
    print_session(session);
    Ok(())
}

fn print_session(session: &SessionController) {
    println!();
    print!("{}", render_board(session.board(), session.last_move()));
    println!("{}", render_status(session));
}
