//! Plain-text front end
//!
//! Renders the board mirror and turns typed lines into session commands.
//! Used by the `play` and `watch` subcommands.

use crate::core::{Board, Cell, DifficultyLevel, GameMode, Position, BOARD_SIZE};
use crate::session::{SessionCommand, SessionController, SessionPhase};
use std::fmt::Write as FmtWrite;
use std::path::PathBuf;

/// Save file used when `save`/`load` are given no path
pub const DEFAULT_SAVE_FILE: &str = "gomoku_save.json";

/// A parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiCommand {
    Session(SessionCommand),
    /// Start over, in the given mode or the current one
    NewGame(Option<GameMode>),
    ShowBoard,
    ShowStats,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  <row> <col>          place a stone (0-14 each)
  undo | u             take back a move
  replay               review the game
  next | n, prev | p   step through the replay
  seek <index>         jump to a move (-1 = empty board)
  exit                 leave the replay
  new [hvo|hvh|ovo]    start a new game
  difficulty <level>   easy, medium or hard
  save [file] | load [file]
  board | stats | help | quit";

/// Render the board with row/column labels; the highlighted move is bracketed
pub fn render_board(board: &Board, highlight: Option<Position>) -> String {
    let mut out = String::with_capacity((BOARD_SIZE + 1) * (BOARD_SIZE * 3 + 4));
    out.push_str("   ");
    for col in 0..BOARD_SIZE {
        let _ = write!(out, "{col:>3}");
    }
    out.push('\n');

    for (row, cells) in board.rows().enumerate() {
        let _ = write!(out, "{row:>3}");
        for (col, cell) in cells.iter().enumerate() {
            let glyph = match cell {
                Cell::Empty => '.',
                Cell::Black => 'X',
                Cell::White => 'O',
            };
            let marked = highlight.is_some_and(|pos| pos.row() == row && pos.col() == col);
            if marked {
                let _ = write!(out, " [{glyph}]");
                continue;
            }
            let _ = write!(out, "  {glyph}");
        }
        out.push('\n');
    }
    out
}

/// One-line summary under the board
pub fn render_status(session: &SessionController) -> String {
    let mut line = format!(
        "[{} | {} | move {} | {}s]",
        session.mode(),
        session.difficulty(),
        session.ledger().len(),
        session.elapsed_seconds()
    );
    if session.phase() == SessionPhase::Replay {
        if let Some((shown, total)) = session.replay_position() {
            let _ = write!(line, " replay {shown}/{total}");
        }
    }
    if !session.status().is_empty() {
        let _ = write!(line, " {}", session.status());
    }
    line
}

/// Parse one line of input
pub fn parse_command(line: &str) -> Result<TuiCommand, String> {
    let words: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .collect();
    let Some((&head, rest)) = words.split_first() else {
        return Err("empty command".to_string());
    };

    if let Ok(row) = head.parse::<usize>() {
        let col = match rest {
            [col] => col
                .parse::<usize>()
                .map_err(|_| format!("invalid column '{col}'"))?,
            _ => return Err("expected '<row> <col>'".to_string()),
        };
        return Ok(TuiCommand::Session(SessionCommand::Submit { row, col }));
    }

    let path_arg = || PathBuf::from(rest.first().copied().unwrap_or(DEFAULT_SAVE_FILE));
    let command = match (head.to_lowercase().as_str(), rest) {
        ("undo" | "u", []) => TuiCommand::Session(SessionCommand::Undo),
        ("replay" | "r", []) => TuiCommand::Session(SessionCommand::EnterReplay),
        ("next" | "n", []) => TuiCommand::Session(SessionCommand::Next),
        ("prev" | "previous" | "p", []) => TuiCommand::Session(SessionCommand::Previous),
        ("exit" | "resume", []) => TuiCommand::Session(SessionCommand::ExitReplay),
        ("seek", [index]) => {
            let index = index
                .parse::<isize>()
                .map_err(|_| format!("invalid move index '{index}'"))?;
            TuiCommand::Session(SessionCommand::Seek(index))
        }
        ("save", [] | [_]) => TuiCommand::Session(SessionCommand::Save(path_arg())),
        ("load", [] | [_]) => TuiCommand::Session(SessionCommand::Load(path_arg())),
        ("new", []) => TuiCommand::NewGame(None),
        ("new", [mode]) => TuiCommand::NewGame(Some(mode.parse()?)),
        ("difficulty" | "d", [level]) => {
            TuiCommand::Session(SessionCommand::SetDifficulty(level.parse::<DifficultyLevel>()?))
        }
        ("board" | "b", []) => TuiCommand::ShowBoard,
        ("stats", []) => TuiCommand::ShowStats,
        ("help" | "h" | "?", []) => TuiCommand::Help,
        ("quit" | "q", []) => TuiCommand::Quit,
        _ => return Err(format!("unknown command '{}' (type 'help')", line.trim())),
    };
    Ok(command)
}
