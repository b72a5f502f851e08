//! In-process rules engine and alpha-beta searcher
//!
//! `NativeEngine` implements the full [`MoveOracle`] contract without any
//! foreign library: it validates moves, detects five-in-a-row and full-board
//! draws, keeps a ply history for undo, and searches for moves with a
//! depth-limited negamax over a window-of-five evaluation.

use crate::core::{Board, Cell, DifficultyLevel, Position, Side, BOARD_SIZE, WIN_LENGTH};
use crate::oracle::{MoveOracle, OracleError, OracleFactory};

/// Line directions: horizontal, vertical, diagonal, anti-diagonal
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Score of an unblocked window holding 0..=5 stones of one colour
const WINDOW_SCORES: [i32; WIN_LENGTH + 1] = [0, 10, 100, 1_000, 10_000, 100_000];

/// Score assigned to a completed line found during search
const WIN_SCORE: i32 = 1_000_000;

/// Maximum number of candidate moves expanded per search node
const MAX_BREADTH: usize = 12;

/// Native engine state
#[derive(Debug, Clone)]
pub struct NativeEngine {
    board: Board,
    history: Vec<(Position, Side)>,
    terminal: bool,
    winner: Option<Side>,
    difficulty: DifficultyLevel,
}

impl NativeEngine {
    pub fn new() -> Self {
        NativeEngine {
            board: Board::empty(),
            history: Vec::new(),
            terminal: false,
            winner: None,
            difficulty: DifficultyLevel::default(),
        }
    }

    /// Side expected to move next, derived from history parity
    pub fn side_to_move(&self) -> Side {
        Side::for_ply(self.history.len())
    }

    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty
    }

    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    /// Search depth for the configured difficulty
    /// Plies searched: 1, 2 or 3 for strengths 1, 3 and 5
    fn search_depth(&self) -> u8 {
        (self.difficulty.strength() + 1) / 2
    }

    /// Length of the run of `side` stones through `pos` along one direction,
    /// counting `pos` itself as if it held a `side` stone
    fn run_through(&self, pos: Position, side: Side, (dr, dc): (isize, isize)) -> usize {
        let stone = Cell::from(side);
        let mut run = 1;
        for sign in [1, -1] {
            let mut cursor = pos;
            while let Some(next) = cursor.offset(dr * sign, dc * sign) {
                if self.board.get(next) != stone {
                    break;
                }
                run += 1;
                cursor = next;
            }
        }
        run
    }

    /// Would a `side` stone at `pos` complete a line?
    pub fn completes_line(&self, pos: Position, side: Side) -> bool {
        DIRECTIONS
            .iter()
            .any(|&dir| self.run_through(pos, side, dir) >= WIN_LENGTH)
    }

    fn has_neighbor(&self, pos: Position) -> bool {
        (-1..=1)
            .flat_map(|dr| (-1..=1).map(move |dc| (dr, dc)))
            .filter(|&(dr, dc)| dr != 0 || dc != 0)
            .filter_map(|(dr, dc)| pos.offset(dr, dc))
            .any(|n| !self.board.get(n).is_empty())
    }

    /// Empty cells adjacent to at least one stone; the centre on an empty board
    pub fn candidates(&self) -> Vec<Position> {
        if self.history.is_empty() {
            return vec![Position::center()];
        }
        let near: Vec<Position> = Position::all()
            .filter(|&pos| self.board.get(pos).is_empty() && self.has_neighbor(pos))
            .collect();
        if near.is_empty() {
            Position::all()
                .filter(|&pos| self.board.get(pos).is_empty())
                .collect()
        } else {
            near
        }
    }

    /// Cheap move-ordering heuristic: attacking and blocking potential of `pos`
    fn local_score(&self, pos: Position, side: Side) -> i32 {
        DIRECTIONS
            .iter()
            .map(|&dir| {
                let mine = self.run_through(pos, side, dir).min(WIN_LENGTH);
                let theirs = self.run_through(pos, side.opponent(), dir).min(WIN_LENGTH);
                WINDOW_SCORES[mine] + WINDOW_SCORES[theirs] * 9 / 10
            })
            .sum()
    }

    fn ordered_candidates(&self, side: Side) -> Vec<Position> {
        let mut scored: Vec<(i32, Position)> = self
            .candidates()
            .into_iter()
            .map(|pos| (self.local_score(pos, side), pos))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.truncate(MAX_BREADTH);
        scored.into_iter().map(|(_, pos)| pos).collect()
    }

    /// Static evaluation from `side`'s point of view
    fn evaluate(&self, side: Side) -> i32 {
        let mine = Cell::from(side);
        let theirs = Cell::from(side.opponent());
        let mut score = 0;
        for start in Position::all() {
            for &(dr, dc) in &DIRECTIONS {
                let span = (WIN_LENGTH - 1) as isize;
                if start.offset(dr * span, dc * span).is_none() {
                    continue;
                }
                let (mut own, mut opp) = (0, 0);
                for step in 0..WIN_LENGTH as isize {
                    if let Some(pos) = start.offset(dr * step, dc * step) {
                        match self.board.get(pos) {
                            c if c == mine => own += 1,
                            c if c == theirs => opp += 1,
                            _ => {}
                        }
                    }
                }
                if own > 0 && opp == 0 {
                    score += WINDOW_SCORES[own];
                } else if opp > 0 && own == 0 {
                    score -= WINDOW_SCORES[opp];
                }
            }
        }
        score
    }

    fn negamax(&mut self, depth: u8, mut alpha: i32, beta: i32, side: Side) -> i32 {
        if depth == 0 {
            return self.evaluate(side);
        }
        let moves = self.ordered_candidates(side);
        if moves.is_empty() {
            return 0;
        }
        let mut best = -WIN_SCORE * 2;
        for pos in moves {
            if self.completes_line(pos, side) {
                return WIN_SCORE + depth as i32;
            }
            self.board.set(pos, Cell::from(side));
            self.history.push((pos, side));
            let score = -self.negamax(depth - 1, -beta, -alpha, side.opponent());
            self.history.pop();
            self.board.set(pos, Cell::Empty);

            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }
        best
    }

    /// Pick a move for the side to move
    pub fn best_move(&mut self) -> Option<Position> {
        if self.terminal {
            return None;
        }
        let side = self.side_to_move();
        let candidates = self.candidates();
        if candidates.is_empty() {
            return None;
        }

        // Take a win, otherwise block one
        if let Some(&pos) = candidates.iter().find(|&&pos| self.completes_line(pos, side)) {
            return Some(pos);
        }
        if let Some(&pos) = candidates
            .iter()
            .find(|&&pos| self.completes_line(pos, side.opponent()))
        {
            return Some(pos);
        }

        let depth = self.search_depth();
        let mut alpha = -WIN_SCORE * 2;
        let beta = WIN_SCORE * 2;
        let mut best: Option<(i32, Position)> = None;
        for pos in self.ordered_candidates(side) {
            self.board.set(pos, Cell::from(side));
            self.history.push((pos, side));
            let score = -self.negamax(depth - 1, -beta, -alpha, side.opponent());
            self.history.pop();
            self.board.set(pos, Cell::Empty);

            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, pos));
            }
            alpha = alpha.max(score);
        }
        best.map(|(_, pos)| pos)
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveOracle for NativeEngine {
    fn reset(&mut self) {
        self.board = Board::empty();
        self.history.clear();
        self.terminal = false;
        self.winner = None;
    }

    fn apply_move(&mut self, pos: Position, side: Side) -> bool {
        if self.terminal || !self.board.get(pos).is_empty() {
            return false;
        }
        self.board.set(pos, Cell::from(side));
        self.history.push((pos, side));

        if self.completes_line(pos, side) {
            self.terminal = true;
            self.winner = Some(side);
        } else if self.history.len() == BOARD_SIZE * BOARD_SIZE {
            self.terminal = true;
        }
        true
    }

    fn query_best_move(&mut self) -> Result<Option<Position>, OracleError> {
        Ok(self.best_move())
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn winner(&self) -> Option<Side> {
        self.winner
    }

    fn set_strength(&mut self, level: DifficultyLevel) {
        self.difficulty = level;
    }

    fn undo_one_ply(&mut self) -> bool {
        match self.history.pop() {
            Some((pos, _)) => {
                self.board.set(pos, Cell::Empty);
                self.terminal = false;
                self.winner = None;
                true
            }
            None => false,
        }
    }

    fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    fn read_cell(&self, pos: Position) -> Cell {
        self.board.get(pos)
    }

    fn name(&self) -> &str {
        "native"
    }
}

/// Hands out fresh [`NativeEngine`] instances
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngineFactory;

impl OracleFactory for NativeEngineFactory {
    fn create(&self) -> Result<Box<dyn MoveOracle>, OracleError> {
        Ok(Box::new(NativeEngine::new()))
    }
}
