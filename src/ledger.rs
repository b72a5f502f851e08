//! Append-only move ledger with a read-only replay cursor
//!
//! The ledger is the authoritative record of every ply in a session. It
//! only grows at the end, shrinks from the end (undo), or clears (reset).
//! The side of each entry is derived from its index when it is recorded,
//! so `ledger[i].side` always alternates starting with Black and
//! `ledger[i].ply == i` holds by construction.

use crate::core::{Position, Side};
use serde::Serialize;
use smallvec::SmallVec;

/// One recorded ply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    pub position: Position,
    pub side: Side,
    /// Dense, zero-based index of this move in the ledger
    pub ply: usize,
}

impl Move {
    pub fn row(&self) -> usize {
        self.position.row()
    }

    pub fn col(&self) -> usize {
        self.position.col()
    }
}

/// Ordered record of applied moves (insertion order = play order)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MoveLedger {
    moves: Vec<Move>,
}

impl MoveLedger {
    pub fn new() -> Self {
        MoveLedger { moves: Vec::new() }
    }

    /// Side that owns the next ply
    pub fn expected_side(&self) -> Side {
        Side::for_ply(self.moves.len())
    }

    /// Append a move for the side whose turn it is
    pub fn record(&mut self, position: Position) -> Move {
        let mv = Move {
            position,
            side: self.expected_side(),
            ply: self.moves.len(),
        };
        self.moves.push(mv);
        mv
    }

    /// Remove the `count` most recent moves, newest first
    ///
    /// Returns `None` (and removes nothing) if fewer than `count` moves exist.
    pub fn truncate_last(&mut self, count: usize) -> Option<SmallVec<[Move; 2]>> {
        if count > self.moves.len() {
            return None;
        }
        let keep = self.moves.len() - count;
        let removed = self.moves.drain(keep..).rev().collect();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn last(&self) -> Option<&Move> {
        self.moves.last()
    }

    pub fn get(&self, ply: usize) -> Option<&Move> {
        self.moves.get(ply)
    }

    /// Get all moves in play order
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Check the ply-index and alternation invariants
    pub fn is_consistent(&self) -> bool {
        self.moves
            .iter()
            .enumerate()
            .all(|(i, mv)| mv.ply == i && mv.side == Side::for_ply(i))
    }
}

/// Read-only pointer into the ledger used during replay
///
/// Ranges over `-1..=len-1`; `-1` is the empty board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplayCursor(isize);

impl ReplayCursor {
    /// Cursor before the first move (empty board)
    pub const START: ReplayCursor = ReplayCursor(-1);

    /// Cursor on the most recent move of a ledger of `len` moves
    pub fn at_end(len: usize) -> Self {
        ReplayCursor(len as isize - 1)
    }

    /// Cursor at an explicit position, validated against `len`
    pub fn seek(target: isize, len: usize) -> Option<Self> {
        if (-1..len as isize).contains(&target) {
            Some(ReplayCursor(target))
        } else {
            None
        }
    }

    pub fn value(self) -> isize {
        self.0
    }

    /// Ledger index under the cursor (`None` at the start)
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    /// Number of moves shown on the board at this cursor
    pub fn shown(self) -> usize {
        (self.0 + 1) as usize
    }

    /// One step forward, clamped to the last move
    pub fn forward(self, len: usize) -> Self {
        ReplayCursor((self.0 + 1).min(len as isize - 1))
    }

    /// One step back, clamped to the empty board
    pub fn back(self) -> Self {
        ReplayCursor((self.0 - 1).max(-1))
    }
}
