//! Interface boundary for an external full-width search (spec 4.8/4.10):
//! an alpha-beta engine over the circuit-resistance evaluator is out of
//! scope (`spec.md` frames it as "brief, since its structure is shared"
//! and explicitly excludes the evaluator's internals), but this module
//! still exposes the seams such a search would consume — ordered
//! candidate moves, terminal-state queries, and a transposition-table
//! trait keyed by a position hash — without implementing the search
//! loop itself.

use crate::cell::{Cell, Color};
use crate::hexboard::HexBoard;
use crate::oracle;

/// What a full-width search needs from a position: candidate moves
/// ordered the same way the oracle restricts them for MCTS, and a
/// terminal-state query. An external search loop is the consumer; this
/// crate only defines the seam it plugs into.
pub trait SearchBoard {
    /// Moves worth searching from `color`'s point of view, already
    /// pruned by `oracle::moves_to_consider`.
    fn candidate_moves(&self, color: Color) -> Vec<Cell>;

    /// `Some(true)` if `color` has already won, `Some(false)` if `color`
    /// has already lost, `None` if the position is undetermined.
    fn is_terminal_for(&self, color: Color) -> Option<bool>;

    /// A hash of the position suitable for keying a transposition table.
    /// Collisions are acceptable (the table is a cache, not a proof);
    /// no ordering guarantee beyond "equal boards hash equal".
    fn position_key(&self) -> u64;
}

impl SearchBoard for HexBoard {
    fn candidate_moves(&self, color: Color) -> Vec<Cell> {
        oracle::moves_to_consider(self, color).iter().collect()
    }

    fn is_terminal_for(&self, color: Color) -> Option<bool> {
        if oracle::is_won_game(self, color) {
            Some(true)
        } else if oracle::is_lost_game(self, color) {
            Some(false)
        } else {
            None
        }
    }

    fn position_key(&self) -> u64 {
        // FNV-1a over the color array. Cheap and deterministic; a real
        // alpha-beta engine would likely swap this for incremental
        // Zobrist hashing, which needs per-move update hooks this crate
        // doesn't provide.
        let mut hash: u64 = 0xcbf29ce484222325;
        for &color in self.board.colors() {
            hash ^= color as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        hash
    }
}

/// One transposition-table record: a search depth, the value found at
/// that depth, and the move that achieved it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TranspositionEntry {
    pub depth: u32,
    pub value: f64,
    pub best_move: Option<Cell>,
}

/// A transposition table keyed by [`SearchBoard::position_key`]. This
/// crate ships no concrete implementation — a real alpha-beta search
/// supplies its own (bucketed by size, with a replacement policy).
pub trait TranspositionTable {
    fn probe(&self, key: u64) -> Option<TranspositionEntry>;
    fn store(&mut self, key: u64, entry: TranspositionEntry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternLibrary;
    use std::sync::Arc;

    #[test]
    fn position_key_is_stable_for_an_unchanged_board() {
        let patterns = Arc::new(PatternLibrary::parse("").unwrap());
        let hb = HexBoard::new(5, 5, patterns);
        assert_eq!(hb.position_key(), hb.position_key());
    }

    #[test]
    fn position_key_changes_after_a_move() {
        let patterns = Arc::new(PatternLibrary::parse("").unwrap());
        let mut hb = HexBoard::new(5, 5, patterns);
        let before = hb.position_key();
        let cell = hb.board.geom.cell(2, 2);
        hb.play_move(Color::Black, cell);
        assert_ne!(hb.position_key(), before);
    }

    #[test]
    fn candidate_moves_matches_the_oracle_consider_set() {
        let patterns = Arc::new(PatternLibrary::parse("").unwrap());
        let hb = HexBoard::new(5, 5, patterns);
        let via_trait: std::collections::HashSet<Cell> = hb.candidate_moves(Color::Black).into_iter().collect();
        let via_oracle: std::collections::HashSet<Cell> = oracle::moves_to_consider(&hb, Color::Black).iter().collect();
        assert_eq!(via_trait, via_oracle);
    }

    #[test]
    fn terminal_query_is_none_on_an_empty_board() {
        let patterns = Arc::new(PatternLibrary::parse("").unwrap());
        let hb = HexBoard::new(5, 5, patterns);
        assert_eq!(hb.is_terminal_for(Color::Black), None);
    }
}
