//! Default playout policy: pattern-weighted move choice with a uniform
//! fallback, plus a pre-shuffled empty-cell vector for O(1) amortized
//! random selection.
//!
//! Grounded on the teacher's `playout.rs` (`mcplayout`'s heuristic move
//! ordering and its pre-shuffled move list), with the heuristics
//! themselves replaced: Go's capture/self-atari checks have no Hex
//! analogue, so this policy instead asks `patterns.rs` for `Playout`-role
//! hits around the opponent's last move, weighted by the pattern's
//! declared weight.

use crate::board::Board;
use crate::cell::{Cell, Color};
use crate::patterns::{MatchMode, PatternLibrary, Role};

/// Per-thread playout state: a shuffled vector of empty cells, walked
/// with a moving cursor so repeated draws don't re-scan the board.
pub struct DefaultPolicy<'a> {
    patterns: &'a PatternLibrary,
    rng: fastrand::Rng,
    shuffled: Vec<Cell>,
    cursor: usize,
}

impl<'a> DefaultPolicy<'a> {
    pub fn new(patterns: &'a PatternLibrary, board: &Board, rng: fastrand::Rng) -> DefaultPolicy<'a> {
        let mut shuffled: Vec<Cell> = board.empty().iter().collect();
        rng.shuffle(&mut shuffled);
        DefaultPolicy { patterns, rng, shuffled, cursor: 0 }
    }

    /// Choose the next playout move given the opponent's last move (or
    /// `None` at the very first step).
    pub fn choose(&mut self, board: &Board, color: Color, opponent_last: Option<Cell>) -> Option<Cell> {
        if let Some(last) = opponent_last {
            if let Some(mv) = self.pattern_move(board, color, last) {
                return Some(mv);
            }
        }
        self.random_empty(board)
    }

    fn pattern_move(&mut self, board: &Board, color: Color, last: Cell) -> Option<Cell> {
        let candidates: Vec<Cell> = board
            .neighbors(last)
            .into_iter()
            .flatten()
            .filter(|&c| c.is_interior() && board.color(c) == Color::Empty)
            .collect();

        let mut weighted = Vec::new();
        let mut total = 0u32;
        for cell in candidates {
            let hits = self.patterns.match_on_cell(Role::Playout, board, cell, color, MatchMode::MatchAll);
            let weight: u32 = hits.iter().map(|p| p.weight).sum();
            if weight > 0 {
                total += weight;
                weighted.push((cell, total));
            }
        }
        if total == 0 {
            return None;
        }
        let draw = self.rng.u32(0..total);
        weighted.into_iter().find(|&(_, cum)| draw < cum).map(|(cell, _)| cell)
    }

    /// Draw a uniformly random empty cell from the pre-shuffled vector,
    /// skipping entries that have since been filled (by this or an
    /// earlier step).
    fn random_empty(&mut self, board: &Board) -> Option<Cell> {
        while self.cursor < self.shuffled.len() {
            let cell = self.shuffled[self.cursor];
            self.cursor += 1;
            if board.color(cell) == Color::Empty {
                return Some(cell);
            }
        }
        None
    }
}

/// Run a full playout to a terminal (board full) from `board`'s current
/// state, updating ring godels at `playoutUpdateRadius` as it goes, and
/// return `true` iff Black wins (spec 4.7's terminal rule: a solid N-S
/// path for Black).
pub fn run_playout(board: &mut Board, patterns: &PatternLibrary, to_move: Color, rng: fastrand::Rng) -> bool {
    let mut policy = DefaultPolicy::new(patterns, board, rng);
    let mut color = to_move;
    let mut last_move = None;

    board.enter_playout_phase();
    loop {
        let Some(cell) = policy.choose(board, color, last_move) else {
            break;
        };
        board.play(color, cell);
        last_move = Some(cell);
        color = color.other();
    }
    board.exit_playout_phase();

    board.has_solid_connection(Color::Black)
}

/// Like [`run_playout`], but also returns the `(color, cell)` log of
/// every move played during the rollout, used by the tree phase to
/// update RAVE statistics for moves played later in the same simulation
/// (spec 4.7's RAVE statistics).
pub fn run_playout_logged(board: &mut Board, patterns: &PatternLibrary, to_move: Color, rng: fastrand::Rng) -> (bool, Vec<(Color, Cell)>) {
    let mut policy = DefaultPolicy::new(patterns, board, rng);
    let mut color = to_move;
    let mut last_move = None;
    let mut log = Vec::new();

    board.enter_playout_phase();
    loop {
        let Some(cell) = policy.choose(board, color, last_move) else {
            break;
        };
        board.play(color, cell);
        log.push((color, cell));
        last_move = Some(cell);
        color = color.other();
    }
    board.exit_playout_phase();

    (board.has_solid_connection(Color::Black), log)
}
