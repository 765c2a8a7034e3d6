//! MCTS core (MoHex): a UCT tree with RAVE, shared by a pool of worker
//! threads, seeded by a one-ply pre-search at the root.
//!
//! The single-threaded tree mechanics here (`TreeNode`, urgency scoring,
//! descent, backup, the fastplay early-stop) are grounded almost
//! line-for-line on the teacher's `mcts.rs` (`TreeNode`, `rave_urgency`,
//! `most_urgent`, `tree_descend`, `tree_update`, `tree_search`), moved
//! from the teacher's single-threaded `&mut` tree to one built for
//! concurrent access: children are populated exactly once via
//! `OnceLock`, and per-node counters are plain atomics rather than
//! `u32` fields, since several threads update the same node
//! concurrently during search (spec 4.7's "wait-free in practice").

pub mod policy;
pub mod pool;
pub mod presearch;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use crate::cell::{Cell, Color};
use crate::config::Config;
use crate::constants::{EXPAND_VISITS, RAVE_EQUIV};
use crate::hexboard::HexBoard;
use crate::oracle;
use crate::patterns::PatternLibrary;

/// One node of the shared UCT tree: the move that reaches this node from
/// its parent, visit/win counters, RAVE (AMAF) counters, and a
/// lazily-populated, never-replaced child list.
pub struct TreeNode {
    pub cell: Cell,
    visits: AtomicU32,
    wins: AtomicU32,
    rave_visits: AtomicU32,
    rave_wins: AtomicU32,
    children: OnceLock<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn new(cell: Cell) -> TreeNode {
        TreeNode::with_prior(cell, 0, 0)
    }

    /// A node seeded with `prior_visits` virtual visits of which
    /// `prior_wins` are wins, so that unvisited moves backed by a
    /// pattern hit or mustplay membership aren't immediately starved by
    /// UCB in favor of moves nobody has evaluated yet.
    pub fn with_prior(cell: Cell, prior_visits: u32, prior_wins: u32) -> TreeNode {
        TreeNode {
            cell,
            visits: AtomicU32::new(prior_visits),
            wins: AtomicU32::new(prior_wins),
            rave_visits: AtomicU32::new(0),
            rave_wins: AtomicU32::new(0),
            children: OnceLock::new(),
        }
    }

    #[inline]
    pub fn visits(&self) -> u32 {
        self.visits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn wins(&self) -> u32 {
        self.wins.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let v = self.visits();
        if v == 0 {
            0.5
        } else {
            self.wins() as f64 / v as f64
        }
    }

    fn rave_mean(&self) -> f64 {
        let v = self.rave_visits.load(Ordering::Relaxed);
        if v == 0 {
            0.5
        } else {
            self.rave_wins.load(Ordering::Relaxed) as f64 / v as f64
        }
    }

    /// UCB1 value blended with the RAVE (AMAF) estimate; the blend
    /// weight shifts from mostly-RAVE to mostly-UCB as real visits
    /// accumulate, per `RAVE_EQUIV`.
    pub fn urgency(&self) -> f64 {
        let visits = self.visits() as f64;
        let rave_visits = self.rave_visits.load(Ordering::Relaxed) as f64;
        if visits == 0.0 && rave_visits == 0.0 {
            return 0.5;
        }
        let beta = rave_visits / (visits + rave_visits + 4.0 * visits * rave_visits / RAVE_EQUIV);
        (1.0 - beta) * self.mean() + beta * self.rave_mean()
    }

    pub fn record(&self, win: bool) {
        self.visits.fetch_add(1, Ordering::Relaxed);
        if win {
            self.wins.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rave(&self, win: bool) {
        self.rave_visits.fetch_add(1, Ordering::Relaxed);
        if win {
            self.rave_wins.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.children.get().is_some()
    }

    pub fn children(&self) -> &[TreeNode] {
        self.children.get().map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Populate the child list the first time any thread calls this with
    /// `visits() >= EXPAND_VISITS`; later callers (including concurrent
    /// ones) get the already-built list. `build` is only ever invoked by
    /// whichever thread wins the race.
    pub fn expand_if_ready(&self, build: impl FnOnce() -> Vec<TreeNode>) -> bool {
        if self.visits() < EXPAND_VISITS || self.is_expanded() {
            return false;
        }
        self.children.get_or_init(build);
        true
    }

    /// Force expansion regardless of visit count (used at the root,
    /// which is seeded directly from the pre-search's consider set).
    pub fn force_expand(&self, build: impl FnOnce() -> Vec<TreeNode>) {
        self.children.get_or_init(build);
    }

    /// The child with the highest urgency, ties broken by a caller-seeded
    /// shuffle so that repeated equal-urgency ties don't always resolve
    /// to the same move (the teacher does the same with
    /// `fastrand::shuffle` in `most_urgent`).
    pub fn most_urgent<'a>(&'a self, rng: &fastrand::Rng) -> Option<&'a TreeNode> {
        let children = self.children();
        if children.is_empty() {
            return None;
        }
        let mut order: Vec<usize> = (0..children.len()).collect();
        rng.shuffle(&mut order);
        order
            .into_iter()
            .map(|i| &children[i])
            .max_by(|a, b| a.urgency().partial_cmp(&b.urgency()).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// The child with the most visits (the default external move-choice
    /// rule; spec 4.7 also allows choosing by value).
    pub fn best_by_visits(&self) -> Option<&TreeNode> {
        self.children().iter().max_by_key(|c| c.visits())
    }

    pub fn best_by_value(&self) -> Option<&TreeNode> {
        self.children().iter().max_by(|a, b| a.mean().partial_cmp(&b.mean()).unwrap_or(std::cmp::Ordering::Equal))
    }
}

/// Generate a move for `side_to_move` on `hexboard`: resign-or-play check
/// first (spec 4.6's oracle + spec 4.7's pre-search), then the one-ply
/// pre-search, then (unless it already found an immediate win or the
/// game is already lost) the full tree search.
///
/// Mirrors the "chain of player filters, MCTS as final fallback" shape
/// spec 9 describes for dynamic-dispatch player classes: each step below
/// either returns a concrete move or falls through to the next.
pub fn genmove(hexboard: &HexBoard, patterns: &PatternLibrary, config: &Config, side_to_move: Color) -> Cell {
    if oracle::is_lost_game(hexboard, side_to_move) {
        if !config.no_resign {
            return crate::cell::RESIGN;
        }
        // Resignation disabled: resist as long as possible by contesting
        // the opponent's winning carrier (spec 4.6's
        // `MovesToConsiderInLosingState`). Picking the lowest-index cell
        // of that (already minimal) carrier is a deterministic tie-break;
        // true "nummoves"-maximizing choice is implementation-defined
        // per spec 9's third Open Question.
        let carrier = oracle::moves_to_consider_in_losing_state(hexboard, side_to_move);
        if let Some(cell) = carrier.iter().min() {
            return cell;
        }
    }

    let initial = presearch::run(hexboard, patterns, config, side_to_move);
    if let Some(win) = initial.immediate_win {
        return win;
    }
    if initial.consider.is_empty() {
        log::warn!("genmove: empty consider set, falling back to a random empty cell");
        let empty: Vec<Cell> = hexboard.board.empty().iter().collect();
        if empty.is_empty() {
            return crate::cell::RESIGN;
        }
        let rng = fastrand::Rng::new();
        return empty[rng.usize(0..empty.len())];
    }

    let deadline = pool::deadline_from_config(config);
    let outcome = pool::search(hexboard, patterns, config, side_to_move, &initial, deadline);

    // A proven loss is handled above via the oracle; this is the softer
    // case spec 7 describes for resignation: the tree search itself
    // never found a line better than a near-certain loss.
    if !config.no_resign && outcome.best_winrate < config.resign_threshold {
        return crate::cell::RESIGN;
    }
    outcome.mv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn fresh_node_has_neutral_urgency() {
        let n = TreeNode::new(Cell::from_index(10));
        assert_eq!(n.urgency(), 0.5);
    }

    #[test]
    fn recording_wins_raises_mean() {
        let n = TreeNode::new(Cell::from_index(10));
        for _ in 0..10 {
            n.record(true);
        }
        assert!(n.mean() > 0.9);
    }

    #[test]
    fn expand_if_ready_only_builds_once() {
        let n = TreeNode::new(Cell::from_index(10));
        for _ in 0..EXPAND_VISITS {
            n.record(true);
        }
        let mut calls = 0;
        n.expand_if_ready(|| {
            calls += 1;
            vec![TreeNode::new(Cell::from_index(11))]
        });
        n.expand_if_ready(|| {
            calls += 1;
            vec![TreeNode::new(Cell::from_index(12))]
        });
        assert_eq!(calls, 1);
        assert_eq!(n.children().len(), 1);
    }
}
