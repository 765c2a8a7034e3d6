//! One-ply pre-search: scans every root candidate move in parallel,
//! looking for an immediate win and, failing that, building the shared
//! `InitialData` the tree phase seeds its root/grandchild expansions
//! from (spec 4.7/4.9).
//!
//! Grounded in `mcts.rs`'s `expand` (building a node's children from a
//! consider set) generalized to run once, up front, across a worker
//! pool instead of lazily inside tree descent. The round-robin
//! candidate partitioning and shared "found-a-win" flag are grounded in
//! `other_examples/manifests/nurdwerks-laughing-pancake`'s
//! `crossbeam_utils::thread::scope` worker-pool pattern.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::unbounded;

use crate::bitset::CellSet;
use crate::cell::{Cell, Color};
use crate::config::Config;
use crate::hexboard::HexBoard;
use crate::oracle;
use crate::patterns::PatternLibrary;

/// Per-root-child data computed by the pre-search, consulted by the tree
/// phase instead of re-running `ComputeAll` at the first two plies.
#[derive(Clone)]
pub struct ChildData {
    /// Cells that changed color as a side effect of ICE fill-in after
    /// playing this move (i.e. beyond the move itself), as `(color,
    /// cell)` pairs, applied with a cheap `add_color` rather than a full
    /// recompute.
    pub fillin: Vec<(Color, Cell)>,
    /// The opponent's `MovesToConsider` set in the position after this
    /// move, used to restrict the grandchild's expansion.
    pub ply2_consider: CellSet,
}

/// The outcome of scanning every root candidate, shared by the tree
/// workers for the remainder of the search.
pub struct InitialData {
    /// A move that wins outright; if set, the tree search is skipped
    /// entirely (spec 4.7, "report it without searching").
    pub immediate_win: Option<Cell>,
    /// Root moves proven losing (every reply for the opponent keeps
    /// them won); subtracted from `consider` unless doing so would
    /// empty it.
    pub losing: CellSet,
    /// The root's ply-1 consider set, after the losing-move subtraction.
    pub consider: CellSet,
    pub children: HashMap<Cell, ChildData>,
}

/// Run the pre-search: partition `root`'s candidate moves round-robin
/// across `config.presearch_threads` workers, each holding its own
/// `HexBoard` clone, and union their findings.
pub fn run(root: &HexBoard, patterns: &PatternLibrary, config: &Config, side_to_move: Color) -> InitialData {
    let candidates: Vec<Cell> = oracle::moves_to_consider(root, side_to_move).iter().collect();

    if candidates.is_empty() {
        return InitialData {
            immediate_win: None,
            losing: CellSet::new(root.board.num_cells()),
            consider: CellSet::new(root.board.num_cells()),
            children: HashMap::new(),
        };
    }

    let found_win = AtomicBool::new(false);
    let (work_tx, work_rx) = unbounded::<Cell>();
    let (result_tx, result_rx) = unbounded::<(Cell, Outcome)>();
    for &c in &candidates {
        work_tx.send(c).expect("presearch work channel");
    }
    drop(work_tx);

    let num_workers = config.presearch_threads.max(1);
    crossbeam_utils::thread::scope(|scope| {
        for _ in 0..num_workers {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let found_win = &found_win;
            scope.spawn(move |_| {
                while let Ok(m) = work_rx.recv() {
                    if found_win.load(Ordering::Relaxed) {
                        break;
                    }
                    let outcome = evaluate_candidate(root, patterns, side_to_move, m);
                    let is_win = matches!(outcome, Outcome::Win);
                    let _ = result_tx.send((m, outcome));
                    if is_win {
                        found_win.store(true, Ordering::Relaxed);
                        break;
                    }
                }
            });
        }
    })
    .expect("presearch worker pool");
    drop(result_tx);

    let mut immediate_win = None;
    let mut losing = CellSet::new(root.board.num_cells());
    let mut consider = CellSet::new(root.board.num_cells());
    let mut children = HashMap::new();

    for (m, outcome) in result_rx.iter() {
        match outcome {
            Outcome::Win => {
                if immediate_win.is_none() {
                    immediate_win = Some(m);
                }
            }
            Outcome::Loss => {
                losing.insert(m);
            }
            Outcome::Undecided(data) => {
                consider.insert(m);
                children.insert(m, data);
            }
        }
    }

    if let Some(win) = immediate_win {
        return InitialData { immediate_win: Some(win), losing, consider: CellSet::new(root.board.num_cells()), children: HashMap::new() };
    }

    // Subtract proven-losing moves from the consider set, unless every
    // candidate is losing (then there is nothing to subtract: keep
    // playing, we must choose among losing moves).
    let mut final_consider = consider.clone();
    final_consider.subtract(&losing);
    if final_consider.is_empty() {
        final_consider = consider;
    }

    InitialData { immediate_win: None, losing, consider: final_consider, children }
}

enum Outcome {
    Win,
    Loss,
    Undecided(ChildData),
}

fn evaluate_candidate(root: &HexBoard, _patterns: &PatternLibrary, side_to_move: Color, m: Cell) -> Outcome {
    let mut clone = root.clone_for_thread();
    let before: Vec<(Cell, crate::cell::Color)> = clone.board.geom.all_interior().map(|c| (c, clone.board.color(c))).collect();

    clone.play_move(side_to_move, m);

    let opponent = side_to_move.other();
    if oracle::is_lost_game(&clone, opponent) {
        return Outcome::Win;
    }
    if oracle::is_won_game(&clone, opponent) {
        return Outcome::Loss;
    }

    let fillin: Vec<(Color, Cell)> = before
        .into_iter()
        .filter_map(|(c, before_color)| {
            let after_color = clone.board.color(c);
            if after_color != before_color && c != m { Some((after_color, c)) } else { None }
        })
        .collect();

    let ply2_consider = oracle::moves_to_consider(&clone, opponent);
    Outcome::Undecided(ChildData { fillin, ply2_consider })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternLibrary;
    use std::sync::Arc;

    fn empty_patterns() -> Arc<PatternLibrary> {
        Arc::new(PatternLibrary::parse("").unwrap())
    }

    #[test]
    fn one_by_one_board_finds_the_only_move_a_win() {
        let root = HexBoard::new(1, 1, empty_patterns());
        let config = Config { presearch_threads: 1, ..Config::default() };
        let data = run(&root, root.patterns(), &config, Color::Black);
        assert!(data.immediate_win.is_some());
    }

    #[test]
    fn consider_set_never_exceeds_empty_cells() {
        let root = HexBoard::new(4, 4, empty_patterns());
        let config = Config { presearch_threads: 2, ..Config::default() };
        let data = run(&root, root.patterns(), &config, Color::Black);
        assert!(data.consider.is_subset(&root.board.empty()));
    }
}
