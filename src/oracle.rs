//! Player-utility oracle: stateless queries over a `HexBoard`'s VC/ICE
//! state answering "who has won" and "what moves are worth considering".
//!
//! No teacher analogue (Go's move generation has nothing resembling a
//! mustplay/dominated-cell consider set); grounded in
//! `original_source/src/player` (`MoHexPlayer`, `PerfectPlayer`). Shape
//! (a handful of free functions over borrowed state, no owned struct)
//! follows the teacher's `position.rs` free-function style rather than
//! an object with methods.

use crate::bitset::CellSet;
use crate::cell::{Cell, Color};
use crate::hexboard::HexBoard;

/// True iff either color has already won (by virtual or solid connection).
pub fn is_determined_state(b: &HexBoard) -> bool {
    is_won(b, Color::Black) || is_won(b, Color::White)
}

/// True iff `c` has won.
pub fn is_won_game(b: &HexBoard, c: Color) -> bool {
    is_won(b, c)
}

/// True iff `c`'s opponent has won.
pub fn is_lost_game(b: &HexBoard, c: Color) -> bool {
    is_won(b, c.other())
}

fn is_won(b: &HexBoard, c: Color) -> bool {
    b.board.has_solid_connection(c) || b.vc.has_won(c)
}

/// The set of moves worth searching for `c` to play next: every empty
/// cell, minus dominated cells (keeping one dominator per equivalence
/// class), minus vulnerable cells whose killer is itself still in the
/// consider set, restricted to the mustplay set if the opponent has
/// unanswered Semi threats.
pub fn moves_to_consider(b: &HexBoard, c: Color) -> CellSet {
    let mut consider = b.board.empty();

    for (&cell, dominators) in b.ice.dominated.iter() {
        if !consider.contains(cell) {
            continue;
        }
        // A cell dominated by another still-empty cell is redundant: the
        // dominator is always at least as good, so drop the dominated
        // cell and keep exactly one representative (the dominator).
        if dominators.iter().any(|&d| b.board.color(d) == Color::Empty) {
            consider.remove(cell);
        }
    }

    for v in &b.ice.vulnerable {
        if consider.contains(v.cell) && consider.contains(v.killer) {
            consider.remove(v.cell);
        }
    }

    let mustplay = b.vc.mustplay(c);
    if !mustplay.is_empty() {
        consider.intersect_with(&mustplay);
    }

    consider
}

/// In a state already lost for `c`, return a minimal carrier of the
/// opponent's winning Full VC: the longest the search can resist is to
/// contest every cell the opponent still needs.
pub fn moves_to_consider_in_losing_state(b: &HexBoard, c: Color) -> CellSet {
    let opp = c.other();
    let (e1, e2) = opp.edges();
    let mut best: Option<CellSet> = None;
    for carrier in b.vc.table(opp).full_vcs(e1, e2) {
        if best.as_ref().is_none_or(|cur| carrier.len() < cur.len()) {
            best = Some(carrier.clone());
        }
    }
    best.unwrap_or_else(|| CellSet::new(b.board.num_cells()))
}

/// Helper used by `moves_to_consider`: the set of cells with at least one
/// still-empty dominator.
pub fn redundant_cells(b: &HexBoard) -> Vec<Cell> {
    b.ice
        .dominated
        .iter()
        .filter(|(_, doms)| doms.iter().any(|&d| b.board.color(d) == Color::Empty))
        .map(|(&cell, _)| cell)
        .collect()
}
