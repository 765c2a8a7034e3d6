//! `HexBoard`: the façade combining the stone board, ICE, and VC engines
//! behind the `ComputeAll`/`PlayMove`/`UndoMove` operations everything
//! above it (oracle, MCTS, HTP) actually calls.
//!
//! Grounded on the teacher's `GtpEngine` (owns a `Position`, mediates
//! play/undo/clear, rebuilds derived display state on every move) with
//! its derived state widened from "nothing" to ICE + VC, and on
//! `position.rs`'s history handling generalized from implicit undo (Go
//! recomputes liberties/eyes fresh after every move) to an explicit
//! history-frame stack, since ICE fill-in and VCs are too expensive to
//! recompute from scratch on every undo.
//!
//! Resolves spec 4.1's Open Question (fillin/non-fillin board duality) by
//! always recomputing on the single board `HexBoard` owns — the simpler
//! of the two options the spec explicitly invites picking.

use std::sync::Arc;

use crate::board::Board;
use crate::cell::{Cell, Color};
use crate::bitset::CellSet;
use crate::decomposition::handle_decomposition;
use crate::ice::{self, FillinMode, InferiorCells};
use crate::patterns::PatternLibrary;
use crate::vc::{self, VcEngine};

struct HistoryFrame {
    board: Board,
    ice: InferiorCells,
}

pub struct HexBoard {
    pub board: Board,
    pub ice: InferiorCells,
    pub vc: VcEngine,
    patterns: Arc<PatternLibrary>,
    history: Vec<HistoryFrame>,
}

impl HexBoard {
    pub fn new(width: usize, height: usize, patterns: Arc<PatternLibrary>) -> HexBoard {
        let mut b = HexBoard {
            board: Board::new(width, height),
            ice: InferiorCells::default(),
            vc: VcEngine::default(),
            patterns,
            history: Vec::new(),
        };
        b.compute_all(Color::Black);
        b
    }

    pub fn clone_for_thread(&self) -> HexBoard {
        HexBoard {
            board: self.board.clone(),
            ice: self.ice.clone(),
            vc: self.vc.clone(),
            patterns: Arc::clone(&self.patterns),
            history: Vec::new(),
        }
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    /// `absorb -> clear InferiorCells -> ComputeInferiorCells -> BuildVCs
    /// -> HandleDecomposition`, per spec 4.5.
    pub fn compute_all(&mut self, side_to_move: Color) {
        self.board.absorb();
        self.ice.clear();
        ice::compute_fillin(&mut self.board, &mut self.ice, &self.patterns, None, FillinMode::Normal, side_to_move);
        let added = vc::full_rebuild_added(&self.board);
        self.vc.build(&self.board, Color::Black, &added);
        self.vc.build(&self.board, Color::White, &added);
        handle_decomposition(&mut self.board, &mut self.ice, &mut self.vc);
    }

    /// Push a history frame, place the stone, recompute fill-in (without
    /// discarding a forced win the fill-in would otherwise hide), then
    /// incrementally rebuild VCs over exactly the cells the move and its
    /// fill-in changed, and handle decomposition.
    pub fn play_move(&mut self, color: Color, cell: Cell) {
        self.history.push(HistoryFrame { board: self.board.clone(), ice: self.ice.clone() });
        self.ice.push_history();
        self.vc.push_marker();

        let before: Vec<Color> = self.board.geom.all_interior().map(|c| self.board.color(c)).collect();
        self.board.play(color, cell);
        ice::compute_fillin(&mut self.board, &mut self.ice, &self.patterns, Some(cell), FillinMode::DoNotRemoveWinningFillin, color.other());

        let mut added = CellSet::new(self.board.num_cells());
        for (c, prior) in self.board.geom.all_interior().zip(before) {
            if self.board.color(c) != prior {
                added.insert(c);
            }
        }
        self.vc.build(&self.board, Color::Black, &added);
        self.vc.build(&self.board, Color::White, &added);
        handle_decomposition(&mut self.board, &mut self.ice, &mut self.vc);
    }

    /// Pop the history frame, restoring stones and fill-in state, and
    /// revert the VC change log to the matching marker.
    pub fn undo_move(&mut self) {
        if let Some(frame) = self.history.pop() {
            self.board = frame.board;
            self.ice = frame.ice;
        }
        self.ice.pop_history();
        self.vc.revert();
    }

    pub fn history_depth(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternLibrary;

    fn empty_patterns() -> Arc<PatternLibrary> {
        Arc::new(PatternLibrary::parse("").unwrap())
    }

    #[test]
    fn play_then_undo_restores_board_state() {
        let mut hb = HexBoard::new(5, 5, empty_patterns());
        let cell = hb.board.geom.cell(2, 2);
        let before = hb.board.color(cell);
        hb.play_move(Color::Black, cell);
        assert_ne!(hb.board.color(cell), before);
        hb.undo_move();
        assert_eq!(hb.board.color(cell), before);
    }

    #[test]
    fn compute_all_is_idempotent_on_a_fresh_board() {
        let mut hb = HexBoard::new(5, 5, empty_patterns());
        let dead_before = hb.ice.dead.len();
        hb.compute_all(Color::Black);
        assert_eq!(hb.ice.dead.len(), dead_before);
    }
}
