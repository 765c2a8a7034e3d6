//! Property tests (spec 8): invariants checked over many random
//! positions/seeds rather than one hand-picked example.

use std::sync::Arc;

use proptest::prelude::*;

use hexcore::board::Board;
use hexcore::cell::Color;
use hexcore::hexboard::HexBoard;
use hexcore::oracle;
use hexcore::patterns::PatternLibrary;

fn empty_patterns() -> Arc<PatternLibrary> {
    Arc::new(PatternLibrary::parse("").unwrap())
}

/// Play `moves` alternating-color moves (skipping cells already taken)
/// on a fresh board, returning whatever legal prefix was applied.
fn random_position(width: usize, height: usize, moves: &[usize]) -> HexBoard {
    let mut hb = HexBoard::new(width, height, empty_patterns());
    let mut color = Color::Black;
    for &raw in moves {
        let empty: Vec<_> = hb.board.empty().iter().collect();
        if empty.is_empty() {
            break;
        }
        let cell = empty[raw % empty.len()];
        hb.play_move(color, cell);
        color = color.other();
    }
    hb
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn moves_to_consider_is_a_subset_of_empty(moves in prop::collection::vec(0usize..200, 0..15)) {
        let hb = random_position(7, 7, &moves);
        for &color in &[Color::Black, Color::White] {
            let consider = oracle::moves_to_consider(&hb, color);
            prop_assert!(consider.is_subset(&hb.board.empty()));
        }
    }

    #[test]
    fn playouts_are_deterministic_under_a_fixed_seed(moves in prop::collection::vec(0usize..200, 0..10), seed in any::<u64>()) {
        let hb = random_position(7, 7, &moves);

        let mut board_a = hb.board.clone();
        let rng_a = fastrand::Rng::with_seed(seed);
        let won_a = hexcore::mcts::policy::run_playout(&mut board_a, hb.patterns(), Color::Black, rng_a);

        let mut board_b = hb.board.clone();
        let rng_b = fastrand::Rng::with_seed(seed);
        let won_b = hexcore::mcts::policy::run_playout(&mut board_b, hb.patterns(), Color::Black, rng_b);

        prop_assert_eq!(won_a, won_b);
        prop_assert_eq!(board_a.colors(), board_b.colors());
    }

    #[test]
    fn captain_relation_matches_color_connectivity(moves in prop::collection::vec(0usize..200, 0..15)) {
        let hb = random_position(7, 7, &moves);
        let board = &hb.board;
        for cell in board.geom.all_interior() {
            if board.color(cell) == Color::Empty || board.color(cell) == Color::Dead {
                continue;
            }
            let captain = board.captain(cell);
            prop_assert_eq!(board.color(captain), board.color(cell));
            prop_assert!(board.group_board().members(captain).contains(&cell));
        }
    }

    #[test]
    fn a_full_vc_between_a_colors_edges_implies_it_has_won(moves in prop::collection::vec(0usize..200, 0..20)) {
        let hb = random_position(6, 6, &moves);
        for &color in &[Color::Black, Color::White] {
            if hb.vc.has_won(color) {
                prop_assert!(oracle::is_won_game(&hb, color));
            }
        }
    }
}

#[test]
fn play_then_undo_restores_colors_bit_for_bit() {
    let mut hb = HexBoard::new(6, 6, empty_patterns());
    let before: Vec<Color> = hb.board.colors().to_vec();
    let cell = hb.board.geom.cell(3, 3);
    hb.play_move(Color::Black, cell);
    hb.undo_move();
    assert_eq!(hb.board.colors(), before.as_slice());
}

#[test]
fn board_new_has_disjoint_black_and_white() {
    let board = Board::new(9, 9);
    for cell in board.geom.all_interior() {
        assert!(!(board.color(cell) == Color::Black && board.color(cell) == Color::White));
    }
    assert!(board.played().is_empty());
}
