//! Black-box scenarios covering the boundary cases engine clients
//! actually hit: tiny boards, resignation, and a worked multi-move
//! position, driven entirely through `HexBoard`/`oracle`/`mcts::genmove`
//! the way `htp.rs` does.

use std::sync::Arc;

use hexcore::cell::{Cell, Color};
use hexcore::config::Config;
use hexcore::hexboard::HexBoard;
use hexcore::oracle;
use hexcore::patterns::PatternLibrary;

fn empty_patterns() -> Arc<PatternLibrary> {
    Arc::new(PatternLibrary::parse("").unwrap())
}

fn config_for(width: usize, height: usize) -> Config {
    Config { width, height: Some(height), sims: 20, mcts_threads: 1, presearch_threads: 1, ..Config::default() }
}

#[test]
fn one_by_one_board_genmove_then_wins() {
    let patterns = empty_patterns();
    let mut hb = HexBoard::new(1, 1, Arc::clone(&patterns));
    let config = config_for(1, 1);

    let mv = hexcore::mcts::genmove(&hb, &patterns, &config, Color::Black);
    let only = hb.board.geom.cell(0, 0);
    assert_eq!(mv, only);

    hb.play_move(Color::Black, mv);
    assert!(oracle::is_won_game(&hb, Color::Black));
    assert!(!oracle::is_won_game(&hb, Color::White));
}

#[test]
fn five_by_five_worked_example_empty_neighbors() {
    let patterns = empty_patterns();
    let mut hb = HexBoard::new(5, 5, patterns);

    let b2 = hb.board.geom.parse_coord("b2").unwrap();
    let a2 = hb.board.geom.parse_coord("a2").unwrap();
    let b3 = hb.board.geom.parse_coord("b3").unwrap();
    hb.play_move(Color::Black, b2);
    hb.play_move(Color::White, a2);
    hb.play_move(Color::Black, b3);

    let captain = hb.board.captain(b2);
    assert_eq!(hb.board.captain(b3), captain);

    let expected: Vec<Cell> =
        ["b1", "c1", "c2", "a3", "c3", "a4", "b4"].iter().map(|s| hb.board.geom.parse_coord(s).unwrap()).collect();
    let neighbors = hb.board.group_board().empty_neighbors(captain, &hb.board.geom, hb.board.colors());
    for cell in &expected {
        assert!(neighbors.contains(*cell), "expected empty neighbor set to contain {cell:?}");
    }
    assert_eq!(neighbors.len(), expected.len());

    let a3 = hb.board.geom.parse_coord("a3").unwrap();
    let a4 = hb.board.geom.parse_coord("a4").unwrap();
    let a3_empty_neighbors: Vec<Cell> =
        hb.board.geom.neighbors(a3).into_iter().flatten().filter(|&n| hb.board.color(n) == Color::Empty).collect();
    assert_eq!(a3_empty_neighbors, vec![a4]);
}

#[test]
fn eleven_by_eleven_empty_board_has_no_full_vc_and_a_nonempty_consider_set() {
    let patterns = empty_patterns();
    let hb = HexBoard::new(11, 11, patterns);

    assert!(!hb.board.has_solid_connection(Color::Black));
    assert!(!hb.board.has_solid_connection(Color::White));
    assert!(!hb.vc.has_won(Color::Black));
    assert!(!hb.vc.has_won(Color::White));

    let consider = oracle::moves_to_consider(&hb, Color::Black);
    assert!(!consider.is_empty());
    assert!(consider.is_subset(&hb.board.empty()));
}

#[test]
fn a_lost_game_resigns_when_configured_to() {
    let patterns = empty_patterns();
    let mut hb = HexBoard::new(5, 3, patterns);

    // Fill White's entire row of interior cells: a solid E-W connection.
    let row_cells: Vec<Cell> = (0..5).map(|col| hb.board.geom.cell(col, 1)).collect();
    for cell in row_cells {
        hb.play_move(Color::White, cell);
    }

    assert!(oracle::is_lost_game(&hb, Color::Black));

    let resigning = Config { no_resign: false, ..Config::default() };
    let mv = hexcore::mcts::genmove(&hb, &Arc::new(PatternLibrary::parse("").unwrap()), &resigning, Color::Black);
    assert_eq!(mv, hexcore::cell::RESIGN);

    let fighting = Config { no_resign: true, ..Config::default() };
    let mv2 = hexcore::mcts::genmove(&hb, &Arc::new(PatternLibrary::parse("").unwrap()), &fighting, Color::Black);
    assert_ne!(mv2, hexcore::cell::RESIGN);
    assert!(hb.board.empty().contains(mv2));
}

#[test]
fn presearch_shortcuts_an_immediate_win() {
    let patterns = empty_patterns();
    let mut hb = HexBoard::new(1, 3, Arc::clone(&patterns));

    // Black needs exactly the middle cell to solidly connect north-south
    // on a 1-wide board; playing the other two first leaves one winning
    // move for Black with no reply that matters.
    let top = hb.board.geom.cell(0, 0);
    let bottom = hb.board.geom.cell(0, 2);
    hb.play_move(Color::Black, top);
    hb.play_move(Color::Black, bottom);

    let config = config_for(1, 3);
    let initial = hexcore::mcts::presearch::run(&hb, &patterns, &config, Color::Black);
    let middle = hb.board.geom.cell(0, 1);
    assert_eq!(initial.immediate_win, Some(middle));

    let mv = hexcore::mcts::genmove(&hb, &patterns, &config, Color::Black);
    assert_eq!(mv, middle);
}
