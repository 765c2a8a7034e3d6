//! Engine-wide tuning constants.
//!
//! Board *size* is a runtime parameter of [`crate::board::Board`] (Hex boards
//! range from 1x1 up to 11x11), unlike the fixed-size Go board this engine
//! was generalized from. Everything here is either a search/ICE tuning knob
//! or a hard limit that protects memory use regardless of board size.

/// Maximum board dimension supported along either axis.
pub const MAX_SIZE: usize = 11;

/// Soft limit on the number of Full VCs kept per group pair before pruning
/// the weakest (largest-carrier) ones.
pub const SOFT_LIMIT_FULL: usize = 25;

/// Soft limit on the number of Semi VCs kept per group pair.
pub const SOFT_LIMIT_SEMI: usize = 25;

/// Ring-godel update radius used while the search tree is being descended
/// (wide enough for any pattern role consulted there).
pub const TREE_UPDATE_RADIUS: usize = 2;

/// Ring-godel update radius used during random playouts, where only 1-ring
/// (immediate-neighbor) patterns are consulted.
pub const PLAYOUT_UPDATE_RADIUS: usize = 1;

/// RAVE equivalence parameter; controls the blend between AMAF and the
/// empirical UCB estimate as a node accumulates visits.
pub const RAVE_EQUIV: f64 = 3500.0;

/// Minimum visits a node needs before it is expanded into children.
pub const EXPAND_VISITS: u32 = 8;

/// Baseline prior visits/wins given to every freshly expanded node, so that
/// unvisited moves are not immediately starved by UCB.
pub const PRIOR_EVEN: u32 = 10;

/// Prior bonus for a move matching a `PlayoutSuggestion` pattern.
pub const PRIOR_PATTERN: u32 = 24;

/// Prior bonus for a move that fills a cell the opponent would need to
/// cover to avoid an immediate threat (i.e. a mustplay cell).
pub const PRIOR_MUSTPLAY: u32 = 40;

/// Winrate below which `genmove` resigns instead of playing on, when
/// resignation is enabled.
pub const RESIGN_THRESHOLD: f64 = 0.05;

/// Fraction-of-budget / winrate thresholds controlling early stop of a
/// search that has already found a decisive line.
pub const FASTPLAY_AT_20PCT: f64 = 0.8;
pub const FASTPLAY_AT_5PCT: f64 = 0.95;

/// Default number of MCTS simulations when no time budget is given.
pub const DEFAULT_SIMS: usize = 20_000;

/// Default number of MCTS worker threads.
pub const DEFAULT_MCTS_THREADS: usize = 4;

/// Default number of one-ply pre-search worker threads (kept smaller than
/// the main MCTS pool since it runs once per move, briefly, at full
/// per-candidate cost).
pub const DEFAULT_PRESEARCH_THREADS: usize = 2;

/// Progress report period, in simulations, for the HTP front end's debug
/// output during `genmove`.
pub const REPORT_PERIOD: usize = 2_000;
