//! hexcore: a Hex-playing engine core.
//!
//! Implements the position-evaluation and search pipeline shared by the
//! strong Hex agents: inferior-cell analysis (ICE), a virtual-connection
//! (VC) engine, a decomposition handler, and a multi-threaded MCTS core
//! (MoHex) seeded by a one-ply pre-search. A line-oriented text protocol
//! (`htp`) exposes the engine to external front ends.
//!
//! ## Modules
//!
//! - [`cell`] - board geometry: cell identifiers, color, coordinate parsing
//! - [`bitset`] - fixed-universe cell sets (carriers, consider sets)
//! - [`board`] - stone board, union-find group board, ring godels
//! - [`patterns`] - the pattern engine: loading, hashed-bucket matching
//! - [`ice`] - inferior-cell analysis: fill-in and domination
//! - [`vc`] - the virtual-connection engine
//! - [`decomposition`] - the decomposition handler
//! - [`hexboard`] - the `HexBoard` façade tying board + ICE + VC together
//! - [`oracle`] - the player-utility oracle (win/loss, consider sets)
//! - [`mcts`] - the MCTS core, worker pool, and one-ply pre-search
//! - [`search`] - the `SearchBoard`/transposition-table seam for an
//!   external full-width search (interface only, spec 4.10)
//! - [`htp`] - the text protocol front end
//! - [`config`] - CLI configuration
//! - [`error`] - protocol/rules/resource error types
//! - [`constants`] - engine-wide tuning constants

pub mod bitset;
pub mod board;
pub mod cell;
pub mod config;
pub mod constants;
pub mod decomposition;
pub mod error;
pub mod hexboard;
pub mod htp;
pub mod ice;
pub mod mcts;
pub mod oracle;
pub mod patterns;
pub mod search;
pub mod vc;
