//! Top-level error types.
//!
//! The teacher formats its `MoveError` by hand (`impl Display for
//! MoveError` in `position.rs`); `thiserror` just formalizes that pattern
//! and gives every layer (rules, protocol, resources) its own enum
//! instead of one another's variants, propagated upward with `anyhow` at
//! the binary boundary.

use thiserror::Error;

/// A move that violates Hex's (trivial) rules: the board has no ko or
/// suicide, so the only way to reject a move is an occupied or
/// out-of-range cell, or a swap attempted outside its legal window.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("cell {0} is already occupied")]
    CellOccupied(String),
    #[error("cell {0} is not a legal board coordinate")]
    CellInvalid(String),
    #[error("swap is only legal as the second move of the game")]
    SwapNotAllowed,
}

/// Errors surfaced by the text protocol front end (command dispatch,
/// argument parsing); kept distinct from `RulesError` so a malformed
/// command and an illegal move report differently to the client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("wrong number of arguments for {command}: expected {expected}, got {got}")]
    WrongArgCount { command: String, expected: usize, got: usize },
    #[error("{message}")]
    InvalidArgument { command: String, message: String },
    #[error("{0}")]
    Rules(#[from] RulesError),
}

/// Fatal resource/consistency failures: the kind spec 4.7 says should be
/// logged and treated as fatal rather than recovered from.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("pattern file error: {0}")]
    Pattern(#[from] crate::patterns::PatternError),
    #[error("internal invariant violated: {0}")]
    InvariantViolated(String),
}
