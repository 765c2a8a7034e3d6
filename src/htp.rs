//! The Hex text protocol (HTP) front end: a line-oriented command loop
//! over stdin/stdout (spec 6).
//!
//! Grounded on the teacher's `GtpEngine` (`execute(command, args) ->
//! (bool, String)`, a `KNOWN_COMMANDS` list, an optional leading numeric
//! command id, a `run()` stdin/stdout loop) with the command set swapped
//! for Hex's per spec 6, and on `original_source/src/htp/HtpHexEngine.cpp`
//! for `swap-pieces`/`resign`/`loadsgf` semantics. Unlike the teacher's
//! raw `eprintln!` board dump, debug/board output goes through `log`.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::cell::{Color, EDGE_EAST, EDGE_NORTH, EDGE_SOUTH, EDGE_WEST, INVALID, RESIGN, SWAP};
use crate::config::Config;
use crate::error::{ProtocolError, RulesError};
use crate::hexboard::HexBoard;
use crate::mcts;
use crate::oracle;
use crate::patterns::PatternLibrary;

const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "play",
    "genmove",
    "undo",
    "showboard",
    "all_legal_moves",
    "final_score",
    "time_left",
    "loadsgf",
    "list_commands",
    "known_command",
    "name",
    "version",
    "quit",
];

/// Per-color clock state for `time_left`.
#[derive(Clone, Copy, Default)]
struct Clock {
    seconds_left: Option<f64>,
}

/// HTP engine state: the current game position plus engine configuration.
pub struct HtpEngine {
    config: Config,
    patterns: Arc<PatternLibrary>,
    board: HexBoard,
    to_move: Color,
    /// Whether `swap-pieces` is still a legal reply (only true
    /// immediately after the first move of the game).
    swap_window_open: bool,
    black_clock: Clock,
    white_clock: Clock,
}

impl HtpEngine {
    pub fn new(config: Config, patterns: Arc<PatternLibrary>) -> HtpEngine {
        let board = HexBoard::new(config.width, config.board_height(), Arc::clone(&patterns));
        HtpEngine {
            config,
            patterns,
            board,
            to_move: Color::Black,
            swap_window_open: false,
            black_clock: Clock::default(),
            white_clock: Clock::default(),
        }
    }

    fn reset_board(&mut self, width: usize, height: usize) {
        self.board = HexBoard::new(width, height, Arc::clone(&self.patterns));
        self.to_move = Color::Black;
        self.swap_window_open = false;
        self.black_clock = Clock::default();
        self.white_clock = Clock::default();
    }

    /// Run the command loop, reading from stdin and writing to stdout,
    /// one blank-line-terminated reply per command (spec 6).
    pub fn run(&mut self) {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            let command = parts[0].to_lowercase();
            let args = &parts[1..];

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(stdout, "{prefix}{id_str} {message}\n").ok();
            stdout.flush().ok();

            if command == "quit" {
                break;
            }
        }
    }

    /// Single conversion point from the typed `ProtocolError`/`RulesError`
    /// hierarchy to the wire `(bool, String)` reply format (spec 6).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match self.dispatch(command, args) {
            Ok(message) => (true, message),
            Err(e) => (false, e.to_string()),
        }
    }

    fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<String, ProtocolError> {
        match command {
            "name" => Ok("hexcore".to_string()),
            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),
            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),
            "known_command" => {
                let &cmd = args.first().ok_or_else(|| ProtocolError::WrongArgCount { command: command.to_string(), expected: 1, got: 0 })?;
                let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                Ok(known.to_string())
            }
            "quit" => Ok(String::new()),
            "boardsize" => self.cmd_boardsize(args),
            "play" => self.cmd_play(args),
            "genmove" => self.cmd_genmove(args),
            "undo" => self.cmd_undo(),
            "showboard" => Ok(format!("\n{}", self.render_board())),
            "all_legal_moves" => Ok(self.cmd_all_legal_moves()),
            "final_score" => Ok(self.cmd_final_score()),
            "time_left" => self.cmd_time_left(args),
            "loadsgf" => self.cmd_loadsgf(args),
            _ => Err(ProtocolError::UnknownCommand(command.to_string())),
        }
    }

    fn cmd_boardsize(&mut self, args: &[&str]) -> Result<String, ProtocolError> {
        let invalid = |message: &str| ProtocolError::InvalidArgument { command: "boardsize".to_string(), message: message.to_string() };
        let &w = args.first().ok_or_else(|| ProtocolError::WrongArgCount { command: "boardsize".to_string(), expected: 1, got: 0 })?;
        let width: usize = w.parse().map_err(|_| invalid("invalid width"))?;
        let height = match args.get(1) {
            Some(h) => h.parse::<usize>().map_err(|_| invalid("invalid height"))?,
            None => width,
        };
        if width == 0 || height == 0 || width > crate::constants::MAX_SIZE || height > crate::constants::MAX_SIZE {
            return Err(invalid(&format!("board size must be between 1 and {}", crate::constants::MAX_SIZE)));
        }
        self.reset_board(width, height);
        Ok(String::new())
    }

    fn cmd_play(&mut self, args: &[&str]) -> Result<String, ProtocolError> {
        if args.len() < 2 {
            return Err(ProtocolError::WrongArgCount { command: "play".to_string(), expected: 2, got: args.len() });
        }
        let color = parse_color(args[0])
            .ok_or_else(|| ProtocolError::InvalidArgument { command: "play".to_string(), message: format!("invalid color: {}", args[0]) })?;
        let cell_str = args[1];
        let cell = self
            .board
            .board
            .geom
            .parse_coord(cell_str)
            .ok_or_else(|| ProtocolError::InvalidArgument { command: "play".to_string(), message: format!("invalid cell: {cell_str}") })?;

        if cell == RESIGN {
            log::info!("{color:?} resigns");
            return Ok(String::new());
        }
        if cell == SWAP {
            if !self.swap_window_open {
                return Err(ProtocolError::Rules(RulesError::SwapNotAllowed));
            }
            self.swap_window_open = false;
            self.to_move = color.other();
            return Ok(String::new());
        }
        if cell == INVALID || matches!(cell, EDGE_NORTH | EDGE_SOUTH | EDGE_EAST | EDGE_WEST) {
            return Err(ProtocolError::Rules(RulesError::CellInvalid(cell_str.to_string())));
        }
        if self.board.board.color(cell) != Color::Empty {
            return Err(ProtocolError::Rules(RulesError::CellOccupied(cell_str.to_string())));
        }

        self.swap_window_open = self.board.history_depth() == 0;
        self.board.play_move(color, cell);
        self.to_move = color.other();
        Ok(String::new())
    }

    fn cmd_genmove(&mut self, args: &[&str]) -> Result<String, ProtocolError> {
        let &color_str = args.first().ok_or_else(|| ProtocolError::WrongArgCount { command: "genmove".to_string(), expected: 1, got: 0 })?;
        let color = parse_color(color_str)
            .ok_or_else(|| ProtocolError::InvalidArgument { command: "genmove".to_string(), message: format!("invalid color: {color_str}") })?;

        let cell = mcts::genmove(&self.board, &self.patterns, &self.config, color);
        if cell == RESIGN {
            self.to_move = color.other();
            return Ok("resign".to_string());
        }

        self.swap_window_open = self.board.history_depth() == 0;
        self.board.play_move(color, cell);
        self.to_move = color.other();
        Ok(self.board.board.geom.format_coord(cell))
    }

    fn cmd_undo(&mut self) -> Result<String, ProtocolError> {
        if self.board.history_depth() == 0 {
            return Err(ProtocolError::InvalidArgument { command: "undo".to_string(), message: "cannot undo: no moves played".to_string() });
        }
        self.board.undo_move();
        self.to_move = self.to_move.other();
        Ok(String::new())
    }

    fn cmd_all_legal_moves(&self) -> String {
        let mut cells: Vec<String> = self.board.board.empty().iter().map(|c| self.board.board.geom.format_coord(c)).collect();
        cells.sort();
        cells.join(" ")
    }

    fn cmd_final_score(&self) -> String {
        if oracle::is_won_game(&self.board, Color::Black) {
            "B+".to_string()
        } else if oracle::is_won_game(&self.board, Color::White) {
            "W+".to_string()
        } else {
            "cannot score".to_string()
        }
    }

    fn cmd_time_left(&mut self, args: &[&str]) -> Result<String, ProtocolError> {
        let Some(&color_str) = args.first() else {
            let (b, w) = (self.black_clock.seconds_left, self.white_clock.seconds_left);
            return Ok(format!("black={b:?} white={w:?}"));
        };
        let color = parse_color(color_str)
            .ok_or_else(|| ProtocolError::InvalidArgument { command: "time_left".to_string(), message: format!("invalid color: {color_str}") })?;
        let clock = match color {
            Color::Black => &mut self.black_clock,
            _ => &mut self.white_clock,
        };
        let Some(&secs_str) = args.get(1) else {
            return Ok(format!("{:?}", clock.seconds_left));
        };
        let secs: f64 = secs_str
            .parse()
            .map_err(|_| ProtocolError::InvalidArgument { command: "time_left".to_string(), message: "invalid time value".to_string() })?;
        clock.seconds_left = Some(secs);
        if secs <= 0.0 && !self.config.no_resign {
            log::info!("{color:?}'s clock expired; configured to resign");
        }
        Ok(String::new())
    }

    fn cmd_loadsgf(&mut self, args: &[&str]) -> Result<String, ProtocolError> {
        let &path = args.first().ok_or_else(|| ProtocolError::WrongArgCount { command: "loadsgf".to_string(), expected: 1, got: 0 })?;
        let move_limit: Option<usize> = args.get(1).and_then(|s| s.parse().ok());
        let text = std::fs::read_to_string(path)
            .map_err(|e| ProtocolError::InvalidArgument { command: "loadsgf".to_string(), message: format!("cannot read {path}: {e}") })?;
        let moves = parse_sgf_moves(&text);
        self.reset_board(self.config.width, self.config.board_height());
        for (i, (color, coord)) in moves.iter().enumerate() {
            if move_limit.is_some_and(|limit| i >= limit) {
                break;
            }
            let Some(cell) = self.board.board.geom.parse_coord(coord) else {
                continue;
            };
            if self.board.board.color(cell) == Color::Empty {
                self.board.play_move(*color, cell);
                self.to_move = color.other();
            }
        }
        Ok(String::new())
    }

    fn render_board(&self) -> String {
        let geom = &self.board.board.geom;
        let mut out = String::new();
        for row in (0..geom.height).rev() {
            out.push_str(&" ".repeat(geom.height - row));
            for col in 0..geom.width {
                let c = geom.cell(col, row);
                let ch = match self.board.board.color(c) {
                    Color::Black => 'B',
                    Color::White => 'W',
                    Color::Dead => '.',
                    Color::Empty => '-',
                };
                out.push(ch);
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }
}

fn parse_color(s: &str) -> Option<Color> {
    match s.to_lowercase().as_str() {
        "b" | "black" => Some(Color::Black),
        "w" | "white" => Some(Color::White),
        _ => None,
    }
}

fn parse_id(line: &str) -> (Option<u32>, &str) {
    let trimmed = line.trim();
    let digits_end = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
    if digits_end == 0 {
        return (None, trimmed);
    }
    match trimmed[..digits_end].parse::<u32>() {
        Ok(id) => (Some(id), trimmed[digits_end..].trim()),
        Err(_) => (None, trimmed),
    }
}

/// Extract `(color, coordinate)` pairs from `B[xx]`/`W[xx]` SGF move
/// tags, in file order. This is intentionally minimal: full SGF game-tree
/// parsing (variations, other properties) is out of scope (spec 1).
fn parse_sgf_moves(text: &str) -> Vec<(Color, String)> {
    let mut out = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        let tag = bytes[i];
        if (tag == b'B' || tag == b'W') && bytes.get(i + 1) == Some(&b'[') {
            let color = if tag == b'B' { Color::Black } else { Color::White };
            if let Some(end) = text[i + 2..].find(']') {
                let coord = text[i + 2..i + 2 + end].to_string();
                if !coord.is_empty() {
                    out.push((color, coord));
                }
                i += 2 + end;
                continue;
            }
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> HtpEngine {
        HtpEngine::new(Config { width: 5, height: Some(5), sims: 50, mcts_threads: 1, presearch_threads: 1, ..Config::default() }, Arc::new(PatternLibrary::parse("").unwrap()))
    }

    #[test]
    fn name_and_version() {
        let mut e = engine();
        assert_eq!(e.execute("name", &[]), (true, "hexcore".to_string()));
        assert!(e.execute("version", &[]).0);
    }

    #[test]
    fn known_command_roundtrip() {
        let mut e = engine();
        assert_eq!(e.execute("known_command", &["play"]), (true, "true".to_string()));
        assert_eq!(e.execute("known_command", &["bogus"]), (true, "false".to_string()));
    }

    #[test]
    fn play_then_all_legal_moves_shrinks() {
        let mut e = engine();
        let before = e.cmd_all_legal_moves().split_whitespace().count();
        let (ok, _) = e.execute("play", &["black", "a1"]);
        assert!(ok);
        let after = e.cmd_all_legal_moves().split_whitespace().count();
        assert!(after < before);
    }

    #[test]
    fn playing_an_occupied_cell_fails() {
        let mut e = engine();
        e.execute("play", &["black", "a1"]);
        let (ok, msg) = e.execute("play", &["white", "a1"]);
        assert!(!ok);
        assert!(msg.contains("occupied"));
    }

    #[test]
    fn swap_only_legal_immediately_after_first_move() {
        let mut e = engine();
        let (ok, _) = e.execute("play", &["black", "swap-pieces"]);
        assert!(!ok);
        e.execute("play", &["black", "a1"]);
        let (ok, _) = e.execute("play", &["white", "swap-pieces"]);
        assert!(ok);
    }

    #[test]
    fn undo_with_no_history_fails() {
        let mut e = engine();
        let (ok, _) = e.execute("undo", &[]);
        assert!(!ok);
    }

    #[test]
    fn final_score_reports_cannot_score_on_empty_board() {
        let mut e = engine();
        assert_eq!(e.execute("final_score", &[]), (true, "cannot score".to_string()));
    }

    #[test]
    fn boardsize_rejects_oversize() {
        let mut e = engine();
        let (ok, _) = e.execute("boardsize", &["99"]);
        assert!(!ok);
    }

    #[test]
    fn parse_id_strips_leading_number() {
        assert_eq!(parse_id("7 genmove black"), (Some(7), "genmove black"));
        assert_eq!(parse_id("genmove black"), (None, "genmove black"));
    }
}
