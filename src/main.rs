//! hexcore: a Hex-playing engine core.
//!
//! Parses CLI flags into a [`Config`](hexcore::config::Config), loads the
//! pattern library, and drives the text-protocol loop (`htp.rs`) over
//! stdin/stdout, in the role the teacher's `main.rs`/`gtp.rs` play for
//! its MCTS engine.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use hexcore::config::Config;
use hexcore::error::ResourceError;
use hexcore::htp::HtpEngine;
use hexcore::patterns::{PatternError, PatternLibrary};

fn main() -> ExitCode {
    env_logger::init();
    let config = Config::parse();

    let patterns = match load_patterns(&config) {
        Ok(lib) => Arc::new(lib),
        Err(e) => {
            log::error!("fatal: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut engine = HtpEngine::new(config, patterns);
    engine.run();
    ExitCode::SUCCESS
}

/// Load the pattern file named on the CLI, or fall back to an empty
/// library (no patterns loaded) when none is given, matching the
/// teacher's compiled-in fallback table but as an explicit empty set
/// rather than a baked-in shape this engine's patterns don't share with
/// Go's 3x3 table.
fn load_patterns(config: &Config) -> anyhow::Result<PatternLibrary> {
    match &config.pattern_file {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|_| ResourceError::Pattern(PatternError::NotFound(path.clone())))?;
            Ok(PatternLibrary::parse(&text).map_err(ResourceError::Pattern)?)
        }
        None => {
            log::warn!("no --pattern-file given; running with an empty pattern library");
            Ok(PatternLibrary::parse("").map_err(ResourceError::Pattern)?)
        }
    }
}
