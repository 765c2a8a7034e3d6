//! Command-line configuration.
//!
//! Generalizes the teacher's bare `Cli { command: Option<Commands> }`
//! (just a GTP/demo switch) into the knobs a search actually needs:
//! board size, thread counts, search budget, and the pattern file path.
//! Logging is left to `env_logger`'s own `RUST_LOG` convention rather
//! than a flag, matching the teacher's "config and logging are external
//! collaborators" stance.

use clap::Parser;

use crate::constants::{DEFAULT_MCTS_THREADS, DEFAULT_PRESEARCH_THREADS, DEFAULT_SIMS, RESIGN_THRESHOLD};

#[derive(Parser, Debug, Clone)]
#[command(name = "hexcore")]
#[command(author, version, about = "A Hex-playing engine core", long_about = None)]
pub struct Config {
    /// Board width (columns).
    #[arg(long, default_value_t = 11)]
    pub width: usize,

    /// Board height (rows); defaults to a square board.
    #[arg(long)]
    pub height: Option<usize>,

    /// Worker threads used by the MCTS search. Defaults to the machine's
    /// logical core count (spec 5's "fixed pool of OS-level threads").
    #[arg(long, default_value_t = num_cpus::get())]
    pub mcts_threads: usize,

    /// Worker threads used by the one-ply pre-search. Defaults to a
    /// smaller pool than `mcts_threads` (spec 5: "a second, smaller
    /// pool performs the one-ply pre-search").
    #[arg(long, default_value_t = num_cpus::get().max(2) / 2)]
    pub presearch_threads: usize,

    /// Number of simulations to run per `genmove`, if no time budget is set.
    #[arg(long, default_value_t = DEFAULT_SIMS)]
    pub sims: usize,

    /// Search time budget per move, in milliseconds. Overrides `sims`.
    #[arg(long)]
    pub time_ms: Option<u64>,

    /// Winrate below which `genmove` resigns instead of playing on.
    #[arg(long, default_value_t = RESIGN_THRESHOLD)]
    pub resign_threshold: f64,

    /// Disable resignation entirely.
    #[arg(long, default_value_t = false)]
    pub no_resign: bool,

    /// Path to the pattern file to load at startup.
    #[arg(long)]
    pub pattern_file: Option<String>,

    /// Random seed; unset means a fresh seed per run (non-deterministic
    /// across runs, but still reproducible within one given the same
    /// seed, thread count, and pre-search partitioning).
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Config {
    pub fn board_height(&self) -> usize {
        self.height.unwrap_or(self.width)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            width: 11,
            height: None,
            mcts_threads: DEFAULT_MCTS_THREADS,
            presearch_threads: DEFAULT_PRESEARCH_THREADS,
            sims: DEFAULT_SIMS,
            time_ms: None,
            resign_threshold: RESIGN_THRESHOLD,
            no_resign: false,
            pattern_file: None,
            seed: None,
        }
    }
}
