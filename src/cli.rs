//! Command-line interface definitions.

use clap::{Parser, Subcommand};

/// Adaptive-rate subreddit monitor
#[derive(Debug, Parser)]
#[command(name = "redmon", version, about)]
pub struct Cli {
    /// Increase log verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Monitor a subreddit until interrupted
    Run {
        /// Subreddit to monitor (without the /r/ prefix)
        subreddit: String,
    },
    /// Compute the pacing delay for a set of quota values
    Delay {
        /// Requests consumed in the current window
        #[arg(long)]
        used: i64,
        /// Requests left before throttling
        #[arg(long)]
        remaining: i64,
        /// Seconds until the quota window resets
        #[arg(long)]
        reset: i64,
        /// Cost of the last call in milliseconds
        #[arg(long, default_value_t = 0)]
        duration_ms: u64,
    },
}
