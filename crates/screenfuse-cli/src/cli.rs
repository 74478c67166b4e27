//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Screenfuse: validate and fuse independent screening decisions
#[derive(Parser)]
#[command(name = "screenfuse")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate all review tables and write the fused target table
    Fuse {
        /// Path to the job configuration (JSON or TOML)
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Write a conflict report to this path
        #[arg(short, long, value_name = "PATH")]
        conflicts: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate all review tables without writing anything
    Check {
        /// Path to the job configuration (JSON or TOML)
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
