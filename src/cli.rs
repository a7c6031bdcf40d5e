//! Command-line interface for the relational algebra IR tools.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "relalg")]
#[command(about = "Build, print and check relational algebra query plans", long_about = None)]
pub struct Cli {
    /// Log registration and build details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse an IR file and print it in canonical form
    Print {
        /// IR text file
        file: PathBuf,
    },
    /// Parse and verify an IR file
    Check {
        /// IR text file
        file: PathBuf,
    },
    /// Print a sample plan: a table scan filtered by `id = 5`
    Demo,
}
