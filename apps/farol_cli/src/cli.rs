//! Command-line argument parsing for `farol`.
//!
//! The CLI is built on [`clap`] with derive macros. Running
//! `farol program.fa` parses, type-checks, and evaluates the program with
//! the strong strategy, printing solutions one per line. After each
//! solution the interpreter pauses at a `;` prompt: an empty line or `;`
//! asks for the next solution, `.` stops. `--all` disables the prompt.

use std::path::PathBuf;

use clap::Parser;

/// The farol interpreter.
#[derive(Parser, Debug)]
#[command(name = "farol")]
#[command(about = "Run a farol program", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The program to run (a `.fa` file).
    pub input: PathBuf,

    /// Print every solution without pausing at the `;` prompt.
    #[arg(long)]
    pub all: bool,

    /// Stop after at most N solutions.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}
