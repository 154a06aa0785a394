//! farol - standalone binary.
//!
//! A thin wrapper around [`farol_cli::run_cli`], handling error display and
//! exit codes. All pipeline logic lives in the library crate for
//! testability.
//!
//! # Exit Codes
//!
//! - `0` - all requested solutions were produced
//! - `1` - a diagnostic was printed to stderr

fn main() {
    if let Err(message) = farol_cli::run_cli() {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}
