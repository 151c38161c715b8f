//! Driver for the `trawl` binary: argument handling, one pipeline run, one JSON line.
pub mod cli;
pub mod output;
pub mod run;

pub use cli::Cli;
pub use run::{Outcome, execute};
