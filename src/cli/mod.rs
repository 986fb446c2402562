//! CLI module for ln-gamma-stats
//!
//! All logic lives here so it can be tested; the binary
//! (`src/bin/ln-gamma-stats.rs`) only parses arguments and calls [`run`].
//!
//! ```text
//! src/cli/
//! ├── mod.rs       # This file - module exports
//! ├── args.rs      # Argument parsing with clap
//! └── commands.rs  # The batch pipeline
//! ```

pub mod args;
pub mod commands;

pub use args::Args;
pub use commands::{run, CliError, CliResult, RunSummary, Timings};
