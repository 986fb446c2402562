//! Command-line argument parsing for ln-gamma-stats
//!
//! Uses clap derive macros; parsing is unit-testable via `try_parse_from`.

use std::path::PathBuf;

use clap::Parser;

use crate::checkpoint::loader::{DEFAULT_MODEL, DEFAULT_REVISION};
use crate::output::{OutputContext, DEFAULT_OUTPUT_DIR};
use crate::plot::{PlotOptions, DEFAULT_BINS, DEFAULT_MAX_COLS};

/// ln-gamma-stats: LayerNorm gamma statistics for pretrained GPT-2 checkpoints
///
/// Writes ln_gamma_stats.json, ln_gamma_hist_groups.png and
/// ln_gamma_hist_layernorms.png into the output directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "ln-gamma-stats")]
#[command(version)]
#[command(about = "Collect LayerNorm gamma stats for a pretrained GPT-2 checkpoint", long_about = None)]
pub struct Args {
    /// Hugging Face model id, local .safetensors file, or model directory
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model_name: String,

    /// Hub revision (branch, tag or commit)
    #[arg(long, default_value = DEFAULT_REVISION)]
    pub revision: String,

    /// Where to write stats and plots
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Histogram bins
    #[arg(long, default_value_t = DEFAULT_BINS)]
    pub bins: usize,

    /// Maximum columns of the per-layer histogram grid
    #[arg(long, default_value_t = DEFAULT_MAX_COLS)]
    pub ncols: usize,

    /// Verbose output ([INFO] lines on stderr)
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet mode (suppress progress lines)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Output location derived from `--output-dir`
    #[must_use]
    pub fn output(&self) -> OutputContext {
        OutputContext::new(&self.output_dir)
    }

    /// Plot settings derived from `--bins` and `--ncols`
    #[must_use]
    pub fn plot_options(&self) -> PlotOptions {
        PlotOptions {
            bins: self.bins,
            max_cols: self.ncols,
        }
    }
}
