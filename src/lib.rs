//! # ln-gamma-stats
//!
//! LayerNorm gamma statistics for pretrained GPT-2 style checkpoints.
//!
//! ## Overview
//!
//! The crate walks a checkpoint's named parameters once, collects every
//! LayerNorm scale tensor (`ln_1`, `ln_2` per block, `ln_f` at the end), and
//! produces:
//!
//! - `ln_gamma_stats.json`: summaries over all gammas, per group and per layer
//! - `ln_gamma_hist_groups.png`: four histograms (`ln_1`, `ln_2`, `ln_f`, `all`)
//! - `ln_gamma_hist_layernorms.png`: one histogram per layer in a grid
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ln_gamma_stats::{analyze, load_checkpoint, GammaResult, OutputContext, PlotOptions};
//!
//! # fn main() -> GammaResult<()> {
//! let checkpoint = load_checkpoint("openai-community/gpt2", "main", false)?;
//! let analysis = analyze(&checkpoint.parameters()?)?;
//! println!("{}", analysis.report.all);
//! analysis.write_artifacts(&OutputContext::new("out"), &PlotOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `cli` (default): command-line interface via clap
//! - `hub` (default): Hugging Face Hub downloads via hf-hub
//! - `tracing` (default): debug spans and events via tracing

#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

#[macro_use]
pub mod trace;

pub mod analysis;
pub mod checkpoint;
pub mod error;
pub mod extract;
pub mod layer;
pub mod output;
pub mod plot;
pub mod report;
pub mod stats;

/// CLI module for the native command-line interface
#[cfg(feature = "cli")]
pub mod cli;

pub use analysis::{analyze, Analysis, Artifacts};
pub use checkpoint::{load_checkpoint, CheckpointFile, Parameter, ParameterSource};
pub use error::{GammaError, GammaResult};
pub use extract::{collect_ln_gammas, Extraction, Groups, LayerBuckets};
pub use layer::{sort_key, BlockNorm, LayerKey, NormKind};
pub use output::OutputContext;
pub use plot::{render_group_histograms, render_layer_histograms, PlotOptions};
pub use report::{FlatGroups, Report};
pub use stats::{summarize, Summary};
