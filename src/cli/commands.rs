//! Command implementation for ln-gamma-stats
//!
//! `run` executes the whole batch: load → extract → summarize → write report
//! → render both figures. Each stage consumes the previous stage's complete
//! output; the first error aborts the run.

use std::path::PathBuf;
use std::time::Instant;

use crate::analysis::{analyze, Artifacts};
use crate::checkpoint::load_checkpoint;
use crate::error::GammaError;

use super::args::Args;

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Any pipeline error
    #[error(transparent)]
    Gamma(#[from] GammaError),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// Stage timings in milliseconds
#[derive(Debug, Clone, Default)]
pub struct Timings {
    /// Checkpoint resolution and read
    pub load_ms: f64,
    /// Extraction and summarization
    pub analyze_ms: f64,
    /// Report and image writes
    pub write_ms: f64,
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Written artifacts
    pub artifacts: Artifacts,
    /// Number of LayerNorm occurrences found
    pub layernorms: usize,
    /// Number of gamma values summarized
    pub values: usize,
    /// Stage timings
    pub timings: Timings,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn validate(args: &Args) -> CliResult<()> {
    if args.bins == 0 {
        return Err(CliError::Gamma(GammaError::Render(
            "--bins must be at least 1".to_string(),
        )));
    }
    if args.ncols == 0 {
        return Err(CliError::InvalidArgument(
            "--ncols must be at least 1".to_string(),
        ));
    }
    if args.model_name.trim().is_empty() {
        return Err(CliError::InvalidArgument(
            "--model-name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Run the CLI with parsed arguments
///
/// Progress lines go to stdout unless `--quiet`; `[INFO]` details go to
/// stderr with `--verbose`.
///
/// # Errors
///
/// Returns the first error from argument validation, loading, extraction,
/// summarization or writing.
pub fn run(args: &Args) -> CliResult<RunSummary> {
    validate(args)?;
    let _guard = crate::trace_enter!("run");
    let mut timings = Timings::default();
    let progress = !args.quiet;

    if progress {
        println!("Loading {}...", args.model_name);
    }
    let start = Instant::now();
    let checkpoint = load_checkpoint(&args.model_name, &args.revision, args.verbose)?;
    let source = checkpoint.parameters()?;
    timings.load_ms = elapsed_ms(start);

    if args.verbose {
        eprintln!(
            "[INFO] Checkpoint: {} ({} tensors, {} bytes, {:.1}ms)",
            checkpoint.path().display(),
            source.len(),
            checkpoint.size(),
            timings.load_ms
        );
    }

    let start = Instant::now();
    let analysis = analyze(&source)?;
    timings.analyze_ms = elapsed_ms(start);

    if args.verbose {
        eprintln!(
            "[INFO] Found {} LayerNorms across {} blocks ({} values, {:.1}ms)",
            analysis.extraction.layers.len(),
            analysis.extraction.block_count(),
            analysis.report.all.count,
            timings.analyze_ms
        );
        eprintln!("[INFO] all: {}", analysis.report.all);
    }

    let output = args.output();
    let options = args.plot_options();
    let start = Instant::now();
    let artifacts = analysis.write_artifacts(&output, &options)?;
    timings.write_ms = elapsed_ms(start);

    if progress {
        print_written(&artifacts);
    }

    Ok(RunSummary {
        layernorms: analysis.extraction.layers.len(),
        values: analysis.report.all.count,
        artifacts,
        timings,
    })
}

fn print_written(artifacts: &Artifacts) {
    let lines: [(&str, &PathBuf); 3] = [
        ("stats", &artifacts.stats),
        ("histogram", &artifacts.group_hist),
        ("histogram", &artifacts.layer_hist),
    ];
    for (what, path) in lines {
        println!("Wrote {what} to {}", path.display());
    }
}
