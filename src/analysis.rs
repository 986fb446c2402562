//! End-to-end analysis of one checkpoint
//!
//! [`analyze`] is a pure function from a parameter source to everything the
//! writers need. [`Analysis::write_artifacts`] then persists the report and
//! both figures into an [`OutputContext`].

use std::path::PathBuf;

use crate::checkpoint::ParameterSource;
use crate::error::GammaResult;
use crate::extract::{collect_ln_gammas, Extraction};
use crate::output::OutputContext;
use crate::plot::{render_group_histograms, render_layer_histograms, PlotOptions};
use crate::report::{FlatGroups, Report};

/// Extracted gammas and their statistics
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Per-group and per-layer arrays
    pub extraction: Extraction,
    /// Flattened groups and global pool
    pub flat: FlatGroups,
    /// Summaries
    pub report: Report,
}

/// Paths of the written artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// JSON report
    pub stats: PathBuf,
    /// Group histogram
    pub group_hist: PathBuf,
    /// Per-layer histogram
    pub layer_hist: PathBuf,
}

/// Extract and summarize the LayerNorm gammas of a model
///
/// # Errors
///
/// Propagates extraction errors (malformed names, decode failures) and
/// summarization errors (empty groups, non-finite values).
pub fn analyze<S>(source: &S) -> GammaResult<Analysis>
where
    S: ParameterSource + ?Sized,
{
    let extraction = collect_ln_gammas(source)?;
    let flat = FlatGroups::from_extraction(&extraction);
    let report = Report::build(&extraction, &flat)?;
    Ok(Analysis {
        extraction,
        flat,
        report,
    })
}

impl Analysis {
    /// Write the JSON report only
    ///
    /// # Errors
    ///
    /// Returns [`crate::GammaError::Io`] if the file cannot be written.
    pub fn write_report(&self, output: &OutputContext) -> GammaResult<PathBuf> {
        let path = output.stats_path();
        self.report.write(&path)?;
        Ok(path)
    }

    /// Render the group figure only
    ///
    /// # Errors
    ///
    /// Returns [`crate::GammaError::Render`] on invalid options or write failure.
    pub fn render_groups(
        &self,
        output: &OutputContext,
        options: &PlotOptions,
    ) -> GammaResult<PathBuf> {
        let path = output.group_hist_path();
        render_group_histograms(&self.flat, options.bins, &path)?;
        Ok(path)
    }

    /// Render the per-layer figure only
    ///
    /// # Errors
    ///
    /// Returns [`crate::GammaError::Render`] on invalid options or write failure.
    pub fn render_layers(
        &self,
        output: &OutputContext,
        options: &PlotOptions,
    ) -> GammaResult<PathBuf> {
        let path = output.layer_hist_path();
        render_layer_histograms(
            &self.extraction.layers,
            options.bins,
            options.max_cols,
            &path,
        )?;
        Ok(path)
    }

    /// Write the report, then both figures
    ///
    /// Stops at the first failure; artifacts written before it stay on disk.
    ///
    /// # Errors
    ///
    /// See [`Self::write_report`], [`Self::render_groups`], [`Self::render_layers`].
    pub fn write_artifacts(
        &self,
        output: &OutputContext,
        options: &PlotOptions,
    ) -> GammaResult<Artifacts> {
        Ok(Artifacts {
            stats: self.write_report(output)?,
            group_hist: self.render_groups(output, options)?,
            layer_hist: self.render_layers(output, options)?,
        })
    }
}
