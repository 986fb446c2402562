//! Histogram rendering
//!
//! Two figures are produced, both PNG via the `plotters` bitmap backend:
//!
//! - group figure: one row of four panels (`ln_1`, `ln_2`, `ln_f`, `all`)
//! - layer figure: one panel per layer in a grid of at most `max_cols`
//!   columns, filled row-major in layer order; trailing cells stay blank
//!
//! Panels of one figure share the count axis. Each panel bins its own values
//! into `bins` equal-width bins spanning that panel's `[min, max]`.
//!
//! Rendering goes to a temporary file beside the target and is renamed into
//! place only after the backend has finished, so a failed render never
//! leaves a truncated image behind.

use std::fs;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{GammaError, GammaResult};
use crate::extract::LayerBuckets;
use crate::layer::NormKind;
use crate::output::parent_dir;
use crate::report::FlatGroups;

/// Default number of histogram bins
pub const DEFAULT_BINS: usize = 60;

/// Default column limit of the layer grid
pub const DEFAULT_MAX_COLS: usize = 6;

/// Bar fill colour
pub const BAR_COLOR: RGBColor = RGBColor(0x2f, 0x4b, 0x7c);

const BAR_ALPHA: f64 = 0.85;
const GRID_ALPHA: f64 = 0.2;

const GROUP_FIGURE_SIZE: (u32, u32) = (3600, 800);
const LAYER_PANEL_SIZE: (u32, u32) = (640, 520);

const GROUP_TITLE_SIZE: u32 = 32;
const LAYER_TITLE_SIZE: u32 = 24;

/// Title of the pooled panel in the group figure
const ALL_PANEL: &str = "all";

/// Histogram settings shared by both figures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotOptions {
    /// Bins per panel
    pub bins: usize,
    /// Column limit of the layer grid
    pub max_cols: usize,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            max_cols: DEFAULT_MAX_COLS,
        }
    }
}

fn render_err(e: impl std::fmt::Display) -> GammaError {
    GammaError::Render(e.to_string())
}

/// Equal-width histogram over `[lo, hi]`
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Left edge of the first bin
    pub lo: f64,
    /// Right edge of the last bin
    pub hi: f64,
    /// Number of values per bin
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins spanning their range
    ///
    /// The last bin is closed on the right. A constant array is binned over
    /// `[v - 0.5, v + 0.5]`.
    ///
    /// # Errors
    ///
    /// - [`GammaError::Render`] if `bins` is zero
    /// - [`GammaError::EmptyInput`] if `values` is empty
    /// - [`GammaError::NonFinite`] if any value is NaN or infinite
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn compute(values: &[f32], bins: usize) -> GammaResult<Self> {
        if bins == 0 {
            return Err(GammaError::Render(
                "histogram bin count must be at least 1".to_string(),
            ));
        }
        if values.is_empty() {
            return Err(GammaError::EmptyInput(
                "cannot bin an empty array".to_string(),
            ));
        }

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in values {
            if !v.is_finite() {
                return Err(GammaError::NonFinite(format!("cannot bin value {v}")));
            }
            lo = lo.min(f64::from(v));
            hi = hi.max(f64::from(v));
        }
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let scale = bins as f64 / (hi - lo);
        let mut counts = vec![0u64; bins];
        for &v in values {
            let idx = ((f64::from(v) - lo) * scale) as usize;
            counts[idx.min(bins - 1)] += 1;
        }

        Ok(Self { lo, hi, counts })
    }

    /// Width of every bin
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bin_width(&self) -> f64 {
        (self.hi - self.lo) / self.counts.len() as f64
    }

    /// Tallest bin
    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// `(left, right, count)` per bin
    #[allow(clippy::cast_precision_loss)]
    pub fn bars(&self) -> impl Iterator<Item = (f64, f64, u64)> + '_ {
        let width = self.bin_width();
        self.counts.iter().enumerate().map(move |(i, &count)| {
            let left = self.lo + width * i as f64;
            (left, left + width, count)
        })
    }
}

/// Panel grid of the layer figure
///
/// Panels fill rows left to right; cells past the last panel stay blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
}

impl GridLayout {
    /// Fit `panels` panels into at most `max_cols` columns
    ///
    /// # Errors
    ///
    /// Returns [`GammaError::Render`] if either argument is zero.
    pub fn new(panels: usize, max_cols: usize) -> GammaResult<Self> {
        if max_cols == 0 {
            return Err(GammaError::Render(
                "grid column count must be at least 1".to_string(),
            ));
        }
        if panels == 0 {
            return Err(GammaError::Render("no panels to lay out".to_string()));
        }
        let cols = max_cols.min(panels);
        Ok(Self {
            rows: panels.div_ceil(cols),
            cols,
        })
    }

    /// `(row, col)` of the `index`-th panel
    #[must_use]
    pub fn position(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }
}

/// Only the first panel of a figure carries the "count" axis label
const fn labels_count_axis(index: usize) -> bool {
    index == 0
}

#[allow(clippy::cast_precision_loss)]
fn shared_y_top<'a>(hists: impl IntoIterator<Item = &'a Histogram>) -> f64 {
    let tallest = hists.into_iter().map(Histogram::max_count).max().unwrap_or(0);
    (tallest.max(1) as f64) * 1.05
}

#[allow(clippy::cast_precision_loss)]
fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    title_size: u32,
    hist: &Histogram,
    y_top: f64,
    y_desc: bool,
) -> GammaResult<()> {
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", title_size))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(if y_desc { 70 } else { 50 })
        .build_cartesian_2d(hist.lo..hist.hi, 0.0f64..y_top)
        .map_err(render_err)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc("gamma")
        .bold_line_style(BLACK.mix(GRID_ALPHA))
        .light_line_style(BLACK.mix(GRID_ALPHA / 4.0))
        .x_labels(5);
    if y_desc {
        mesh.y_desc("count");
    }
    mesh.draw().map_err(render_err)?;

    chart
        .draw_series(hist.bars().map(|(left, right, count)| {
            Rectangle::new(
                [(left, 0.0), (right, count as f64)],
                BAR_COLOR.mix(BAR_ALPHA).filled(),
            )
        }))
        .map_err(render_err)?;

    Ok(())
}

/// Render into a temporary PNG next to `path`, then move it into place
fn render_to_file<F>(path: &Path, size: (u32, u32), draw: F) -> GammaResult<()>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> GammaResult<()>,
{
    let dir = parent_dir(path);
    fs::create_dir_all(dir).map_err(|e| {
        GammaError::Render(format!("cannot create directory {}: {e}", dir.display()))
    })?;

    let tmp = tempfile::Builder::new()
        .prefix(".ln_gamma_")
        .suffix(".png")
        .tempfile_in(dir)
        .map_err(|e| GammaError::Render(format!("cannot create image in {}: {e}", dir.display())))?;

    {
        let root = BitMapBackend::new(tmp.path(), size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        draw(&root)?;
        root.present().map_err(render_err)?;
    }

    tmp.persist(path).map_err(|e| {
        GammaError::Render(format!("cannot write {}: {}", path.display(), e.error))
    })?;
    Ok(())
}

/// Render the four group histograms side by side
///
/// Panel order: `ln_1`, `ln_2`, `ln_f`, `all`.
///
/// # Errors
///
/// Returns [`GammaError::Render`] for a zero bin count, an uncreatable
/// directory or a backend failure; binning errors propagate unchanged.
pub fn render_group_histograms(flat: &FlatGroups, bins: usize, path: &Path) -> GammaResult<()> {
    let _guard = crate::trace_enter!("render_group_histograms");

    let mut panels: Vec<(&str, Histogram)> = Vec::with_capacity(NormKind::ALL.len() + 1);
    for kind in NormKind::ALL {
        panels.push((kind.marker(), Histogram::compute(flat.get(kind), bins)?));
    }
    panels.push((ALL_PANEL, Histogram::compute(&flat.all, bins)?));
    let y_top = shared_y_top(panels.iter().map(|(_, hist)| hist));

    render_to_file(path, GROUP_FIGURE_SIZE, |root| {
        let areas = root.split_evenly((1, panels.len()));
        for (i, (area, (title, hist))) in areas.iter().zip(&panels).enumerate() {
            draw_panel(area, title, GROUP_TITLE_SIZE, hist, y_top, labels_count_axis(i))?;
        }
        Ok(())
    })?;

    crate::trace_event!(path = %path.display(), "group histogram written");
    Ok(())
}

/// Render one histogram per layer in a grid
///
/// Panels follow layer order, filling rows left to right. Cells past the
/// last layer are left empty.
///
/// # Errors
///
/// Returns [`GammaError::Render`] for a zero bin or column count, an empty
/// bucket map, an uncreatable directory or a backend failure.
#[allow(clippy::cast_possible_truncation)]
pub fn render_layer_histograms(
    layers: &LayerBuckets,
    bins: usize,
    max_cols: usize,
    path: &Path,
) -> GammaResult<()> {
    let _guard = crate::trace_enter!("render_layer_histograms", panels = layers.len());

    if bins == 0 {
        return Err(GammaError::Render(
            "histogram bin count must be at least 1".to_string(),
        ));
    }
    let grid = GridLayout::new(layers.len(), max_cols)?;

    let mut panels: Vec<(String, Histogram)> = Vec::with_capacity(layers.len());
    for (key, values) in layers {
        panels.push((key.to_string(), Histogram::compute(values, bins)?));
    }
    let y_top = shared_y_top(panels.iter().map(|(_, hist)| hist));

    let size = (
        LAYER_PANEL_SIZE.0 * grid.cols as u32,
        LAYER_PANEL_SIZE.1 * grid.rows as u32,
    );

    render_to_file(path, size, |root| {
        let areas = root.split_evenly((grid.rows, grid.cols));
        for (i, (title, hist)) in panels.iter().enumerate() {
            let (row, col) = grid.position(i);
            let area = &areas[row * grid.cols + col];
            draw_panel(area, title, LAYER_TITLE_SIZE, hist, y_top, labels_count_axis(i))?;
        }
        Ok(())
    })?;

    crate::trace_event!(
        path = %path.display(),
        rows = grid.rows,
        cols = grid.cols,
        "layer histogram written"
    );
    Ok(())
}
