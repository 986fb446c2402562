//! Output locations for one run
//!
//! Every stage receives an [`OutputContext`] explicitly; nothing writes to a
//! path it was not handed.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::GammaResult;

/// JSON statistics report
pub const STATS_FILENAME: &str = "ln_gamma_stats.json";
/// Group histogram figure
pub const GROUP_HIST_FILENAME: &str = "ln_gamma_hist_groups.png";
/// Per-layer histogram figure
pub const LAYER_HIST_FILENAME: &str = "ln_gamma_hist_layernorms.png";

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "outputs/gpt2_ln_stats";

/// Artifact directory of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputContext {
    dir: PathBuf,
}

impl OutputContext {
    /// Use `dir` for all artifacts (created lazily on first write)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the JSON report
    #[must_use]
    pub fn stats_path(&self) -> PathBuf {
        self.dir.join(STATS_FILENAME)
    }

    /// Path of the group histogram
    #[must_use]
    pub fn group_hist_path(&self) -> PathBuf {
        self.dir.join(GROUP_HIST_FILENAME)
    }

    /// Path of the per-layer histogram
    #[must_use]
    pub fn layer_hist_path(&self) -> PathBuf {
        self.dir.join(LAYER_HIST_FILENAME)
    }
}

impl Default for OutputContext {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

/// Directory that will contain `path`, or `.` for bare file names
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Write `bytes` to `path` atomically, creating the parent directory
///
/// The data lands in a temporary file next to `path` and is renamed over it
/// only after a successful write; on failure the temporary file is removed
/// and `path` is untouched.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> GammaResult<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
