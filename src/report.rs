//! Statistics report
//!
//! ```json
//! {
//!   "all": { "count": 19200, "mean": ..., ... },
//!   "groups": { "ln_1": {...}, "ln_2": {...}, "ln_f": {...} },
//!   "layernorms": { "h.00.ln_1": {...}, ..., "ln_f": {...} }
//! }
//! ```
//!
//! Map keys are emitted in iteration order of the underlying `BTreeMap`s,
//! which for [`LayerKey`] is the canonical layer order rather than string
//! order.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::{GammaError, GammaResult};
use crate::extract::Extraction;
use crate::layer::{LayerKey, NormKind};
use crate::output::write_atomic;
use crate::stats::{concat, summarize, Summary};

/// Full report for one checkpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Every gamma value of every norm
    pub all: Summary,
    /// One summary per normalization kind
    pub groups: BTreeMap<NormKind, Summary>,
    /// One summary per layer
    pub layernorms: BTreeMap<LayerKey, Summary>,
}

/// Flattened per-group arrays plus the global pool
///
/// Shared by the report and the group histogram so both see the same values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatGroups {
    /// Concatenated arrays per kind, in report order
    pub groups: BTreeMap<NormKind, Vec<f32>>,
    /// Concatenation of all groups
    pub all: Vec<f32>,
}

impl FlatGroups {
    /// Flatten the groups of an extraction
    #[must_use]
    pub fn from_extraction(extraction: &Extraction) -> Self {
        let groups: BTreeMap<NormKind, Vec<f32>> = extraction
            .groups
            .iter()
            .map(|(kind, arrays)| (kind, concat(arrays)))
            .collect();
        let pooled: Vec<&Vec<f32>> = groups.values().collect();
        let all = concat(&pooled);
        Self { groups, all }
    }

    /// Values of one kind (empty if absent)
    #[must_use]
    pub fn get(&self, kind: NormKind) -> &[f32] {
        self.groups.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Report {
    /// Summarize an extraction
    ///
    /// # Errors
    ///
    /// Returns [`GammaError::EmptyInput`] (with the offending section named)
    /// when a group or layer holds no values, and [`GammaError::NonFinite`]
    /// when a checkpoint carries NaN/inf gammas.
    pub fn build(extraction: &Extraction, flat: &FlatGroups) -> GammaResult<Self> {
        let _guard = crate::trace_enter!("build_report");

        let all = summarize(&flat.all).map_err(|e| context("all", e))?;

        let mut groups = BTreeMap::new();
        for kind in NormKind::ALL {
            let summary = summarize(flat.get(kind)).map_err(|e| context(kind.marker(), e))?;
            groups.insert(kind, summary);
        }

        let mut layernorms = BTreeMap::new();
        for (key, values) in &extraction.layers {
            let summary = summarize(values).map_err(|e| context(&key.to_string(), e))?;
            layernorms.insert(*key, summary);
        }

        crate::trace_event!(
            total = all.count,
            layers = layernorms.len(),
            "report built"
        );

        Ok(Self {
            all,
            groups,
            layernorms,
        })
    }

    /// Pretty-printed JSON (2-space indent)
    ///
    /// # Errors
    ///
    /// Returns [`GammaError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> GammaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report to `path`, creating the parent directory
    ///
    /// The file is replaced atomically; a failed write leaves no partial
    /// JSON behind.
    ///
    /// # Errors
    ///
    /// Returns [`GammaError::Io`] if the directory or file cannot be written.
    pub fn write(&self, path: &Path) -> GammaResult<()> {
        let mut json = self.to_json()?;
        json.push('\n');
        write_atomic(path, json.as_bytes())
    }
}

fn context(section: &str, err: GammaError) -> GammaError {
    match err {
        GammaError::EmptyInput(msg) => GammaError::EmptyInput(format!("{section}: {msg}")),
        GammaError::NonFinite(msg) => GammaError::NonFinite(format!("{section}: {msg}")),
        other => other,
    }
}
