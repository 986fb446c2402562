//! LayerNorm gamma extraction
//!
//! Walks a [`ParameterSource`] once, picks out every `<marker>.weight` tensor
//! with marker `ln_1`, `ln_2` or `ln_f`, and files its values twice:
//!
//! - into the matching group (`ln_1`, `ln_2`, `ln_f`) in discovery order
//! - into the layer buckets under its [`LayerKey`]
//!
//! Both framework-style (`transformer.h.3.ln_1.weight`) and hub-style
//! (`h.3.ln_1.weight`) names are accepted: the layer index is always the
//! segment right before the marker.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::checkpoint::ParameterSource;
use crate::error::{GammaError, GammaResult};
use crate::layer::{BlockNorm, LayerKey, NormKind};

/// Suffix segment shared by all gamma tensors
const GAMMA_SUFFIX: &str = "weight";

/// Gamma arrays per normalization kind, in discovery order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Groups {
    /// First norm of every block
    pub ln_1: Vec<Vec<f32>>,
    /// Second norm of every block
    pub ln_2: Vec<Vec<f32>>,
    /// Final norm
    pub ln_f: Vec<Vec<f32>>,
}

impl Groups {
    /// Arrays of one kind
    #[must_use]
    pub fn get(&self, kind: NormKind) -> &[Vec<f32>] {
        match kind {
            NormKind::Ln1 => &self.ln_1,
            NormKind::Ln2 => &self.ln_2,
            NormKind::LnF => &self.ln_f,
        }
    }

    fn get_mut(&mut self, kind: NormKind) -> &mut Vec<Vec<f32>> {
        match kind {
            NormKind::Ln1 => &mut self.ln_1,
            NormKind::Ln2 => &mut self.ln_2,
            NormKind::LnF => &mut self.ln_f,
        }
    }

    /// `(kind, arrays)` pairs in report order
    pub fn iter(&self) -> impl Iterator<Item = (NormKind, &[Vec<f32>])> {
        NormKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// Total number of arrays across all groups
    #[must_use]
    pub fn occurrences(&self) -> usize {
        self.ln_1.len() + self.ln_2.len() + self.ln_f.len()
    }
}

/// Gamma arrays keyed by layer, iterated in canonical layer order
pub type LayerBuckets = BTreeMap<LayerKey, Vec<f32>>;

/// Result of one pass over a model's parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Arrays grouped by normalization kind
    pub groups: Groups,
    /// Arrays keyed by individual layer
    pub layers: LayerBuckets,
}

impl Extraction {
    /// Number of block layers seen (highest block index + 1)
    ///
    /// Saturates at `usize::MAX` when the highest index is `usize::MAX`.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.layers
            .keys()
            .filter_map(|key| match key {
                LayerKey::Block { layer, .. } => Some(*layer),
                LayerKey::Final => None,
            })
            .max()
            .map_or(0, |layer| layer.saturating_add(1))
    }
}

/// Classify a parameter name
///
/// Returns `Ok(None)` for parameters that are not LayerNorm gammas.
///
/// # Errors
///
/// Returns [`GammaError::MalformedParameterName`] when a block norm marker
/// is not preceded by a parsable layer index.
pub fn classify(name: &str) -> GammaResult<Option<LayerKey>> {
    let segments: Vec<&str> = name.split('.').collect();
    let Some((&last, rest)) = segments.split_last() else {
        return Ok(None);
    };
    if last != GAMMA_SUFFIX {
        return Ok(None);
    }
    let Some((&marker, prefix)) = rest.split_last() else {
        return Ok(None);
    };
    let Some(kind) = NormKind::from_marker(marker) else {
        return Ok(None);
    };

    let Some(position) = BlockNorm::from_kind(kind) else {
        return Ok(Some(LayerKey::Final));
    };

    let index = prefix
        .last()
        .ok_or_else(|| GammaError::malformed(name, "missing layer index before norm marker"))?;
    let layer = index.parse::<usize>().map_err(|_| {
        GammaError::malformed(name, format!("layer index '{index}' is not an integer"))
    })?;

    Ok(Some(LayerKey::block(layer, position)))
}

/// Collect LayerNorm gammas from a model
///
/// Values are fetched only for matching parameters. Non-matching names are
/// skipped silently.
///
/// # Errors
///
/// - [`GammaError::MalformedParameterName`] for an unparsable layer index or
///   a layer key seen twice
/// - any error raised by the source while decoding a matched tensor
pub fn collect_ln_gammas<S>(source: &S) -> GammaResult<Extraction>
where
    S: ParameterSource + ?Sized,
{
    let _guard = crate::trace_enter!("collect_ln_gammas");
    let mut extraction = Extraction::default();

    for name in source.parameter_names() {
        let Some(key) = classify(&name)? else {
            continue;
        };

        let values = source.load_parameter(&name)?;
        crate::trace_event!(name = %name, key = %key, len = values.len(), "gamma collected");

        match extraction.layers.entry(key) {
            Entry::Occupied(_) => {
                return Err(GammaError::malformed(
                    name,
                    format!("duplicate normalization layer {key}"),
                ));
            }
            Entry::Vacant(slot) => {
                extraction.groups.get_mut(key.kind()).push(values.clone());
                slot.insert(values);
            }
        }
    }

    Ok(extraction)
}
