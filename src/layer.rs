//! Normalization layer identifiers and their ordering
//!
//! GPT-2 style transformers carry three LayerNorm kinds: `ln_1` ahead of the
//! attention sub-block, `ln_2` ahead of the MLP sub-block, and a single `ln_f`
//! after the last block. Every occurrence is identified by a [`LayerKey`]:
//!
//! ```text
//! h.00.ln_1   h.00.ln_2   h.01.ln_1   ...   h.11.ln_2   ln_f
//! ```
//!
//! The derived `Ord` on [`LayerKey`] is the canonical ordering: block index
//! ascending, `ln_1` before `ln_2` inside a block, `ln_f` last.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{GammaError, GammaResult};

/// LayerNorm position inside the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NormKind {
    /// First normalization of a block (pre-attention)
    Ln1,
    /// Second normalization of a block (pre-MLP)
    Ln2,
    /// Final normalization after the last block
    LnF,
}

impl NormKind {
    /// All kinds in report/plot order
    pub const ALL: [NormKind; 3] = [NormKind::Ln1, NormKind::Ln2, NormKind::LnF];

    /// Module name used in parameter paths and report keys
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Ln1 => "ln_1",
            Self::Ln2 => "ln_2",
            Self::LnF => "ln_f",
        }
    }

    /// Match a module name against the known markers
    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.marker() == marker)
    }
}

impl fmt::Display for NormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

impl Serialize for NormKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.marker())
    }
}

/// Position of a norm inside a block, used as the secondary sort component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockNorm {
    /// `ln_1`
    First,
    /// `ln_2`
    Second,
}

impl BlockNorm {
    /// Block position of a per-block kind, `None` for `ln_f`
    #[must_use]
    pub const fn from_kind(kind: NormKind) -> Option<Self> {
        match kind {
            NormKind::Ln1 => Some(Self::First),
            NormKind::Ln2 => Some(Self::Second),
            NormKind::LnF => None,
        }
    }

    /// Corresponding [`NormKind`]
    #[must_use]
    pub const fn kind(self) -> NormKind {
        match self {
            Self::First => NormKind::Ln1,
            Self::Second => NormKind::Ln2,
        }
    }
}

/// Identifier of one LayerNorm occurrence
///
/// Variant order matters: every `Block` sorts before `Final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKey {
    /// A norm inside transformer block `layer`
    Block {
        /// Zero-based block index
        layer: usize,
        /// Which of the two block norms
        position: BlockNorm,
    },
    /// The final norm
    Final,
}

impl LayerKey {
    /// Build the key for a block norm
    #[must_use]
    pub const fn block(layer: usize, position: BlockNorm) -> Self {
        Self::Block { layer, position }
    }

    /// Norm kind of this occurrence
    #[must_use]
    pub const fn kind(&self) -> NormKind {
        match self {
            Self::Block { position, .. } => position.kind(),
            Self::Final => NormKind::LnF,
        }
    }

    /// Tuple sort key `(is_final, layer, position)`
    ///
    /// Equivalent to the derived `Ord`; exposed for callers holding keys as
    /// strings (see [`sort_key`]).
    #[must_use]
    pub const fn sort_key(&self) -> (u8, usize, u8) {
        match self {
            Self::Block { layer, position } => (0, *layer, *position as u8),
            Self::Final => (1, 0, 0),
        }
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block { layer, position } => write!(f, "h.{layer:02}.{}", position.kind()),
            Self::Final => f.write_str(NormKind::LnF.marker()),
        }
    }
}

impl FromStr for LayerKey {
    type Err = GammaError;

    fn from_str(s: &str) -> GammaResult<Self> {
        if s == NormKind::LnF.marker() {
            return Ok(Self::Final);
        }

        let parts: Vec<&str> = s.split('.').collect();
        let [prefix, index, marker] = parts.as_slice() else {
            return Err(GammaError::malformed(s, "expected h.<index>.<ln_1|ln_2>"));
        };
        if *prefix != "h" {
            return Err(GammaError::malformed(s, "layer key must start with 'h.'"));
        }
        let layer = index
            .parse::<usize>()
            .map_err(|_| GammaError::malformed(s, format!("invalid layer index '{index}'")))?;
        let position = match NormKind::from_marker(marker) {
            Some(NormKind::Ln1) => BlockNorm::First,
            Some(NormKind::Ln2) => BlockNorm::Second,
            _ => return Err(GammaError::malformed(s, format!("unknown norm '{marker}'"))),
        };
        Ok(Self::block(layer, position))
    }
}

impl Serialize for LayerKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Sort key for a layer key given as a string
///
/// # Errors
///
/// Returns [`GammaError::MalformedParameterName`] if the key is neither
/// `ln_f` nor `h.<index>.<ln_1|ln_2>`.
pub fn sort_key(key: &str) -> GammaResult<(u8, usize, u8)> {
    key.parse::<LayerKey>().map(|k| k.sort_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Formatting
    // -------------------------------------------------------------------------

    #[test]
    fn test_display_pads_layer_index() {
        assert_eq!(LayerKey::block(0, BlockNorm::First).to_string(), "h.00.ln_1");
        assert_eq!(LayerKey::block(7, BlockNorm::Second).to_string(), "h.07.ln_2");
        assert_eq!(LayerKey::block(11, BlockNorm::First).to_string(), "h.11.ln_1");
        assert_eq!(LayerKey::block(123, BlockNorm::Second).to_string(), "h.123.ln_2");
        assert_eq!(LayerKey::Final.to_string(), "ln_f");
    }

    #[test]
    fn test_parse_roundtrips_display() {
        for key in [
            LayerKey::block(3, BlockNorm::First),
            LayerKey::block(47, BlockNorm::Second),
            LayerKey::Final,
        ] {
            let parsed: LayerKey = key.to_string().parse().expect("key should parse");
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["h.ln_1", "h.x1.ln_1", "h.01.ln_3", "blocks.01.ln_1", "", "ln_g"] {
            let err = bad.parse::<LayerKey>().expect_err("malformed key should fail");
            assert!(matches!(err, GammaError::MalformedParameterName { .. }), "{bad}");
        }
    }

    // -------------------------------------------------------------------------
    // Ordering
    // -------------------------------------------------------------------------

    #[test]
    fn test_ordering_two_blocks() {
        let mut keys = vec![
            LayerKey::Final,
            LayerKey::block(1, BlockNorm::Second),
            LayerKey::block(0, BlockNorm::Second),
            LayerKey::block(1, BlockNorm::First),
            LayerKey::block(0, BlockNorm::First),
        ];
        keys.sort();
        let names: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["h.00.ln_1", "h.00.ln_2", "h.01.ln_1", "h.01.ln_2", "ln_f"]);
    }

    #[test]
    fn test_numeric_not_lexicographic_order() {
        let mut keys = vec![
            LayerKey::block(100, BlockNorm::First),
            LayerKey::block(11, BlockNorm::First),
            LayerKey::block(2, BlockNorm::First),
        ];
        keys.sort();
        assert_eq!(
            keys,
            [
                LayerKey::block(2, BlockNorm::First),
                LayerKey::block(11, BlockNorm::First),
                LayerKey::block(100, BlockNorm::First),
            ]
        );
    }

    #[test]
    fn test_final_sorts_last() {
        let last_block = LayerKey::block(usize::MAX, BlockNorm::Second);
        assert!(last_block < LayerKey::Final);
    }

    #[test]
    fn test_string_sort_key_matches_ord() {
        let mut names = vec!["ln_f", "h.01.ln_2", "h.00.ln_2", "h.01.ln_1", "h.00.ln_1"];
        names.sort_by_key(|name| sort_key(name).expect("valid key"));
        assert_eq!(names, ["h.00.ln_1", "h.00.ln_2", "h.01.ln_1", "h.01.ln_2", "ln_f"]);
    }

    #[test]
    fn test_sort_key_values() {
        assert_eq!(sort_key("ln_f").expect("valid"), (1, 0, 0));
        assert_eq!(sort_key("h.05.ln_1").expect("valid"), (0, 5, 0));
        assert_eq!(sort_key("h.05.ln_2").expect("valid"), (0, 5, 1));
    }

    #[test]
    fn test_norm_kind_markers() {
        assert_eq!(NormKind::from_marker("ln_2"), Some(NormKind::Ln2));
        assert_eq!(NormKind::from_marker("ln_3"), None);
        assert_eq!(BlockNorm::from_kind(NormKind::Ln2), Some(BlockNorm::Second));
        assert_eq!(BlockNorm::from_kind(NormKind::LnF), None);
        assert_eq!(LayerKey::Final.kind(), NormKind::LnF);
    }
}
