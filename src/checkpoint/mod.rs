//! Checkpoint access
//!
//! A checkpoint is anything that can list named parameters and hand back a
//! parameter's values as a flat `f32` array. The extractor only talks to the
//! [`ParameterSource`] trait, so unit tests can drive it with an in-memory
//! `[Parameter]` slice while the CLI feeds it a safetensors file.
//!
//! # Supported dtypes
//!
//! `F32`, `F16`, `BF16` and `F64` tensors decode to `f32`. Anything else is a
//! [`GammaError::Format`] when (and only when) the tensor is actually read.

pub mod loader;

use safetensors::{Dtype, SafeTensors};

use crate::error::{GammaError, GammaResult};

pub use loader::{load_checkpoint, CheckpointFile, CheckpointSpec};

/// One named parameter with its values flattened to host `f32`
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Dot-delimited hierarchical path, e.g. `h.0.ln_1.weight`
    pub name: String,
    /// Flattened values
    pub values: Vec<f32>,
}

impl Parameter {
    /// Create a new parameter
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Read-only view over a model's named parameters
pub trait ParameterSource {
    /// Parameter names in discovery order
    fn parameter_names(&self) -> Vec<String>;

    /// Values of the named parameter as a flat `f32` array
    ///
    /// # Errors
    ///
    /// Fails if the parameter is missing or cannot be decoded.
    fn load_parameter(&self, name: &str) -> GammaResult<Vec<f32>>;
}

impl ParameterSource for [Parameter] {
    fn parameter_names(&self) -> Vec<String> {
        self.iter().map(|p| p.name.clone()).collect()
    }

    fn load_parameter(&self, name: &str) -> GammaResult<Vec<f32>> {
        self.iter()
            .find(|p| p.name == name)
            .map(|p| p.values.clone())
            .ok_or_else(|| GammaError::NotFound(format!("parameter '{name}'")))
    }
}

impl ParameterSource for Vec<Parameter> {
    fn parameter_names(&self) -> Vec<String> {
        self.as_slice().parameter_names()
    }

    fn load_parameter(&self, name: &str) -> GammaResult<Vec<f32>> {
        self.as_slice().load_parameter(name)
    }
}

/// Parsed safetensors payload borrowing the raw file bytes
pub struct SafeTensorsCheckpoint<'data> {
    tensors: SafeTensors<'data>,
}

impl<'data> SafeTensorsCheckpoint<'data> {
    /// Parse the safetensors header
    ///
    /// # Errors
    ///
    /// Returns [`GammaError::Format`] if the bytes are not a valid safetensors file.
    pub fn parse(bytes: &'data [u8]) -> GammaResult<Self> {
        let tensors = SafeTensors::deserialize(bytes)
            .map_err(|e| GammaError::Format(format!("invalid safetensors payload: {e}")))?;
        Ok(Self { tensors })
    }

    /// Number of tensors in the file
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Whether the file holds no tensors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}

impl ParameterSource for SafeTensorsCheckpoint<'_> {
    /// Names sorted lexicographically; safetensors headers carry no order
    fn parameter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tensors
            .names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        names.sort();
        names
    }

    fn load_parameter(&self, name: &str) -> GammaResult<Vec<f32>> {
        let view = self
            .tensors
            .tensor(name)
            .map_err(|e| GammaError::Format(format!("tensor '{name}': {e}")))?;
        decode_f32(name, view.dtype(), view.data())
    }
}

/// Convert little-endian tensor bytes to `f32`
///
/// # Errors
///
/// Returns [`GammaError::Format`] for dtypes other than F32/F16/BF16/F64.
pub fn decode_f32(name: &str, dtype: Dtype, data: &[u8]) -> GammaResult<Vec<f32>> {
    let values = match dtype {
        Dtype::F32 => data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
        Dtype::F16 => data
            .chunks_exact(2)
            .map(|b| half::f16::from_le_bytes([b[0], b[1]]).to_f32())
            .collect(),
        Dtype::BF16 => data
            .chunks_exact(2)
            .map(|b| half::bf16::from_le_bytes([b[0], b[1]]).to_f32())
            .collect(),
        #[allow(clippy::cast_possible_truncation)]
        Dtype::F64 => data
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect(),
        other => {
            return Err(GammaError::Format(format!(
                "tensor '{name}' has unsupported dtype {other:?}"
            )))
        }
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetensors::tensor::TensorView;

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_f32() {
        let bytes = f32_bytes(&[1.0, -0.5, 2.25]);
        let values = decode_f32("w", Dtype::F32, &bytes).expect("f32 should decode");
        assert_eq!(values, vec![1.0, -0.5, 2.25]);
    }

    #[test]
    fn test_decode_f16_and_bf16() {
        let f16: Vec<u8> = [1.0f32, -2.0]
            .iter()
            .flat_map(|v| half::f16::from_f32(*v).to_le_bytes())
            .collect();
        assert_eq!(
            decode_f32("w", Dtype::F16, &f16).expect("f16 should decode"),
            vec![1.0, -2.0]
        );

        let bf16: Vec<u8> = [0.5f32, 4.0]
            .iter()
            .flat_map(|v| half::bf16::from_f32(*v).to_le_bytes())
            .collect();
        assert_eq!(
            decode_f32("w", Dtype::BF16, &bf16).expect("bf16 should decode"),
            vec![0.5, 4.0]
        );
    }

    #[test]
    fn test_decode_f64() {
        let bytes: Vec<u8> = [0.25f64, 8.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        assert_eq!(
            decode_f32("w", Dtype::F64, &bytes).expect("f64 should decode"),
            vec![0.25, 8.0]
        );
    }

    #[test]
    fn test_decode_unsupported_dtype() {
        let err = decode_f32("h.0.ln_1.weight", Dtype::I64, &[0u8; 8])
            .expect_err("i64 should be rejected");
        assert!(matches!(err, GammaError::Format(_)));
        assert!(err.to_string().contains("h.0.ln_1.weight"));
    }

    #[test]
    fn test_in_memory_source() {
        let params = vec![
            Parameter::new("wte.weight", vec![0.0; 4]),
            Parameter::new("ln_f.weight", vec![1.0, 2.0]),
        ];
        assert_eq!(params.parameter_names(), ["wte.weight", "ln_f.weight"]);
        assert_eq!(
            params.load_parameter("ln_f.weight").expect("present"),
            vec![1.0, 2.0]
        );
        assert!(matches!(
            params.load_parameter("missing"),
            Err(GammaError::NotFound(_))
        ));
    }

    #[test]
    fn test_safetensors_source() {
        let ln = f32_bytes(&[1.0, 0.9, 1.1]);
        let wte = f32_bytes(&[0.0; 6]);
        let tensors = vec![
            (
                "wte.weight",
                TensorView::new(Dtype::F32, vec![2, 3], &wte).expect("valid view"),
            ),
            (
                "h.0.ln_1.weight",
                TensorView::new(Dtype::F32, vec![3], &ln).expect("valid view"),
            ),
        ];
        let bytes = safetensors::serialize(tensors.iter().map(|(k, v)| (*k, v)), None)
            .expect("serialize should succeed");

        let checkpoint = SafeTensorsCheckpoint::parse(&bytes).expect("parse should succeed");
        assert_eq!(checkpoint.len(), 2);
        assert!(!checkpoint.is_empty());
        assert_eq!(
            checkpoint.parameter_names(),
            ["h.0.ln_1.weight", "wte.weight"]
        );
        assert_eq!(
            checkpoint
                .load_parameter("h.0.ln_1.weight")
                .expect("tensor should load"),
            vec![1.0, 0.9, 1.1]
        );
        assert!(matches!(
            checkpoint.load_parameter("ln_f.weight"),
            Err(GammaError::Format(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = SafeTensorsCheckpoint::parse(b"not a safetensors file")
            .err()
            .expect("garbage should be rejected");
        assert!(matches!(err, GammaError::Format(_)));
    }
}
