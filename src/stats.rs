//! Descriptive statistics over gamma arrays
//!
//! Accumulation happens in `f64`. Standard deviation is the population value
//! (denominator `n`). Percentiles interpolate linearly between the two
//! bracketing order statistics: for rank `r = p/100 * (n - 1)` the result is
//! `x[floor(r)] + (x[ceil(r)] - x[floor(r)]) * frac(r)`.

use serde::Serialize;

use crate::error::{GammaError, GammaResult};

/// Summary of one numeric array
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// Number of values
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    /// Smallest value
    pub min: f64,
    /// 10th percentile
    pub p10: f64,
    /// Median
    pub p50: f64,
    /// 90th percentile
    pub p90: f64,
    /// Largest value
    pub max: f64,
    /// Share of strictly negative values, in percent
    pub pct_negative: f64,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} mean={:.4} std={:.4} min={:.4} p10={:.4} p50={:.4} p90={:.4} max={:.4} neg={:.2}%",
            self.count,
            self.mean,
            self.std,
            self.min,
            self.p10,
            self.p50,
            self.p90,
            self.max,
            self.pct_negative
        )
    }
}

/// Summarize a non-empty array
///
/// # Errors
///
/// - [`GammaError::EmptyInput`] if `values` is empty
/// - [`GammaError::NonFinite`] if any value is NaN or infinite
#[allow(clippy::cast_precision_loss)]
pub fn summarize(values: &[f32]) -> GammaResult<Summary> {
    if values.is_empty() {
        return Err(GammaError::EmptyInput(
            "cannot summarize an empty array".to_string(),
        ));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(GammaError::NonFinite(format!(
            "array of {} values contains {bad}",
            values.len()
        )));
    }

    let mut sorted: Vec<f64> = values.iter().map(|&v| f64::from(v)).collect();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let negative = sorted.iter().take_while(|&&x| x < 0.0).count();

    Ok(Summary {
        count: sorted.len(),
        mean,
        std: variance.sqrt(),
        min: sorted[0],
        p10: percentile_sorted(&sorted, 10.0),
        p50: percentile_sorted(&sorted, 50.0),
        p90: percentile_sorted(&sorted, 90.0),
        max: sorted[sorted.len() - 1],
        pct_negative: negative as f64 / n * 100.0,
    })
}

/// Linear-interpolation percentile of ascending, non-empty data
///
/// `p` is clamped to `[0, 100]`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - rank.floor();
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Concatenate arrays into one, keeping every element exactly once
#[must_use]
pub fn concat<A: AsRef<[f32]>>(arrays: &[A]) -> Vec<f32> {
    let total = arrays.iter().map(|a| a.as_ref().len()).sum();
    let mut flat = Vec::with_capacity(total);
    for array in arrays {
        flat.extend_from_slice(array.as_ref());
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_summarize_simple() {
        let s = summarize(&[1.0, 2.0, 3.0, 4.0]).expect("non-empty");
        assert_eq!(s.count, 4);
        assert!(approx(s.mean, 2.5));
        assert!(approx(s.std, 1.25f64.sqrt()));
        assert!(approx(s.min, 1.0));
        assert!(approx(s.max, 4.0));
        assert!(approx(s.p10, 1.3));
        assert!(approx(s.p50, 2.5));
        assert!(approx(s.p90, 3.7));
        assert!(approx(s.pct_negative, 0.0));
    }

    #[test]
    fn test_pct_negative_half() {
        let s = summarize(&[-1.0, -1.0, 1.0, 1.0]).expect("non-empty");
        assert_eq!(s.pct_negative, 50.0);
    }

    #[test]
    fn test_zero_is_not_negative() {
        let s = summarize(&[0.0, -0.0, 1.0, -2.0]).expect("non-empty");
        assert_eq!(s.pct_negative, 25.0);
    }

    #[test]
    fn test_single_value() {
        let s = summarize(&[0.75]).expect("non-empty");
        assert_eq!(s.count, 1);
        assert!(approx(s.mean, 0.75));
        assert!(approx(s.std, 0.0));
        assert!(approx(s.p10, 0.75));
        assert!(approx(s.p90, 0.75));
    }

    #[test]
    fn test_unsorted_input() {
        let s = summarize(&[5.0, -3.0, 1.0]).expect("non-empty");
        assert!(approx(s.min, -3.0));
        assert!(approx(s.p50, 1.0));
        assert!(approx(s.max, 5.0));
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = summarize(&[]).expect_err("empty input");
        assert!(matches!(err, GammaError::EmptyInput(_)));
    }

    #[test]
    fn test_non_finite_rejected() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = summarize(&[1.0, bad]).expect_err("non-finite input");
            assert!(matches!(err, GammaError::NonFinite(_)));
        }
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert!(approx(percentile_sorted(&sorted, 0.0), 10.0));
        assert!(approx(percentile_sorted(&sorted, 25.0), 20.0));
        assert!(approx(percentile_sorted(&sorted, 30.0), 22.0));
        assert!(approx(percentile_sorted(&sorted, 100.0), 50.0));
    }

    #[test]
    fn test_concat_counts() {
        let layers = vec![vec![1.0f32; 768], vec![0.5f32; 768]];
        let flat = concat(&layers);
        assert_eq!(flat.len(), 1536);
        assert_eq!(summarize(&flat).expect("non-empty").count, 1536);
    }

    #[test]
    fn test_summary_serializes_fields_in_order() {
        let s = summarize(&[1.0, 2.0]).expect("non-empty");
        let json = serde_json::to_string(&s).expect("serialize");
        let fields = [
            "count", "mean", "std", "min", "p10", "p50", "p90", "max", "pct_negative",
        ];
        let positions: Vec<usize> = fields
            .iter()
            .map(|f| json.find(&format!("\"{f}\"")).expect("field present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(json.starts_with("{\"count\":2,"));
    }

    proptest! {
        #[test]
        fn prop_count_matches_and_ordered(
            values in prop::collection::vec(-10.0f32..10.0, 1..500)
        ) {
            let s = summarize(&values).expect("non-empty");
            prop_assert_eq!(s.count, values.len());
            prop_assert!(s.min <= s.p10);
            prop_assert!(s.p10 <= s.p50);
            prop_assert!(s.p50 <= s.p90);
            prop_assert!(s.p90 <= s.max);
            prop_assert!((0.0..=100.0).contains(&s.pct_negative));
            prop_assert!(s.std >= 0.0);
        }

        #[test]
        fn prop_concat_preserves_total(
            arrays in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 1..50), 1..10)
        ) {
            let total: usize = arrays.iter().map(Vec::len).sum();
            let flat = concat(&arrays);
            prop_assert_eq!(flat.len(), total);
            prop_assert_eq!(summarize(&flat).expect("non-empty").count, total);
        }
    }
}
