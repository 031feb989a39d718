/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Computes the `q`-quantile (0.0–1.0) of already sorted values using linear
/// interpolation between the two closest ranks. Returns `None` for empty input.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    if lo == hi || frac == 0.0 {
        return Some(sorted[lo]);
    }
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Tukey fences: `(Q1 - 1.5·IQR, Q3 + 1.5·IQR)`.
///
/// A fence is NaN when interpolation runs between two infinite values.
pub fn iqr_bounds(values: &[f64]) -> Option<(f64, f64)> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile_sorted(&sorted, 0.25)?;
    let q3 = quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - 1.5 * iqr, q3 + 1.5 * iqr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_values() {
        assert_eq!(mean(&[10.0, 30.0]), Some(20.0));
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&sorted, 0.75), Some(3.25));
    }

    #[test]
    fn test_quantile_single_value() {
        assert_eq!(quantile_sorted(&[7.0], 0.25), Some(7.0));
    }

    #[test]
    fn test_quantile_on_exact_rank_keeps_infinity() {
        assert_eq!(quantile_sorted(&[1.0, f64::INFINITY], 1.0), Some(f64::INFINITY));
    }

    #[test]
    fn test_iqr_bounds_between_infinities_is_nan() {
        let (lower, upper) = iqr_bounds(&[1.0, 2.0, f64::INFINITY, f64::INFINITY]).unwrap();
        assert!(lower.is_nan());
        assert!(upper.is_nan());
    }

    #[test]
    fn test_iqr_bounds_unsorted_input() {
        // Q1 = 2, Q3 = 4, IQR = 2
        let (lower, upper) = iqr_bounds(&[5.0, 1.0, 4.0, 2.0, 3.0]).unwrap();
        assert_eq!(lower, -1.0);
        assert_eq!(upper, 7.0);
    }
}
