//! Statistical helpers shared by the preprocessor, interval estimator, and
//! quality scoring

use statrs::statistics::Statistics;

/// Percentile of a sorted slice by linear interpolation.
///
/// `p` is a fraction in `[0, 1]`. The rank is `p * (n - 1)`; non-integer
/// ranks interpolate linearly between the two nearest order statistics
/// (the same definition pandas and numpy use by default). The slice must
/// already be sorted ascending.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!((0.0..=1.0).contains(&p));

    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = p * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            if lo == hi {
                sorted[lo]
            } else {
                let frac = rank - lo as f64;
                sorted[lo] + (sorted[hi] - sorted[lo]) * frac
            }
        }
    }
}

/// Median of an unsorted slice. With an even count this is the average of
/// the two middle values.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    percentile_sorted(&sorted, 0.5)
}

/// Coefficient of variation (sample standard deviation / |mean|).
///
/// Returns `None` for fewer than two values or a near-zero mean, where the
/// ratio is not meaningful.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let mean = values.iter().mean();
    if mean.abs() < f64::EPSILON {
        return None;
    }

    let std_dev = values.iter().std_dev();
    Some(std_dev / mean.abs())
}
