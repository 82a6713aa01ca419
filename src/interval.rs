//! Percentile-based confidence interval estimation

use crate::error::{ForecastError, Result};
use crate::preprocess::VolatilityProfile;
use crate::stats;

/// Lowest accepted confidence level (as a fraction)
pub const MIN_CONFIDENCE_LEVEL: f64 = 0.50;
/// Highest accepted confidence level (as a fraction)
pub const MAX_CONFIDENCE_LEVEL: f64 = 0.95;

/// Estimator converting a volatility profile into lower/upper multipliers
/// for a given confidence level and horizon index
#[derive(Debug)]
pub struct ConfidenceIntervalEstimator;

impl ConfidenceIntervalEstimator {
    /// Validate a confidence level, expressed as a fraction (0.80 = 80%)
    pub fn validate_confidence_level(confidence_level: f64) -> Result<()> {
        if !(MIN_CONFIDENCE_LEVEL..=MAX_CONFIDENCE_LEVEL).contains(&confidence_level) {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Confidence level must be between {} and {}, got {}",
                MIN_CONFIDENCE_LEVEL, MAX_CONFIDENCE_LEVEL, confidence_level
            )));
        }
        Ok(())
    }

    /// Lower/upper multipliers for forecast month `horizon_index`.
    ///
    /// The confidence level maps to symmetric percentile thresholds
    /// (80% -> 10th/90th). Percentiles are taken from the sorted percent
    /// changes by linear interpolation, and the resulting multipliers scale
    /// with `sqrt(M)` to reflect compounding uncertainty over the horizon.
    ///
    /// The projector applies these as `projected * (1 - lower)` and
    /// `projected * (1 + upper)`; under skewed data a multiplier may come
    /// out negative, and the projector clips the band around the projection.
    ///
    /// A degraded profile returns its fixed symmetric bound for every month
    /// with no sqrt scaling: the fallback is a deliberately blunt,
    /// horizon-independent band.
    pub fn bounds(
        profile: &VolatilityProfile,
        confidence_level: f64,
        horizon_index: usize,
    ) -> Result<(f64, f64)> {
        Self::validate_confidence_level(confidence_level)?;

        if horizon_index == 0 {
            return Err(ForecastError::InvalidConfiguration(
                "Horizon index must be at least 1".to_string(),
            ));
        }

        if let Some(bound) = profile.degraded_bound() {
            return Ok((bound, bound));
        }

        if profile.percent_changes().is_empty() {
            return Err(ForecastError::InsufficientData(
                "Volatility profile has no percent changes".to_string(),
            ));
        }

        let p_low = (1.0 - confidence_level) / 2.0;
        let p_high = 1.0 - p_low;

        let mut sorted = profile.percent_changes().to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let low_change = stats::percentile_sorted(&sorted, p_low);
        let high_change = stats::percentile_sorted(&sorted, p_high);

        let horizon_factor = (horizon_index as f64).sqrt();

        // A 15% historical decline at the low percentile becomes a lower
        // multiplier of +0.15 before scaling
        let lower_multiplier = -low_change * horizon_factor;
        let upper_multiplier = high_change * horizon_factor;

        Ok((lower_multiplier, upper_multiplier))
    }
}
