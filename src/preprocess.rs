//! Series preprocessing: anomaly-aware baseline and volatility estimation

use crate::error::{ForecastError, Result};
use crate::series::{AnomalyAnnotation, HistoricalSeries, Period};
use crate::stats;
use crate::validate::ValidationWarning;
use serde::{Deserialize, Serialize};

/// Robust central estimate of historical values, anchoring growth projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Median of eligible observations
    pub value: f64,
    /// Number of observations the median was computed over
    pub eligible_count: usize,
    /// Periods removed by baseline-scoped annotations, for output metadata
    pub excluded_periods: Vec<Period>,
}

/// Distribution of month-over-month percent changes, derived fresh per
/// forecast run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityProfile {
    percent_changes: Vec<f64>,
    /// Number of eligible percent changes
    pub sample_size: usize,
    /// Number of observations removed by volatility-scoped annotations
    pub excluded_count: usize,
    /// Periods removed by volatility-scoped annotations
    pub excluded_periods: Vec<Period>,
    degraded_bound: Option<f64>,
}

impl VolatilityProfile {
    /// Percent changes in chronological order
    pub fn percent_changes(&self) -> &[f64] {
        &self.percent_changes
    }

    /// Whether this profile is the fixed-bound fallback for sparse data
    pub fn is_degraded(&self) -> bool {
        self.degraded_bound.is_some()
    }

    /// The fixed symmetric bound, when degraded
    pub fn degraded_bound(&self) -> Option<f64> {
        self.degraded_bound
    }
}

/// Configuration for the preprocessor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessorConfig {
    /// Minimum eligible percent-change count before volatility is considered
    /// insufficient
    pub min_volatility_samples: usize,
    /// Whether sparse volatility data falls back to a fixed symmetric bound
    /// instead of failing. Off by default; enabling it records a
    /// `DegradedVolatility` warning so the fallback is never silent.
    pub degraded_fallback: bool,
    /// The fixed symmetric bound used in the fallback (0.25 = ±25%)
    pub degraded_bound: f64,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            min_volatility_samples: 6,
            degraded_fallback: false,
            degraded_bound: 0.25,
        }
    }
}

/// Preprocessor turning a historical series plus annotations into a
/// baseline and volatility profile
#[derive(Debug)]
pub struct SeriesPreprocessor;

impl SeriesPreprocessor {
    /// Compute the baseline and volatility profile for one metric series.
    ///
    /// Baseline and volatility eligibility are filtered independently by
    /// annotation scope; overlapping annotations union. A percent change is
    /// excluded when either endpoint month is excluded, and changes are only
    /// formed between adjacent calendar months.
    pub fn compute(
        series: &HistoricalSeries,
        annotations: &[AnomalyAnnotation],
        config: &PreprocessorConfig,
        warnings: &mut Vec<ValidationWarning>,
    ) -> Result<(Baseline, VolatilityProfile)> {
        Self::validate_annotations(series, annotations)?;

        let baseline = Self::compute_baseline(series, annotations, warnings)?;
        let volatility = Self::compute_volatility(series, annotations, config, warnings)?;

        Ok((baseline, volatility))
    }

    /// Annotation ranges must fall within the historical span
    fn validate_annotations(
        series: &HistoricalSeries,
        annotations: &[AnomalyAnnotation],
    ) -> Result<()> {
        let Some((first, last)) = series.span() else {
            return if annotations.is_empty() {
                Ok(())
            } else {
                Err(ForecastError::InvalidConfiguration(
                    "Annotations supplied for an empty series".to_string(),
                ))
            };
        };

        for annotation in annotations {
            if annotation.start() < first || annotation.end() > last {
                return Err(ForecastError::InvalidConfiguration(format!(
                    "Annotation {}..{} falls outside the historical span {}..{}",
                    annotation.start(),
                    annotation.end(),
                    first,
                    last
                )));
            }
        }

        Ok(())
    }

    fn compute_baseline(
        series: &HistoricalSeries,
        annotations: &[AnomalyAnnotation],
        warnings: &mut Vec<ValidationWarning>,
    ) -> Result<Baseline> {
        let mut eligible = Vec::with_capacity(series.len());
        let mut excluded_periods = Vec::new();

        for obs in series.observations() {
            if Self::is_excluded(obs.period, annotations, true) {
                excluded_periods.push(obs.period);
            } else {
                eligible.push(obs.value);
            }
        }

        if eligible.is_empty() {
            return Err(ForecastError::InsufficientData(
                "No eligible observations remain for the baseline after anomaly exclusion"
                    .to_string(),
            ));
        }

        let total = series.len();
        if excluded_periods.len() * 2 > total {
            tracing::warn!(
                excluded = excluded_periods.len(),
                total,
                "more than half of the historical observations are excluded from the baseline"
            );
            warnings.push(ValidationWarning::ExcessiveExclusion {
                excluded: excluded_periods.len(),
                total,
            });
        }

        Ok(Baseline {
            value: stats::median(&eligible),
            eligible_count: eligible.len(),
            excluded_periods,
        })
    }

    fn compute_volatility(
        series: &HistoricalSeries,
        annotations: &[AnomalyAnnotation],
        config: &PreprocessorConfig,
        warnings: &mut Vec<ValidationWarning>,
    ) -> Result<VolatilityProfile> {
        let mut excluded_periods = Vec::new();
        for obs in series.observations() {
            if Self::is_excluded(obs.period, annotations, false) {
                excluded_periods.push(obs.period);
            }
        }

        let mut percent_changes = Vec::new();
        for pair in series.observations().windows(2) {
            let (prev, curr) = (pair[0], pair[1]);

            // Only adjacent calendar months form a month-over-month change
            if prev.period.succ() != curr.period {
                continue;
            }
            if excluded_periods.contains(&prev.period) || excluded_periods.contains(&curr.period)
            {
                continue;
            }
            // A zero base makes the percent change undefined; skip the pair
            // rather than propagate an infinity
            if prev.value == 0.0 {
                continue;
            }

            percent_changes.push((curr.value - prev.value) / prev.value);
        }

        let sample_size = percent_changes.len();

        if sample_size < config.min_volatility_samples {
            if !config.degraded_fallback {
                return Err(ForecastError::InsufficientData(format!(
                    "Only {} eligible percent changes for volatility (minimum {}); \
                     enable the degraded fallback to proceed with fixed bounds",
                    sample_size, config.min_volatility_samples
                )));
            }

            tracing::warn!(
                sample_size,
                min = config.min_volatility_samples,
                bound = config.degraded_bound,
                "sparse volatility data, falling back to fixed symmetric bounds"
            );
            warnings.push(ValidationWarning::DegradedVolatility {
                sample_size,
                min_samples: config.min_volatility_samples,
            });

            return Ok(VolatilityProfile {
                percent_changes: Vec::new(),
                sample_size,
                excluded_count: excluded_periods.len(),
                excluded_periods,
                degraded_bound: Some(config.degraded_bound),
            });
        }

        Ok(VolatilityProfile {
            percent_changes,
            sample_size,
            excluded_count: excluded_periods.len(),
            excluded_periods,
            degraded_bound: None,
        })
    }

    fn is_excluded(
        period: Period,
        annotations: &[AnomalyAnnotation],
        baseline_scope: bool,
    ) -> bool {
        annotations.iter().any(|a| {
            let scoped = if baseline_scope {
                a.exclude_from.excludes_baseline()
            } else {
                a.exclude_from.excludes_volatility()
            };
            scoped && a.covers(period)
        })
    }
}
