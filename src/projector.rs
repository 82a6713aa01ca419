//! Compound-growth projection with confidence bands, timing lag, and
//! discrete event integration

use crate::error::{ForecastError, Result};
use crate::interval::ConfidenceIntervalEstimator;
use crate::preprocess::{Baseline, VolatilityProfile};
use crate::scenario::{CashEvent, ExternalAdjustment};
use crate::validate::ValidationWarning;
use serde::{Deserialize, Serialize};

/// One forecast month: lower/projected/upper band values.
///
/// `lower <= projected <= upper` is enforced at construction and can never
/// be inverted afterwards; fields are only reachable through accessors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    month_index: usize,
    lower: f64,
    projected: f64,
    upper: f64,
}

impl ForecastPoint {
    /// Create a point, failing with `IntervalIntegrity` when the band is
    /// inverted
    pub fn new(month_index: usize, lower: f64, projected: f64, upper: f64) -> Result<Self> {
        if lower > projected || projected > upper {
            return Err(ForecastError::IntervalIntegrity(format!(
                "Month {}: lower={}, projected={}, upper={}",
                month_index, lower, projected, upper
            )));
        }

        Ok(Self {
            month_index,
            lower,
            projected,
            upper,
        })
    }

    /// Create a point, clipping the band so it always brackets the
    /// projection. Used where multipliers may legitimately come out
    /// inverted (skewed percentile data).
    pub fn clipped(month_index: usize, lower: f64, projected: f64, upper: f64) -> Self {
        Self {
            month_index,
            lower: lower.min(projected),
            projected,
            upper: upper.max(projected),
        }
    }

    pub fn month_index(&self) -> usize {
        self.month_index
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn projected(&self) -> f64 {
        self.projected
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }
}

/// Ordered three-band forecast for one metric, one point per forecast month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    /// Build a series from points, validating month indices run 1..=horizon
    pub fn from_points(points: Vec<ForecastPoint>) -> Result<Self> {
        for (i, point) in points.iter().enumerate() {
            if point.month_index != i + 1 {
                return Err(ForecastError::InvalidConfiguration(format!(
                    "Forecast month indices must run 1..=horizon, found {} at position {}",
                    point.month_index, i
                )));
            }
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point for a 1-based forecast month, if within the horizon
    pub fn get(&self, month_index: usize) -> Option<&ForecastPoint> {
        month_index
            .checked_sub(1)
            .and_then(|i| self.points.get(i))
    }

    /// Projected values in month order
    pub fn projected_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.projected).collect()
    }
}

/// Operating inflows that land beyond the forecast horizon because of the
/// collection lag
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UncollectedSpillover {
    pub lower: f64,
    pub projected: f64,
    pub upper: f64,
}

impl UncollectedSpillover {
    pub fn is_zero(&self) -> bool {
        self.lower == 0.0 && self.projected == 0.0 && self.upper == 0.0
    }
}

/// Projector applying compound monthly growth to a baseline and combining
/// it with the interval estimator into a three-band series
#[derive(Debug)]
pub struct GrowthProjector;

impl GrowthProjector {
    /// Project `baseline * (1 + growth_rate)^M` for `M in 1..=horizon`, with
    /// percentile bounds scaled by `sqrt(M)`.
    ///
    /// Bounds are clipped so `lower <= projected <= upper` holds even under
    /// unusual multiplier values or a negative baseline.
    pub fn project(
        baseline: &Baseline,
        growth_rate: f64,
        horizon: usize,
        profile: &VolatilityProfile,
        confidence_level: f64,
    ) -> Result<ForecastSeries> {
        if horizon == 0 {
            return Err(ForecastError::InvalidConfiguration(
                "Forecast horizon must be at least 1 month".to_string(),
            ));
        }
        if growth_rate >= 1.0 {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Monthly growth rate of {} (100%+) is not accepted",
                growth_rate
            )));
        }

        let mut points = Vec::with_capacity(horizon);
        for month in 1..=horizon {
            let projected = baseline.value * (1.0 + growth_rate).powi(month as i32);
            let (lower_multiplier, upper_multiplier) =
                ConfidenceIntervalEstimator::bounds(profile, confidence_level, month)?;

            let lower = projected * (1.0 - lower_multiplier);
            let upper = projected * (1.0 + upper_multiplier);

            points.push(ForecastPoint::clipped(month, lower, projected, upper));
        }

        ForecastSeries::from_points(points)
    }

    /// Redistribute each month's inflow forward by the collection period.
    ///
    /// Whole 30-day blocks shift the amount by full months; the remainder
    /// splits linearly between the target month and the next
    /// (`lag_fraction = (days % 30) / 30`). Applied identically to all three
    /// bands, after growth and before events. Amounts pushed past the
    /// horizon accumulate in the returned spillover.
    pub fn apply_collection_lag(
        series: &mut ForecastSeries,
        collection_period_days: u32,
        warnings: &mut Vec<ValidationWarning>,
    ) -> UncollectedSpillover {
        let mut spillover = UncollectedSpillover::default();

        if collection_period_days == 0 || series.is_empty() {
            return spillover;
        }

        if collection_period_days > 90 {
            warnings.push(ValidationWarning::UnusualCollectionPeriod {
                days: collection_period_days,
            });
        }

        let horizon = series.len();
        let full_months = (collection_period_days / 30) as usize;
        let lag_fraction = f64::from(collection_period_days % 30) / 30.0;

        let mut lower = vec![0.0; horizon];
        let mut projected = vec![0.0; horizon];
        let mut upper = vec![0.0; horizon];

        for point in series.points() {
            let target = point.month_index() + full_months;

            let mut deposit = |month: usize, share: f64| {
                if share == 0.0 {
                    return;
                }
                if month <= horizon {
                    lower[month - 1] += point.lower() * share;
                    projected[month - 1] += point.projected() * share;
                    upper[month - 1] += point.upper() * share;
                } else {
                    spillover.lower += point.lower() * share;
                    spillover.projected += point.projected() * share;
                    spillover.upper += point.upper() * share;
                }
            };

            deposit(target, 1.0 - lag_fraction);
            deposit(target + 1, lag_fraction);
        }

        let points = (1..=horizon)
            .map(|m| ForecastPoint::clipped(m, lower[m - 1], projected[m - 1], upper[m - 1]))
            .collect();

        // Month indices are untouched, so reconstruction cannot fail
        *series = ForecastSeries { points };

        spillover
    }

    /// Add planned cash events to their target months.
    ///
    /// Events are known amounts, so they shift lower/projected/upper
    /// identically and preserve the band width around the shifted center.
    /// Events beyond the horizon are reported, never silently dropped.
    pub fn apply_events(
        series: &mut ForecastSeries,
        events: &[CashEvent],
        warnings: &mut Vec<ValidationWarning>,
    ) {
        let horizon = series.len();

        for event in events {
            if event.month == 0 || event.month > horizon {
                warnings.push(ValidationWarning::EventBeyondHorizon {
                    month: event.month,
                    horizon,
                    amount: event.amount,
                });
                continue;
            }

            let point = series.points[event.month - 1];
            series.points[event.month - 1] = ForecastPoint {
                month_index: point.month_index,
                lower: point.lower + event.amount,
                projected: point.projected + event.amount,
                upper: point.upper + event.amount,
            };
        }
    }

    /// Apply a one-month percentage adjustment to the series.
    ///
    /// The factor multiplies all three bands, so it must be positive to
    /// preserve band ordering.
    pub fn apply_adjustment(
        series: &mut ForecastSeries,
        adjustment: &ExternalAdjustment,
        warnings: &mut Vec<ValidationWarning>,
    ) -> Result<()> {
        let factor = adjustment.factor();
        if factor <= 0.0 {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Adjustment factor must be positive, got {}",
                factor
            )));
        }

        let horizon = series.len();
        if adjustment.month == 0 || adjustment.month > horizon {
            warnings.push(ValidationWarning::AdjustmentBeyondHorizon {
                month: adjustment.month,
                horizon,
            });
            return Ok(());
        }

        let point = series.points[adjustment.month - 1];
        series.points[adjustment.month - 1] = ForecastPoint {
            month_index: point.month_index,
            lower: point.lower * factor,
            projected: point.projected * factor,
            upper: point.upper * factor,
        };

        Ok(())
    }

    /// Cumulative cash position from a starting balance and the monthly net
    /// changes of the given sections, per band.
    ///
    /// Continuity holds per band: `ending[M] = ending[M-1] + net_change[M]`.
    pub fn accumulate_cash(
        starting_cash: f64,
        sections: &[&ForecastSeries],
    ) -> Result<ForecastSeries> {
        let horizon = sections.first().map_or(0, |s| s.len());
        if sections.iter().any(|s| s.len() != horizon) {
            return Err(ForecastError::InvalidConfiguration(
                "All cash-flow sections must share one horizon".to_string(),
            ));
        }

        let mut lower = starting_cash;
        let mut projected = starting_cash;
        let mut upper = starting_cash;

        let mut points = Vec::with_capacity(horizon);
        for month in 1..=horizon {
            for section in sections {
                let point = &section.points[month - 1];
                lower += point.lower();
                projected += point.projected();
                upper += point.upper();
            }
            points.push(ForecastPoint::new(month, lower, projected, upper)?);
        }

        ForecastSeries::from_points(points)
    }
}

/// Margin metrics derived arithmetically from projected values only,
/// per month. Percentages are in percent units (12.5 = 12.5%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginPoint {
    pub month_index: usize,
    pub gross_profit: f64,
    pub gross_margin_pct: f64,
    pub operating_income: f64,
    pub operating_margin_pct: f64,
    /// No tax or interest modeling; net income equals operating income
    pub net_income: f64,
}

/// Derive per-month margins from projected (not bound) P&L values.
/// Margin percentages are zero when projected revenue is not positive.
pub fn derive_margins(
    revenue: &ForecastSeries,
    cogs: Option<&ForecastSeries>,
    expenses: &ForecastSeries,
) -> Vec<MarginPoint> {
    revenue
        .points()
        .iter()
        .map(|rev| {
            let month = rev.month_index();
            let income = rev.projected();
            let cogs_value = cogs
                .and_then(|s| s.get(month))
                .map_or(0.0, |p| p.projected());
            let expense_value = expenses.get(month).map_or(0.0, |p| p.projected());

            let gross_profit = income - cogs_value;
            let operating_income = gross_profit - expense_value;

            let (gross_margin_pct, operating_margin_pct) = if income > 0.0 {
                (
                    gross_profit / income * 100.0,
                    operating_income / income * 100.0,
                )
            } else {
                (0.0, 0.0)
            };

            MarginPoint {
                month_index: month,
                gross_profit,
                gross_margin_pct,
                operating_income,
                operating_margin_pct,
                net_income: operating_income,
            }
        })
        .collect()
}
