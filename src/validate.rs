//! Reasonability validation and forecast quality assessment

use crate::error::{ForecastError, Result};
use crate::orchestrator::{DataProfile, ForecastResult};
use crate::projector::ForecastSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-fatal findings returned alongside a successful forecast. The caller
/// decides how to present them; none of these abort a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// Projected ending cash goes negative
    Liquidity { month: usize, amount: f64 },
    /// Projected cash covers fewer months of burn than the threshold
    Runway {
        runway_months: usize,
        threshold_months: usize,
    },
    /// Projected revenue growth stays above the cap for several months
    UnrealisticGrowth { months: usize, rate_cap: f64 },
    /// Operating margin fell from the first forecast month by more than the
    /// threshold
    MarginDecline {
        month: usize,
        decline_pp: f64,
        threshold_pp: f64,
    },
    /// Expenses grew faster than revenue for several consecutive months
    MarginCompression { months: usize, threshold: usize },
    /// A scenario assumes an unusually aggressive monthly rate
    HighGrowthAssumption { category: String, rate: f64 },
    /// A planned cash event targets a month past the horizon
    EventBeyondHorizon {
        month: usize,
        horizon: usize,
        amount: f64,
    },
    /// An external adjustment targets a month past the horizon
    AdjustmentBeyondHorizon { month: usize, horizon: usize },
    /// Sparse volatility data, fixed fallback bounds in use
    DegradedVolatility {
        sample_size: usize,
        min_samples: usize,
    },
    /// More than half of the historical observations were excluded
    ExcessiveExclusion { excluded: usize, total: usize },
    /// Collection period longer than 90 days
    UnusualCollectionPeriod { days: u32 },
    /// No cost-of-goods-sold series supplied (service business)
    MissingCostOfGoods,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Liquidity { month, amount } => write!(
                f,
                "Negative projected cash of {:.2} in month {}",
                amount, month
            ),
            Self::Runway {
                runway_months,
                threshold_months,
            } => write!(
                f,
                "Cash runway of {} months is below the {}-month threshold; \
                 monitor burn rate and plan for financing",
                runway_months, threshold_months
            ),
            Self::UnrealisticGrowth { months, rate_cap } => write!(
                f,
                "Projected revenue growth above {:.0}% monthly for {} consecutive months; \
                 verify assumptions",
                rate_cap * 100.0,
                months
            ),
            Self::MarginDecline {
                month,
                decline_pp,
                threshold_pp,
            } => write!(
                f,
                "Operating margin declined {:.1}pp by month {} (threshold {:.1}pp); \
                 investigate cost drivers",
                decline_pp, month, threshold_pp
            ),
            Self::MarginCompression { months, threshold } => write!(
                f,
                "Expenses growing faster than revenue for {} consecutive months \
                 (threshold {}); review cost structure",
                months, threshold
            ),
            Self::HighGrowthAssumption { category, rate } => write!(
                f,
                "Monthly {} rate of {:.1}% is unusual for stable businesses",
                category,
                rate * 100.0
            ),
            Self::EventBeyondHorizon {
                month,
                horizon,
                amount,
            } => write!(
                f,
                "Planned cash event of {:.2} in month {} is beyond the {}-month horizon",
                amount, month, horizon
            ),
            Self::AdjustmentBeyondHorizon { month, horizon } => write!(
                f,
                "External adjustment in month {} is beyond the {}-month horizon",
                month, horizon
            ),
            Self::DegradedVolatility {
                sample_size,
                min_samples,
            } => write!(
                f,
                "Only {} eligible percent changes (minimum {}); using fixed fallback bounds",
                sample_size, min_samples
            ),
            Self::ExcessiveExclusion { excluded, total } => write!(
                f,
                "{} of {} historical observations excluded by anomaly annotations",
                excluded, total
            ),
            Self::UnusualCollectionPeriod { days } => {
                write!(f, "Collection period of {} days is unusual (>90 days)", days)
            }
            Self::MissingCostOfGoods => {
                write!(f, "No cost-of-goods-sold series; COGS treated as zero")
            }
        }
    }
}

/// Configurable parameters for the validation checks, passed explicitly into
/// each call so tests can use distinct values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationThresholds {
    /// Minimum acceptable cash runway in months
    pub runway_months: usize,
    /// Monthly revenue growth rate cap
    pub growth_cap: f64,
    /// Consecutive months above the cap before warning
    pub sustained_growth_months: usize,
    /// Operating margin decline threshold in percentage points
    pub margin_decline_pp: f64,
    /// Consecutive compression months before warning
    pub margin_compression_months: usize,
    /// Revenue base below which growth checks are skipped (small bases
    /// produce false positives)
    pub small_revenue_base: f64,
    /// Coefficient-of-variation boundary between low and medium volatility
    pub volatility_low: f64,
    /// Coefficient-of-variation boundary between medium and high volatility
    pub volatility_high: f64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            runway_months: 3,
            growth_cap: 0.30,
            sustained_growth_months: 3,
            margin_decline_pp: 10.0,
            margin_compression_months: 2,
            small_revenue_base: 1000.0,
            volatility_low: 0.3,
            volatility_high: 0.7,
        }
    }
}

/// Coarse forecast quality indicator. A tier rather than a numeric score:
/// the inputs (sample size, volatility, exclusions) are heterogeneous and
/// not independently calibrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// Post-processing validator over a completed forecast. Pure: it never
/// mutates the result.
#[derive(Debug)]
pub struct ForecastValidator;

impl ForecastValidator {
    /// Run the reasonability checks, each producing zero or one warning.
    ///
    /// A crossed confidence band (`lower > projected` or
    /// `projected > upper`) is a defect in the projection math, not a
    /// business finding, and fails with `IntervalIntegrity`.
    pub fn validate(
        result: &ForecastResult,
        thresholds: &ValidationThresholds,
    ) -> Result<Vec<ValidationWarning>> {
        Self::check_interval_integrity(result)?;

        let mut warnings = Vec::new();

        if let Some(warning) = Self::check_liquidity(result) {
            warnings.push(warning);
        }
        if let Some(warning) = Self::check_runway(result, thresholds) {
            warnings.push(warning);
        }
        if let Some(warning) = Self::check_sustained_growth(result, thresholds) {
            warnings.push(warning);
        }
        if let Some(warning) = Self::check_margin_decline(result, thresholds) {
            warnings.push(warning);
        }
        if let Some(warning) = Self::check_margin_compression(result, thresholds) {
            warnings.push(warning);
        }

        Ok(warnings)
    }

    /// Coarse quality tier from the run's data profile: eligible sample
    /// size, volatility magnitude, and excluded-period count, combined as a
    /// weighted score (0.5/0.3/0.2) and mapped to tiers at 70 and 40.
    pub fn quality(profile: &DataProfile, thresholds: &ValidationThresholds) -> QualityTier {
        if profile.eligible_months == 0 {
            return QualityTier::Low;
        }

        let data_score = ((profile.eligible_months as f64 / 24.0) * 100.0).min(100.0);

        let consistency_score = match profile.value_cv {
            Some(cv) if cv < thresholds.volatility_low => 100.0,
            Some(cv) if cv < thresholds.volatility_high => 50.0,
            _ => 0.0,
        };

        let anomaly_score = (100.0 - profile.excluded_periods.len() as f64 * 20.0).max(0.0);

        let score = data_score * 0.5 + consistency_score * 0.3 + anomaly_score * 0.2;

        if score >= 70.0 {
            QualityTier::High
        } else if score >= 40.0 {
            QualityTier::Medium
        } else {
            QualityTier::Low
        }
    }

    fn check_interval_integrity(result: &ForecastResult) -> Result<()> {
        let mut series: Vec<(&str, &ForecastSeries)> = vec![
            ("operating", &result.cash_flow.operating),
            ("investing", &result.cash_flow.investing),
            ("financing", &result.cash_flow.financing),
            ("ending_cash", &result.cash_flow.ending_cash),
            ("revenue", &result.pl.revenue),
            ("expenses", &result.pl.expenses),
        ];
        if let Some(cogs) = &result.pl.cogs {
            series.push(("cogs", cogs));
        }

        for (name, s) in series {
            for point in s.points() {
                if point.lower() > point.projected() || point.projected() > point.upper() {
                    return Err(ForecastError::IntervalIntegrity(format!(
                        "{} month {}: lower={}, projected={}, upper={}",
                        name,
                        point.month_index(),
                        point.lower(),
                        point.projected(),
                        point.upper()
                    )));
                }
            }
        }

        Ok(())
    }

    fn check_liquidity(result: &ForecastResult) -> Option<ValidationWarning> {
        result
            .cash_flow
            .ending_cash
            .points()
            .iter()
            .find(|p| p.projected() < 0.0)
            .map(|p| ValidationWarning::Liquidity {
                month: p.month_index(),
                amount: p.projected(),
            })
    }

    fn check_runway(
        result: &ForecastResult,
        thresholds: &ValidationThresholds,
    ) -> Option<ValidationWarning> {
        let ending = &result.cash_flow.ending_cash;
        if ending.is_empty() {
            return None;
        }

        // Mean monthly net change over the horizon; a negative mean is the
        // burn rate
        let starting_cash = result.cash_flow.starting_cash;
        let final_cash = ending.points().last()?.projected();
        let mean_change = (final_cash - starting_cash) / ending.len() as f64;

        if mean_change >= 0.0 {
            return None;
        }

        let runway_months = if starting_cash <= 0.0 {
            0
        } else {
            (starting_cash / -mean_change).floor() as usize
        };

        if runway_months < thresholds.runway_months {
            Some(ValidationWarning::Runway {
                runway_months,
                threshold_months: thresholds.runway_months,
            })
        } else {
            None
        }
    }

    fn check_sustained_growth(
        result: &ForecastResult,
        thresholds: &ValidationThresholds,
    ) -> Option<ValidationWarning> {
        let revenue = result.pl.revenue.projected_values();
        let mut consecutive = 0;

        for pair in revenue.windows(2) {
            let (previous, current) = (pair[0], pair[1]);

            // Small bases create false positives
            if previous < thresholds.small_revenue_base {
                consecutive = 0;
                continue;
            }

            let growth = (current - previous) / previous;
            if growth > thresholds.growth_cap {
                consecutive += 1;
                if consecutive >= thresholds.sustained_growth_months {
                    return Some(ValidationWarning::UnrealisticGrowth {
                        months: consecutive,
                        rate_cap: thresholds.growth_cap,
                    });
                }
            } else {
                consecutive = 0;
            }
        }

        None
    }

    fn check_margin_decline(
        result: &ForecastResult,
        thresholds: &ValidationThresholds,
    ) -> Option<ValidationWarning> {
        let margins = &result.pl.margins;
        let baseline = margins.first()?.operating_margin_pct;

        for margin in margins.iter().skip(1) {
            let decline_pp = baseline - margin.operating_margin_pct;
            if decline_pp > thresholds.margin_decline_pp {
                return Some(ValidationWarning::MarginDecline {
                    month: margin.month_index,
                    decline_pp,
                    threshold_pp: thresholds.margin_decline_pp,
                });
            }
        }

        None
    }

    fn check_margin_compression(
        result: &ForecastResult,
        thresholds: &ValidationThresholds,
    ) -> Option<ValidationWarning> {
        let revenue = result.pl.revenue.projected_values();
        let expenses = result.pl.expenses.projected_values();
        if revenue.len() != expenses.len() {
            return None;
        }

        let mut consecutive = 0;
        for month in 1..revenue.len() {
            let (prev_rev, curr_rev) = (revenue[month - 1], revenue[month]);
            let (prev_exp, curr_exp) = (expenses[month - 1], expenses[month]);

            if prev_rev == 0.0 || prev_exp == 0.0 {
                consecutive = 0;
                continue;
            }

            let revenue_growth = (curr_rev - prev_rev) / prev_rev;
            let expense_growth = (curr_exp - prev_exp) / prev_exp.abs();

            if expense_growth > revenue_growth {
                consecutive += 1;
                if consecutive >= thresholds.margin_compression_months {
                    return Some(ValidationWarning::MarginCompression {
                        months: consecutive,
                        threshold: thresholds.margin_compression_months,
                    });
                }
            } else {
                consecutive = 0;
            }
        }

        None
    }
}
