//! Budget-versus-forecast variance analysis

use crate::orchestrator::{ForecastResult, MultiScenarioResult};
use crate::projector::ForecastSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Budgeted monthly amounts keyed by forecast month index (1-based). The
/// budget may cover a different span than the forecast; comparison runs over
/// the intersection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetModel {
    values: BTreeMap<usize, f64>,
}

impl BudgetModel {
    pub fn new(values: BTreeMap<usize, f64>) -> Self {
        Self { values }
    }

    /// Budget from `(month, amount)` pairs
    pub fn from_entries(entries: &[(usize, f64)]) -> Self {
        Self {
            values: entries.iter().copied().collect(),
        }
    }

    pub fn get(&self, month: usize) -> Option<f64> {
        self.values.get(&month).copied()
    }

    /// Budgeted months in ascending order
    pub fn months(&self) -> impl Iterator<Item = usize> + '_ {
        self.values.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Significance thresholds for variance flagging. A variance is significant
/// when it is strictly greater than either threshold; equality is not
/// significant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceThresholds {
    /// Percentage threshold in percent units (10.0 = 10%)
    pub pct: f64,
    /// Absolute threshold in currency units
    pub abs: f64,
}

impl Default for VarianceThresholds {
    fn default() -> Self {
        Self {
            pct: 10.0,
            abs: 1000.0,
        }
    }
}

/// Variance for one month in the budget/forecast intersection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetVarianceEntry {
    pub month: usize,
    pub budget_value: f64,
    pub forecast_value: f64,
    /// `forecast - budget`; positive means the forecast exceeds budget
    pub variance_abs: f64,
    /// Variance as a percentage of the budget, in percent units. `None` when
    /// the budgeted amount is zero: the percentage is undefined there, and
    /// significance falls back to the absolute threshold alone.
    pub variance_pct: Option<f64>,
    pub is_significant: bool,
}

/// Comparison of a forecast against a budget over their shared months
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VarianceReport {
    pub entries: Vec<BudgetVarianceEntry>,
    /// Set when the comparison produced no entries, explaining why
    pub note: Option<String>,
}

impl VarianceReport {
    /// Entries flagged as significant, in month order
    pub fn significant(&self) -> impl Iterator<Item = &BudgetVarianceEntry> {
        self.entries.iter().filter(|e| e.is_significant)
    }
}

/// Analyzer comparing projected values against budgeted amounts
#[derive(Debug)]
pub struct BudgetVarianceAnalyzer;

impl BudgetVarianceAnalyzer {
    /// Compare a forecast's projected revenue against the budget
    pub fn compare(
        forecast: &ForecastResult,
        budget: &BudgetModel,
        thresholds: &VarianceThresholds,
    ) -> VarianceReport {
        Self::compare_series(&forecast.pl.revenue, budget, thresholds)
    }

    /// Compare the expected scenario of a multi-scenario run against the
    /// budget. An empty report with a note when no scenario succeeded.
    pub fn compare_expected(
        results: &MultiScenarioResult,
        budget: &BudgetModel,
        thresholds: &VarianceThresholds,
    ) -> VarianceReport {
        match results.expected() {
            Some(forecast) => Self::compare(forecast, budget, thresholds),
            None => VarianceReport {
                entries: Vec::new(),
                note: Some("No successful scenario to compare against the budget".to_string()),
            },
        }
    }

    /// Compare one projected series against the budget over the months both
    /// cover. Non-overlapping months on either side are skipped, never
    /// treated as zero.
    pub fn compare_series(
        series: &ForecastSeries,
        budget: &BudgetModel,
        thresholds: &VarianceThresholds,
    ) -> VarianceReport {
        if budget.is_empty() {
            return VarianceReport {
                entries: Vec::new(),
                note: Some("No budget available for the forecast period".to_string()),
            };
        }

        let entries: Vec<BudgetVarianceEntry> = budget
            .months()
            .filter_map(|month| {
                let point = series.get(month)?;
                let budget_value = budget.get(month)?;
                let forecast_value = point.projected();

                let variance_abs = forecast_value - budget_value;
                let variance_pct = if budget_value == 0.0 {
                    None
                } else {
                    Some(variance_abs / budget_value * 100.0)
                };

                // Strictly greater on either threshold
                let is_significant = variance_pct
                    .map(|pct| pct.abs() > thresholds.pct)
                    .unwrap_or(false)
                    || variance_abs.abs() > thresholds.abs;

                Some(BudgetVarianceEntry {
                    month,
                    budget_value,
                    forecast_value,
                    variance_abs,
                    variance_pct,
                    is_significant,
                })
            })
            .collect();

        let note = if entries.is_empty() {
            Some("Budget and forecast cover no common months".to_string())
        } else {
            None
        };

        VarianceReport { entries, note }
    }
}
