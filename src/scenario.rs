//! Scenario definitions: growth assumptions, timing, and discrete cash events

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// A discrete planned cash event (capex purchase, debt payment) targeting a
/// specific forecast month. Outflows carry negative amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashEvent {
    /// Forecast month index the event lands in (1-based)
    pub month: usize,
    /// Signed amount
    pub amount: f64,
}

impl CashEvent {
    pub fn new(month: usize, amount: f64) -> Self {
        Self { month, amount }
    }
}

/// Direction of an external event adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactType {
    /// Reduces revenue for the month by `magnitude`
    RevenueReduction,
    /// Increases revenue for the month by `magnitude`
    RevenueIncrease,
    /// Increases operating expenses for the month by `magnitude`
    CostIncrease,
    /// Reduces operating expenses for the month by `magnitude`
    CostReduction,
}

/// Percentage adjustment applied to one metric for one forecast month only
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExternalAdjustment {
    /// Forecast month index the adjustment applies to (1-based)
    pub month: usize,
    /// What the adjustment does
    pub impact: ImpactType,
    /// Magnitude as a fraction (0.10 = 10%)
    pub magnitude: f64,
}

impl ExternalAdjustment {
    pub fn new(month: usize, impact: ImpactType, magnitude: f64) -> Result<Self> {
        if magnitude < 0.0 {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Adjustment magnitude must be non-negative, got {}",
                magnitude
            )));
        }

        // Reductions above 100% would flip the sign of the metric
        if magnitude >= 1.0
            && matches!(
                impact,
                ImpactType::RevenueReduction | ImpactType::CostReduction
            )
        {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Reduction magnitude must be below 1.0, got {}",
                magnitude
            )));
        }

        Ok(Self {
            month,
            impact,
            magnitude,
        })
    }

    /// The multiplier this adjustment applies to its target metric
    pub fn factor(&self) -> f64 {
        match self.impact {
            ImpactType::RevenueReduction | ImpactType::CostReduction => 1.0 - self.magnitude,
            ImpactType::RevenueIncrease | ImpactType::CostIncrease => 1.0 + self.magnitude,
        }
    }
}

/// A named, independent set of growth/timing/event assumptions producing its
/// own forecast. Immutable for the duration of a forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastScenario {
    /// Human-readable scenario name, e.g. "Conservative", "Expected"
    pub name: String,
    /// Monthly compound growth rate for the cash-flow activity sections
    pub cash_growth_rate: f64,
    /// Monthly compound growth rate for revenue
    pub revenue_growth_rate: f64,
    /// Monthly compound growth rate for cost of goods sold
    pub cogs_growth_rate: f64,
    /// Monthly compound growth rate for operating expenses
    pub opex_growth_rate: f64,
    /// Average customer collection period in days; lags operating inflows
    pub collection_period_days: u32,
    /// Planned capital expenditures (investing section)
    pub planned_capex: Vec<CashEvent>,
    /// Planned debt payments (financing section)
    pub debt_payments: Vec<CashEvent>,
    /// One-month external event adjustments
    pub adjustments: Vec<ExternalAdjustment>,
    /// Optional per-scenario horizon override. The orchestrator rejects the
    /// whole batch when this disagrees with the call-level horizon; it exists
    /// only so stale scenario definitions surface loudly instead of being
    /// coerced.
    pub horizon: Option<usize>,
}

impl ForecastScenario {
    /// A scenario with the given name and growth rates, no timing lag and
    /// no events
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cash_growth_rate: 0.0,
            revenue_growth_rate: 0.0,
            cogs_growth_rate: 0.0,
            opex_growth_rate: 0.0,
            collection_period_days: 0,
            planned_capex: Vec::new(),
            debt_payments: Vec::new(),
            adjustments: Vec::new(),
            horizon: None,
        }
    }
}
