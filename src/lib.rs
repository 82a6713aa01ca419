//! # Fincast
//!
//! A Rust library for forecasting business cash flow and P&L with empirical
//! confidence intervals.
//!
//! ## Features
//!
//! - Anomaly-aware preprocessing (median baseline, month-over-month
//!   volatility profile, user-annotated exclusions)
//! - Percentile-based confidence bands that widen with the forecast horizon
//! - Compound-growth projection with collection-period lag, planned cash
//!   events, and one-month external adjustments
//! - Independent multi-scenario orchestration with partial success
//! - Reasonability validation (liquidity, runway, growth, margins) and a
//!   data-quality tier
//! - Budget-versus-forecast variance analysis
//!
//! ## Quick Start
//!
//! ```rust
//! use fincast::{
//!     ForecastScenario, HistoricalInputs, HistoricalSeries, OrchestratorConfig, Period,
//!     ScenarioOrchestrator,
//! };
//!
//! # fn main() -> fincast::Result<()> {
//! let start = Period::new(2024, 1)?;
//! let inputs = HistoricalInputs {
//!     operating: HistoricalSeries::from_values(
//!         start,
//!         &[5200.0, 4800.0, 5500.0, 5100.0, 4900.0, 5300.0, 5000.0, 5400.0],
//!     )?,
//!     investing: HistoricalSeries::from_values(
//!         start,
//!         &[-900.0, -1100.0, -950.0, -1000.0, -1050.0, -980.0, -1020.0, -990.0],
//!     )?,
//!     financing: HistoricalSeries::from_values(
//!         start,
//!         &[-450.0, -520.0, -480.0, -500.0, -510.0, -490.0, -470.0, -505.0],
//!     )?,
//!     revenue: HistoricalSeries::from_values(
//!         start,
//!         &[21000.0, 19500.0, 22000.0, 20500.0, 19800.0, 21500.0, 20200.0, 21800.0],
//!     )?,
//!     cogs: Some(HistoricalSeries::from_values(
//!         start,
//!         &[8400.0, 7900.0, 8800.0, 8200.0, 8000.0, 8600.0, 8100.0, 8700.0],
//!     )?),
//!     expenses: HistoricalSeries::from_values(
//!         start,
//!         &[9500.0, 9700.0, 9400.0, 9600.0, 9650.0, 9550.0, 9620.0, 9580.0],
//!     )?,
//!     ending_cash: 48000.0,
//! };
//!
//! let mut expected = ForecastScenario::new("Expected");
//! expected.revenue_growth_rate = 0.02;
//! expected.cash_growth_rate = 0.02;
//! expected.collection_period_days = 30;
//!
//! let results = ScenarioOrchestrator::run(
//!     &[expected],
//!     &inputs,
//!     &[],
//!     12,
//!     &OrchestratorConfig::default(),
//! )?;
//!
//! let forecast = results.expected().ok_or_else(|| {
//!     fincast::ForecastError::InsufficientData("no successful scenario".to_string())
//! })?;
//! println!("{}", forecast.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod interval;
pub mod orchestrator;
pub mod preprocess;
pub mod projector;
pub mod scenario;
pub mod series;
pub mod stats;
pub mod validate;
pub mod variance;

// Re-export commonly used types
pub use crate::error::{ForecastError, Result};
pub use crate::interval::ConfidenceIntervalEstimator;
pub use crate::orchestrator::{
    ForecastResult, HistoricalInputs, MultiScenarioResult, OrchestratorConfig,
    ScenarioOrchestrator,
};
pub use crate::preprocess::{PreprocessorConfig, SeriesPreprocessor};
pub use crate::projector::{ForecastPoint, ForecastSeries, GrowthProjector};
pub use crate::scenario::{CashEvent, ExternalAdjustment, ForecastScenario, ImpactType};
pub use crate::series::{
    AnomalyAnnotation, ExclusionScope, HistoricalObservation, HistoricalSeries, Period,
};
pub use crate::validate::{
    ForecastValidator, QualityTier, ValidationThresholds, ValidationWarning,
};
pub use crate::variance::{BudgetModel, BudgetVarianceAnalyzer, VarianceThresholds};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
