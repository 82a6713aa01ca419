//! Multi-scenario forecast orchestration

use crate::error::{ForecastError, Result};
use crate::interval::ConfidenceIntervalEstimator;
use crate::preprocess::{PreprocessorConfig, SeriesPreprocessor};
use crate::projector::{
    derive_margins, ForecastSeries, GrowthProjector, MarginPoint, UncollectedSpillover,
};
use crate::scenario::{ForecastScenario, ImpactType};
use crate::series::{AnomalyAnnotation, HistoricalSeries, Period};
use crate::stats;
use crate::validate::{ForecastValidator, QualityTier, ValidationThresholds, ValidationWarning};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, info};

/// Monthly growth rate magnitude above which an assumption is flagged
const HIGH_GROWTH_RATE: f64 = 0.20;

/// Historical inputs shared by every scenario in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalInputs {
    /// Operating cash-flow section, monthly net amounts
    pub operating: HistoricalSeries,
    /// Investing cash-flow section
    pub investing: HistoricalSeries,
    /// Financing cash-flow section
    pub financing: HistoricalSeries,
    /// P&L revenue
    pub revenue: HistoricalSeries,
    /// P&L cost of goods sold; absent for service businesses
    pub cogs: Option<HistoricalSeries>,
    /// P&L operating expenses
    pub expenses: HistoricalSeries,
    /// Cash balance at the end of the last historical month
    pub ending_cash: f64,
}

/// Call-level configuration, identical across scenarios within one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Confidence level for all bands, as a fraction (0.80 = 80%)
    pub confidence_level: f64,
    pub preprocessor: PreprocessorConfig,
    pub thresholds: ValidationThresholds,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.80,
            preprocessor: PreprocessorConfig::default(),
            thresholds: ValidationThresholds::default(),
        }
    }
}

/// Characteristics of the historical data a forecast was built from, used
/// for quality tiering and output metadata. Based on the revenue series,
/// the metric quality judgments are made about in practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProfile {
    /// Observations that survived baseline exclusion
    pub eligible_months: usize,
    /// Coefficient of variation of the eligible values, when computable
    pub value_cv: Option<f64>,
    /// Union of periods excluded across all input series
    pub excluded_periods: Vec<Period>,
    /// Whether any section fell back to fixed volatility bounds
    pub degraded_volatility: bool,
}

/// Three-band cash-flow projection by activity section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowForecast {
    pub operating: ForecastSeries,
    pub investing: ForecastSeries,
    pub financing: ForecastSeries,
    /// Cumulative cash position, anchored at `starting_cash`
    pub ending_cash: ForecastSeries,
    /// Last historical ending cash, the anchor for the cumulative series
    pub starting_cash: f64,
    /// Operating inflows pushed past the horizon by the collection lag
    pub uncollected_spillover: Option<UncollectedSpillover>,
}

/// Three-band P&L projection with derived margins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlForecast {
    pub revenue: ForecastSeries,
    pub cogs: Option<ForecastSeries>,
    pub expenses: ForecastSeries,
    /// Margins derived from projected values only
    pub margins: Vec<MarginPoint>,
}

/// A complete single-scenario forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub scenario_name: String,
    pub horizon: usize,
    pub confidence_level: f64,
    pub cash_flow: CashFlowForecast,
    pub pl: PlForecast,
    pub data_profile: DataProfile,
    pub warnings: Vec<ValidationWarning>,
    pub quality: QualityTier,
}

impl ForecastResult {
    /// Serialize the result to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Outcome of one scenario within a batch: the forecast, or the error that
/// sank this scenario alone
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: Result<ForecastResult>,
}

/// Results of a multi-scenario run. Scenario failures are carried per
/// outcome; only batch-level configuration problems fail the whole call.
#[derive(Debug)]
pub struct MultiScenarioResult {
    horizon: usize,
    outcomes: Vec<ScenarioOutcome>,
}

impl MultiScenarioResult {
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn outcomes(&self) -> &[ScenarioOutcome] {
        &self.outcomes
    }

    /// Successful forecasts, in scenario order
    pub fn successes(&self) -> impl Iterator<Item = &ForecastResult> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Failed scenarios with their errors, in scenario order
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ForecastError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    /// The scenario named "Expected", or the first successful scenario when
    /// no scenario carries that name
    pub fn expected(&self) -> Option<&ForecastResult> {
        self.successes()
            .find(|r| r.scenario_name == "Expected")
            .or_else(|| self.successes().next())
    }
}

/// Orchestrator running a batch of independent scenarios over shared
/// historical inputs
#[derive(Debug)]
pub struct ScenarioOrchestrator;

impl ScenarioOrchestrator {
    /// Run every scenario against the shared inputs.
    ///
    /// Batch-level configuration problems (zero horizon, a scenario horizon
    /// disagreeing with the call-level horizon, duplicate scenario names, a
    /// confidence level out of range) fail the whole call before any
    /// scenario runs. Everything after that point is per-scenario: one
    /// scenario's failure is recorded in its outcome and the rest proceed.
    pub fn run(
        scenarios: &[ForecastScenario],
        inputs: &HistoricalInputs,
        annotations: &[AnomalyAnnotation],
        horizon: usize,
        config: &OrchestratorConfig,
    ) -> Result<MultiScenarioResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidConfiguration(
                "Forecast horizon must be at least 1 month".to_string(),
            ));
        }
        if scenarios.is_empty() {
            return Err(ForecastError::InvalidConfiguration(
                "At least one scenario is required".to_string(),
            ));
        }
        ConfidenceIntervalEstimator::validate_confidence_level(config.confidence_level)?;

        for scenario in scenarios {
            if let Some(scenario_horizon) = scenario.horizon {
                if scenario_horizon != horizon {
                    return Err(ForecastError::InvalidConfiguration(format!(
                        "Scenario '{}' specifies a {}-month horizon but the run uses {} months; \
                         all scenarios must share one horizon",
                        scenario.name, scenario_horizon, horizon
                    )));
                }
            }
        }

        let mut names = HashSet::new();
        for scenario in scenarios {
            if !names.insert(scenario.name.as_str()) {
                return Err(ForecastError::InvalidConfiguration(format!(
                    "Duplicate scenario name '{}'",
                    scenario.name
                )));
            }
        }

        info!(
            scenarios = scenarios.len(),
            horizon,
            confidence_level = config.confidence_level,
            "starting multi-scenario forecast run"
        );

        let outcomes = scenarios
            .iter()
            .map(|scenario| {
                debug!(scenario = %scenario.name, "running scenario");
                let result = Self::run_scenario(scenario, inputs, annotations, horizon, config);
                match &result {
                    Ok(forecast) => info!(
                        scenario = %scenario.name,
                        warnings = forecast.warnings.len(),
                        quality = %forecast.quality,
                        "scenario completed"
                    ),
                    Err(e) => error!(scenario = %scenario.name, error = %e, "scenario failed"),
                }
                ScenarioOutcome {
                    name: scenario.name.clone(),
                    result,
                }
            })
            .collect();

        Ok(MultiScenarioResult { horizon, outcomes })
    }

    fn run_scenario(
        scenario: &ForecastScenario,
        inputs: &HistoricalInputs,
        annotations: &[AnomalyAnnotation],
        horizon: usize,
        config: &OrchestratorConfig,
    ) -> Result<ForecastResult> {
        let mut warnings = Vec::new();
        Self::check_growth_assumptions(scenario, &mut warnings);

        // Cash-flow sections share the cash growth rate; each keeps its own
        // baseline and volatility profile
        let mut operating = Self::project_series(
            &inputs.operating,
            annotations,
            scenario.cash_growth_rate,
            horizon,
            config,
            &mut warnings,
        )?;
        let mut investing = Self::project_series(
            &inputs.investing,
            annotations,
            scenario.cash_growth_rate,
            horizon,
            config,
            &mut warnings,
        )?;
        let mut financing = Self::project_series(
            &inputs.financing,
            annotations,
            scenario.cash_growth_rate,
            horizon,
            config,
            &mut warnings,
        )?;

        // Lag first, then discrete events: events land in their stated month
        // regardless of collection timing
        let spillover = GrowthProjector::apply_collection_lag(
            &mut operating,
            scenario.collection_period_days,
            &mut warnings,
        );
        GrowthProjector::apply_events(&mut investing, &scenario.planned_capex, &mut warnings);
        GrowthProjector::apply_events(&mut financing, &scenario.debt_payments, &mut warnings);

        let mut revenue = Self::project_series(
            &inputs.revenue,
            annotations,
            scenario.revenue_growth_rate,
            horizon,
            config,
            &mut warnings,
        )?;
        let cogs = match &inputs.cogs {
            Some(series) => Some(Self::project_series(
                series,
                annotations,
                scenario.cogs_growth_rate,
                horizon,
                config,
                &mut warnings,
            )?),
            None => {
                warnings.push(ValidationWarning::MissingCostOfGoods);
                None
            }
        };
        let mut expenses = Self::project_series(
            &inputs.expenses,
            annotations,
            scenario.opex_growth_rate,
            horizon,
            config,
            &mut warnings,
        )?;

        // Revenue adjustments hit both the P&L revenue line and the
        // operating cash section; cost adjustments hit expenses only (cash
        // events already cover discrete cash costs)
        for adjustment in &scenario.adjustments {
            match adjustment.impact {
                ImpactType::RevenueReduction | ImpactType::RevenueIncrease => {
                    GrowthProjector::apply_adjustment(&mut revenue, adjustment, &mut warnings)?;
                    GrowthProjector::apply_adjustment(&mut operating, adjustment, &mut warnings)?;
                }
                ImpactType::CostIncrease | ImpactType::CostReduction => {
                    GrowthProjector::apply_adjustment(&mut expenses, adjustment, &mut warnings)?;
                }
            }
        }

        let margins = derive_margins(&revenue, cogs.as_ref(), &expenses);

        let ending_cash = GrowthProjector::accumulate_cash(
            inputs.ending_cash,
            &[&operating, &investing, &financing],
        )?;

        let data_profile = Self::build_data_profile(inputs, annotations, config, &warnings)?;
        let quality = ForecastValidator::quality(&data_profile, &config.thresholds);

        let mut result = ForecastResult {
            scenario_name: scenario.name.clone(),
            horizon,
            confidence_level: config.confidence_level,
            cash_flow: CashFlowForecast {
                operating,
                investing,
                financing,
                ending_cash,
                starting_cash: inputs.ending_cash,
                uncollected_spillover: if spillover.is_zero() {
                    None
                } else {
                    Some(spillover)
                },
            },
            pl: PlForecast {
                revenue,
                cogs,
                expenses,
                margins,
            },
            data_profile,
            warnings,
            quality,
        };

        let reasonability = ForecastValidator::validate(&result, &config.thresholds)?;
        result.warnings.extend(reasonability);

        Ok(result)
    }

    fn check_growth_assumptions(
        scenario: &ForecastScenario,
        warnings: &mut Vec<ValidationWarning>,
    ) {
        let rates = [
            ("cash growth", scenario.cash_growth_rate),
            ("revenue growth", scenario.revenue_growth_rate),
            ("COGS growth", scenario.cogs_growth_rate),
            ("expense growth", scenario.opex_growth_rate),
        ];
        for (category, rate) in rates {
            if rate.abs() >= HIGH_GROWTH_RATE {
                warnings.push(ValidationWarning::HighGrowthAssumption {
                    category: category.to_string(),
                    rate,
                });
            }
        }
    }

    fn project_series(
        series: &HistoricalSeries,
        annotations: &[AnomalyAnnotation],
        growth_rate: f64,
        horizon: usize,
        config: &OrchestratorConfig,
        warnings: &mut Vec<ValidationWarning>,
    ) -> Result<ForecastSeries> {
        let (baseline, profile) =
            SeriesPreprocessor::compute(series, annotations, &config.preprocessor, warnings)?;
        GrowthProjector::project(
            &baseline,
            growth_rate,
            horizon,
            &profile,
            config.confidence_level,
        )
    }

    /// Profile the revenue series (the quality anchor) and record the union
    /// of excluded periods across all inputs
    fn build_data_profile(
        inputs: &HistoricalInputs,
        annotations: &[AnomalyAnnotation],
        config: &OrchestratorConfig,
        warnings: &[ValidationWarning],
    ) -> Result<DataProfile> {
        // A scratch sink: profiling must not duplicate warnings the
        // projection pass already recorded
        let mut scratch = Vec::new();
        let (baseline, profile) = SeriesPreprocessor::compute(
            &inputs.revenue,
            annotations,
            &config.preprocessor,
            &mut scratch,
        )?;

        let eligible_values: Vec<f64> = inputs
            .revenue
            .observations()
            .iter()
            .filter(|obs| !baseline.excluded_periods.contains(&obs.period))
            .map(|obs| obs.value)
            .collect();

        let mut excluded: Vec<Period> = baseline
            .excluded_periods
            .iter()
            .chain(profile.excluded_periods.iter())
            .copied()
            .collect();
        excluded.sort();
        excluded.dedup();

        let degraded_volatility = profile.is_degraded()
            || warnings
                .iter()
                .any(|w| matches!(w, ValidationWarning::DegradedVolatility { .. }));

        Ok(DataProfile {
            eligible_months: baseline.eligible_count,
            value_cv: stats::coefficient_of_variation(&eligible_values),
            excluded_periods: excluded,
            degraded_volatility,
        })
    }
}
