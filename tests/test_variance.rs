use assert_approx_eq::assert_approx_eq;
use fincast::projector::{ForecastPoint, ForecastSeries};
use fincast::variance::{BudgetModel, BudgetVarianceAnalyzer, VarianceThresholds};
use rstest::rstest;

fn projected_series(values: &[f64]) -> ForecastSeries {
    let points = values
        .iter()
        .enumerate()
        .map(|(i, &v)| ForecastPoint::new(i + 1, v * 0.9, v, v * 1.1).unwrap())
        .collect();
    ForecastSeries::from_points(points).unwrap()
}

#[test]
fn test_variance_over_shared_months() {
    let series = projected_series(&[1200.0, 1050.0]);
    let budget = BudgetModel::from_entries(&[(1, 1000.0), (2, 1000.0)]);

    let report =
        BudgetVarianceAnalyzer::compare_series(&series, &budget, &VarianceThresholds::default());

    assert_eq!(report.entries.len(), 2);
    assert!(report.note.is_none());

    let first = &report.entries[0];
    assert_approx_eq!(first.variance_abs, 200.0);
    assert_approx_eq!(first.variance_pct.unwrap(), 20.0);
    assert!(first.is_significant);

    let second = &report.entries[1];
    assert_approx_eq!(second.variance_abs, 50.0);
    assert_approx_eq!(second.variance_pct.unwrap(), 5.0);
    assert!(!second.is_significant);
}

#[rstest]
// Exactly at a threshold is not significant
#[case(10_000.0, 11_000.0, false)]
// Strictly above the percentage threshold
#[case(100.0, 111.0, true)]
// Strictly above the absolute threshold
#[case(50_000.0, 51_001.0, true)]
// Under both thresholds
#[case(10_000.0, 10_500.0, false)]
// Negative variances use the same magnitudes
#[case(10_000.0, 9_000.0, false)]
#[case(10_000.0, 8_999.0, true)]
fn test_significance_boundaries(
    #[case] budget_value: f64,
    #[case] forecast_value: f64,
    #[case] expected: bool,
) {
    let series = projected_series(&[forecast_value]);
    let budget = BudgetModel::from_entries(&[(1, budget_value)]);

    let report =
        BudgetVarianceAnalyzer::compare_series(&series, &budget, &VarianceThresholds::default());

    assert_eq!(report.entries[0].is_significant, expected);
}

#[test]
fn test_zero_budget_leaves_percentage_undefined() {
    let series = projected_series(&[500.0, 1500.0]);
    let budget = BudgetModel::from_entries(&[(1, 0.0), (2, 0.0)]);

    let report =
        BudgetVarianceAnalyzer::compare_series(&series, &budget, &VarianceThresholds::default());

    // Significance falls back to the absolute threshold alone
    assert_eq!(report.entries[0].variance_pct, None);
    assert!(!report.entries[0].is_significant);
    assert_eq!(report.entries[1].variance_pct, None);
    assert!(report.entries[1].is_significant);
}

#[test]
fn test_empty_budget_notes() {
    let series = projected_series(&[1000.0]);
    let budget = BudgetModel::default();

    let report =
        BudgetVarianceAnalyzer::compare_series(&series, &budget, &VarianceThresholds::default());

    assert!(report.entries.is_empty());
    assert!(report.note.is_some());
}

#[test]
fn test_disjoint_months_note() {
    let series = projected_series(&[1000.0, 1000.0]);
    let budget = BudgetModel::from_entries(&[(10, 900.0), (11, 950.0)]);

    let report =
        BudgetVarianceAnalyzer::compare_series(&series, &budget, &VarianceThresholds::default());

    assert!(report.entries.is_empty());
    assert!(report.note.is_some());
}

#[test]
fn test_partial_overlap_compares_intersection_only() {
    let series = projected_series(&[1000.0, 1000.0, 1000.0]);
    let budget = BudgetModel::from_entries(&[(2, 900.0), (3, 950.0), (4, 990.0), (5, 1010.0)]);

    let report =
        BudgetVarianceAnalyzer::compare_series(&series, &budget, &VarianceThresholds::default());

    let months: Vec<usize> = report.entries.iter().map(|e| e.month).collect();
    assert_eq!(months, vec![2, 3]);
}

#[test]
fn test_significant_filter() {
    let series = projected_series(&[1200.0, 1050.0, 2500.0]);
    let budget = BudgetModel::from_entries(&[(1, 1000.0), (2, 1000.0), (3, 1000.0)]);

    let report =
        BudgetVarianceAnalyzer::compare_series(&series, &budget, &VarianceThresholds::default());

    let significant: Vec<usize> = report.significant().map(|e| e.month).collect();
    assert_eq!(significant, vec![1, 3]);
}

#[test]
fn test_compare_expected_without_successes() {
    use fincast::orchestrator::{HistoricalInputs, OrchestratorConfig, ScenarioOrchestrator};
    use fincast::scenario::ForecastScenario;
    use fincast::series::{HistoricalSeries, Period};

    let start = Period::new(2024, 1).unwrap();
    let series = |values: &[f64]| HistoricalSeries::from_values(start, values).unwrap();
    let inputs = HistoricalInputs {
        operating: series(&[5000.0, 5100.0, 4900.0, 5200.0, 5050.0, 5150.0, 4950.0, 5250.0]),
        investing: series(&[-1000.0, -950.0, -1050.0, -980.0, -1020.0, -990.0, -1010.0, -960.0]),
        financing: series(&[-500.0, -480.0, -510.0, -490.0, -505.0, -495.0, -485.0, -515.0]),
        revenue: series(&[
            20_000.0, 21_000.0, 19_500.0, 20_500.0, 20_200.0, 20_800.0, 19_900.0, 20_600.0,
        ]),
        cogs: None,
        expenses: series(&[9000.0, 9100.0, 8950.0, 9050.0, 9020.0, 9080.0, 8990.0, 9040.0]),
        ending_cash: 30_000.0,
    };

    // The only scenario fails validation inside its own run
    let mut broken = ForecastScenario::new("Aggressive");
    broken.cash_growth_rate = 2.0;

    let results = ScenarioOrchestrator::run(
        &[broken],
        &inputs,
        &[],
        6,
        &OrchestratorConfig::default(),
    )
    .unwrap();

    let budget = BudgetModel::from_entries(&[(1, 1000.0)]);
    let report = BudgetVarianceAnalyzer::compare_expected(
        &results,
        &budget,
        &VarianceThresholds::default(),
    );

    assert!(report.entries.is_empty());
    assert!(report.note.is_some());
}
