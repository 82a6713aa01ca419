use fincast::orchestrator::{CashFlowForecast, DataProfile, ForecastResult, PlForecast};
use fincast::projector::{derive_margins, ForecastPoint, ForecastSeries, MarginPoint};
use fincast::validate::{
    ForecastValidator, QualityTier, ValidationThresholds, ValidationWarning,
};

fn flat_series(values: &[f64]) -> ForecastSeries {
    let points = values
        .iter()
        .enumerate()
        .map(|(i, &v)| ForecastPoint::new(i + 1, v, v, v).unwrap())
        .collect();
    ForecastSeries::from_points(points).unwrap()
}

fn healthy_profile() -> DataProfile {
    DataProfile {
        eligible_months: 24,
        value_cv: Some(0.1),
        excluded_periods: Vec::new(),
        degraded_volatility: false,
    }
}

fn make_result(
    starting_cash: f64,
    ending_cash: ForecastSeries,
    revenue: ForecastSeries,
    expenses: ForecastSeries,
    margins: Vec<MarginPoint>,
) -> ForecastResult {
    let horizon = ending_cash.len();
    let zeros = flat_series(&vec![0.0; horizon]);

    ForecastResult {
        scenario_name: "Expected".to_string(),
        horizon,
        confidence_level: 0.80,
        cash_flow: CashFlowForecast {
            operating: zeros.clone(),
            investing: zeros.clone(),
            financing: zeros,
            ending_cash,
            starting_cash,
            uncollected_spillover: None,
        },
        pl: PlForecast {
            revenue,
            cogs: None,
            expenses,
            margins,
        },
        data_profile: healthy_profile(),
        warnings: Vec::new(),
        quality: QualityTier::High,
    }
}

fn make_simple_result(
    starting_cash: f64,
    ending: &[f64],
    revenue: &[f64],
    expenses: &[f64],
) -> ForecastResult {
    let revenue_series = flat_series(revenue);
    let expense_series = flat_series(expenses);
    let margins = derive_margins(&revenue_series, None, &expense_series);
    make_result(
        starting_cash,
        flat_series(ending),
        revenue_series,
        expense_series,
        margins,
    )
}

#[test]
fn test_healthy_forecast_has_no_warnings() {
    let result = make_simple_result(
        10_000.0,
        &[10_500.0, 11_000.0, 11_500.0],
        &[2000.0, 2040.0, 2080.0],
        &[600.0, 610.0, 620.0],
    );

    let warnings = ForecastValidator::validate(&result, &ValidationThresholds::default()).unwrap();

    assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
}

#[test]
fn test_liquidity_flags_first_negative_month() {
    let result = make_simple_result(
        5000.0,
        &[3000.0, -2000.0, -3000.0],
        &[2000.0, 2000.0, 2000.0],
        &[600.0, 600.0, 600.0],
    );

    let warnings = ForecastValidator::validate(&result, &ValidationThresholds::default()).unwrap();

    let liquidity: Vec<_> = warnings
        .iter()
        .filter(|w| matches!(w, ValidationWarning::Liquidity { .. }))
        .collect();
    assert_eq!(liquidity.len(), 1);
    assert!(matches!(
        liquidity[0],
        ValidationWarning::Liquidity { month: 2, .. }
    ));
}

#[test]
fn test_runway_below_threshold_warns() {
    let result = make_simple_result(
        2000.0,
        &[800.0, 0.0],
        &[2000.0, 2000.0],
        &[600.0, 600.0],
    );

    let warnings = ForecastValidator::validate(&result, &ValidationThresholds::default()).unwrap();

    assert!(warnings.iter().any(|w| matches!(
        w,
        ValidationWarning::Runway {
            runway_months: 2,
            threshold_months: 3
        }
    )));
}

#[test]
fn test_growing_cash_has_no_runway_warning() {
    let result = make_simple_result(
        1000.0,
        &[1500.0, 2000.0],
        &[2000.0, 2000.0],
        &[600.0, 600.0],
    );

    let warnings = ForecastValidator::validate(&result, &ValidationThresholds::default()).unwrap();

    assert!(!warnings
        .iter()
        .any(|w| matches!(w, ValidationWarning::Runway { .. })));
}

#[test]
fn test_sustained_high_growth_warns() {
    let result = make_simple_result(
        50_000.0,
        &[51_000.0, 52_000.0, 53_000.0, 54_000.0],
        &[2000.0, 2800.0, 3920.0, 5488.0],
        &[300.0, 300.0, 300.0, 300.0],
    );

    let warnings = ForecastValidator::validate(&result, &ValidationThresholds::default()).unwrap();

    assert!(warnings
        .iter()
        .any(|w| matches!(w, ValidationWarning::UnrealisticGrowth { months: 3, .. })));
}

#[test]
fn test_small_revenue_base_skips_growth_check() {
    let result = make_simple_result(
        50_000.0,
        &[51_000.0, 52_000.0, 53_000.0, 54_000.0],
        &[500.0, 900.0, 1620.0, 2916.0],
        &[300.0, 300.0, 300.0, 300.0],
    );

    let warnings = ForecastValidator::validate(&result, &ValidationThresholds::default()).unwrap();

    assert!(!warnings
        .iter()
        .any(|w| matches!(w, ValidationWarning::UnrealisticGrowth { .. })));
}

#[test]
fn test_margin_decline_warns() {
    let margins = vec![
        MarginPoint {
            month_index: 1,
            gross_profit: 600.0,
            gross_margin_pct: 60.0,
            operating_income: 300.0,
            operating_margin_pct: 30.0,
            net_income: 300.0,
        },
        MarginPoint {
            month_index: 2,
            gross_profit: 550.0,
            gross_margin_pct: 55.0,
            operating_income: 250.0,
            operating_margin_pct: 25.0,
            net_income: 250.0,
        },
        MarginPoint {
            month_index: 3,
            gross_profit: 400.0,
            gross_margin_pct: 40.0,
            operating_income: 150.0,
            operating_margin_pct: 15.0,
            net_income: 150.0,
        },
    ];
    let result = make_result(
        50_000.0,
        flat_series(&[51_000.0, 52_000.0, 53_000.0]),
        flat_series(&[1000.0, 1000.0, 1000.0]),
        flat_series(&[700.0, 750.0, 850.0]),
        margins,
    );

    let warnings = ForecastValidator::validate(&result, &ValidationThresholds::default()).unwrap();

    assert!(warnings
        .iter()
        .any(|w| matches!(w, ValidationWarning::MarginDecline { month: 3, .. })));
}

#[test]
fn test_margin_compression_warns() {
    let result = make_simple_result(
        50_000.0,
        &[51_000.0, 52_000.0, 53_000.0],
        &[1000.0, 1000.0, 1000.0],
        &[500.0, 600.0, 720.0],
    );

    let warnings = ForecastValidator::validate(&result, &ValidationThresholds::default()).unwrap();

    assert!(warnings.iter().any(|w| matches!(
        w,
        ValidationWarning::MarginCompression {
            months: 2,
            threshold: 2
        }
    )));
}

#[test]
fn test_quality_high_for_rich_stable_history() {
    let tier = ForecastValidator::quality(&healthy_profile(), &ValidationThresholds::default());

    assert_eq!(tier, QualityTier::High);
}

#[test]
fn test_quality_medium_for_moderate_history() {
    let profile = DataProfile {
        eligible_months: 12,
        value_cv: Some(0.5),
        excluded_periods: vec![
            fincast::series::Period::new(2024, 2).unwrap(),
            fincast::series::Period::new(2024, 7).unwrap(),
        ],
        degraded_volatility: false,
    };

    let tier = ForecastValidator::quality(&profile, &ValidationThresholds::default());

    assert_eq!(tier, QualityTier::Medium);
}

#[test]
fn test_quality_low_for_short_volatile_history() {
    let profile = DataProfile {
        eligible_months: 3,
        value_cv: Some(0.9),
        excluded_periods: vec![
            fincast::series::Period::new(2024, 1).unwrap(),
            fincast::series::Period::new(2024, 2).unwrap(),
            fincast::series::Period::new(2024, 3).unwrap(),
            fincast::series::Period::new(2024, 4).unwrap(),
            fincast::series::Period::new(2024, 5).unwrap(),
        ],
        degraded_volatility: true,
    };

    let tier = ForecastValidator::quality(&profile, &ValidationThresholds::default());

    assert_eq!(tier, QualityTier::Low);
}

#[test]
fn test_quality_low_for_empty_history() {
    let profile = DataProfile {
        eligible_months: 0,
        value_cv: None,
        excluded_periods: Vec::new(),
        degraded_volatility: false,
    };

    let tier = ForecastValidator::quality(&profile, &ValidationThresholds::default());

    assert_eq!(tier, QualityTier::Low);
}
