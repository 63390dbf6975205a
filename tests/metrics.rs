//! Integration tests for calculating metrics through the public API.
use enliten::input::load_parameters;
use enliten::metrics::LcoeCalculator;
use enliten::parameters::{InvalidConfiguration, LcoeOverrides, LcoeParameters};
use enliten::units::{Dimensionless, Energy, Money, MoneyPerEnergy};
use float_cmp::assert_approx_eq;
use std::path::Path;

/// Get the calculator for the default example asset.
fn default_calculator() -> LcoeCalculator {
    let parameters = load_parameters(Path::new("demos/default/inputs.toml")).unwrap();
    LcoeCalculator::new(parameters)
}

#[test]
fn test_default_example_matches_defaults() {
    let expected = LcoeParameters::new(
        Money(1_000_000.0),
        Money(10_000.0),
        Money(5_000.0),
        Energy::from_mwh(2000.0),
        vec![Money(0.0); 31],
    );
    assert_eq!(default_calculator().parameters(), &expected);
}

#[test]
fn test_default_example_metrics() {
    let metrics = default_calculator().calculate_metrics(&LcoeOverrides::default());
    assert_approx_eq!(
        MoneyPerEnergy,
        metrics.lcoe.after_tax,
        MoneyPerEnergy(0.025_827_086_379_715_39),
        epsilon = 1e-12
    );
    assert_approx_eq!(
        MoneyPerEnergy,
        metrics.lcoe.before_tax,
        MoneyPerEnergy(0.036_905_096_069_603_49),
        epsilon = 1e-12
    );
    assert_approx_eq!(
        Dimensionless,
        metrics.irr.unwrap(),
        Dimensionless(0.194_538_364_453_728_52),
        epsilon = 1e-9
    );
    assert_eq!(metrics.payback_period, Some(5));
}

#[test]
fn test_lcoe_falls_with_production() {
    let calculator = default_calculator();
    let lcoe_for = |mwh: f64| {
        let overrides = LcoeOverrides {
            annual_production: Some(Energy::from_mwh(mwh)),
            ..Default::default()
        };
        calculator.calculate_metrics(&overrides).lcoe.after_tax
    };

    let lcoes: Vec<_> = [500.0, 1000.0, 2000.0, 4000.0]
        .into_iter()
        .map(lcoe_for)
        .collect();
    assert!(lcoes.windows(2).all(|pair| pair[0] > pair[1]));
}

#[test]
fn test_cumulative_cash_flow_consistent() {
    let metrics = default_calculator().calculate_metrics(&LcoeOverrides::default());
    let cash_flows = &metrics.cash_flows;
    let total: Money = cash_flows.net_cash_flow[1..].iter().copied().sum();
    assert_approx_eq!(
        Money,
        *cash_flows.cumulative_cash_flow.last().unwrap(),
        total,
        epsilon = 1e-6
    );
    assert_eq!(cash_flows.net_cash_flow[0], -metrics.initial_investment);
}

#[test]
fn test_overrides_leave_defaults_unchanged() {
    let calculator = default_calculator();
    let before = calculator.parameters().clone();
    let overrides = LcoeOverrides {
        tax_rate: Some(Dimensionless(0.3)),
        analysis_period: Some(20),
        system_augment: Some(vec![Money(0.0); 21]),
        ..Default::default()
    };

    let metrics = calculator.calculate_metrics(&overrides);
    assert_eq!(metrics.cash_flows.net_cash_flow.len(), 21);
    assert_eq!(calculator.parameters(), &before);
}

#[test]
fn test_checked_calculation_rejects_invalid() {
    let calculator = default_calculator();
    let overrides = LcoeOverrides {
        tax_rate: Some(Dimensionless(1.0)),
        ..Default::default()
    };
    assert_eq!(
        calculator.calculate_metrics_checked(&overrides).unwrap_err(),
        InvalidConfiguration::TaxRateOfOne
    );

    // The default asset is valid
    assert!(
        calculator
            .calculate_metrics_checked(&LcoeOverrides::default())
            .is_ok()
    );
}
