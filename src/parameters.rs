//! Defines the `LcoeParameters` struct, which holds the financial and physical assumptions for an
//! asset, along with the per-call overrides which can be applied on top of it.
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy, UnitType};
use log::warn;
use thiserror::Error;

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        /// Default value for the parameter of the same name
        pub fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        /// Default value for the parameter of the same name
        pub fn $name() -> $type {
            $value
        }
    };
}

define_unit_param_default!(default_investment_tax_credit, Dimensionless, 0.5);
define_unit_param_default!(default_debt_fraction, Dimensionless, 0.5);
define_unit_param_default!(default_cost_of_equity, Dimensionless, 0.13);
define_unit_param_default!(default_interest_rate, Dimensionless, 0.08);
define_unit_param_default!(default_grant_percentage, Dimensionless, 0.0);
define_unit_param_default!(default_tax_rate, Dimensionless, 0.257);
define_unit_param_default!(default_inflation, Dimensionless, 0.028);
define_unit_param_default!(default_property_tax_rate, Dimensionless, 0.0084);
define_unit_param_default!(default_insurance_rate, Dimensionless, 0.004);
define_param_default!(default_depreciation_period, u32, 5);
define_unit_param_default!(default_escalation, Dimensionless, 0.028);
define_param_default!(default_analysis_period, u32, 30);
define_unit_param_default!(default_variable_om_unit_cost, MoneyPerEnergy, 0.003);
define_unit_param_default!(default_electricity_sale_price, MoneyPerEnergy, 0.07);

/// The assumptions describing a generation asset and how it is financed.
#[derive(Debug, Clone, PartialEq)]
pub struct LcoeParameters {
    /// Total capital expenditure on the system
    pub system_capex: Money,
    /// Fixed operation and maintenance costs in the first year of operation, before escalation
    pub annual_fixed_om: Money,
    /// Variable operation and maintenance costs in the first year of operation, before escalation
    pub annual_variable_om: Money,
    /// Energy delivered to load each year
    pub annual_production: Energy,
    /// Additional capital outlays (e.g. equipment replacement) for each year.
    ///
    /// Index 0 is the base year; there should be at least `analysis_period + 1` entries.
    pub system_augment: Vec<Money>,
    /// Investment tax credit, as a fraction of capex
    pub investment_tax_credit: Dimensionless,
    /// Fraction of capital financed with debt
    pub debt_fraction: Dimensionless,
    /// Rate of return on equity-financed capital
    pub cost_of_equity: Dimensionless,
    /// Interest rate on debt
    pub interest_rate: Dimensionless,
    /// Fraction of capex covered by a grant
    pub grant_percentage: Dimensionless,
    /// Combined state and federal tax rate
    pub tax_rate: Dimensionless,
    /// Annual inflation rate
    pub inflation: Dimensionless,
    /// Property tax, as a fraction of (grant-adjusted) capex per year
    pub property_tax_rate: Dimensionless,
    /// Insurance, as a fraction of (grant-adjusted) capex per year
    pub insurance_rate: Dimensionless,
    /// Number of years over which the asset is depreciated
    pub depreciation_period: u32,
    /// Annual escalation rate for O&M costs
    pub escalation: Dimensionless,
    /// Number of years of operation covered by the analysis
    pub analysis_period: u32,
    /// Variable O&M cost per unit of energy.
    ///
    /// Carried with the asset description but not currently used in the calculation, which takes
    /// variable O&M from `annual_variable_om`.
    pub variable_om_unit_cost: MoneyPerEnergy,
    /// Price at which electricity is sold
    pub electricity_sale_price: MoneyPerEnergy,
}

impl LcoeParameters {
    /// Create parameters for an asset, using default values for all financial assumptions
    pub fn new(
        system_capex: Money,
        annual_fixed_om: Money,
        annual_variable_om: Money,
        annual_production: Energy,
        system_augment: Vec<Money>,
    ) -> Self {
        Self {
            system_capex,
            annual_fixed_om,
            annual_variable_om,
            annual_production,
            system_augment,
            investment_tax_credit: default_investment_tax_credit(),
            debt_fraction: default_debt_fraction(),
            cost_of_equity: default_cost_of_equity(),
            interest_rate: default_interest_rate(),
            grant_percentage: default_grant_percentage(),
            tax_rate: default_tax_rate(),
            inflation: default_inflation(),
            property_tax_rate: default_property_tax_rate(),
            insurance_rate: default_insurance_rate(),
            depreciation_period: default_depreciation_period(),
            escalation: default_escalation(),
            analysis_period: default_analysis_period(),
            variable_om_unit_cost: default_variable_om_unit_cost(),
            electricity_sale_price: default_electricity_sale_price(),
        }
    }

    /// Capex remaining after any grant has been deducted
    pub fn grant_adjusted_capex(&self) -> Money {
        self.system_capex * (Dimensionless(1.0) - self.grant_percentage)
    }

    /// A copy of these parameters with the given overrides applied
    pub fn with_overrides(&self, overrides: &LcoeOverrides) -> Self {
        Self {
            system_capex: overrides.system_capex.unwrap_or(self.system_capex),
            annual_fixed_om: overrides.annual_fixed_om.unwrap_or(self.annual_fixed_om),
            annual_variable_om: overrides
                .annual_variable_om
                .unwrap_or(self.annual_variable_om),
            annual_production: overrides.annual_production.unwrap_or(self.annual_production),
            system_augment: overrides
                .system_augment
                .clone()
                .unwrap_or_else(|| self.system_augment.clone()),
            investment_tax_credit: overrides
                .investment_tax_credit
                .unwrap_or(self.investment_tax_credit),
            debt_fraction: overrides.debt_fraction.unwrap_or(self.debt_fraction),
            cost_of_equity: overrides.cost_of_equity.unwrap_or(self.cost_of_equity),
            interest_rate: overrides.interest_rate.unwrap_or(self.interest_rate),
            grant_percentage: overrides.grant_percentage.unwrap_or(self.grant_percentage),
            tax_rate: overrides.tax_rate.unwrap_or(self.tax_rate),
            inflation: overrides.inflation.unwrap_or(self.inflation),
            property_tax_rate: overrides.property_tax_rate.unwrap_or(self.property_tax_rate),
            insurance_rate: overrides.insurance_rate.unwrap_or(self.insurance_rate),
            depreciation_period: overrides
                .depreciation_period
                .unwrap_or(self.depreciation_period),
            escalation: overrides.escalation.unwrap_or(self.escalation),
            analysis_period: overrides.analysis_period.unwrap_or(self.analysis_period),
            variable_om_unit_cost: overrides
                .variable_om_unit_cost
                .unwrap_or(self.variable_om_unit_cost),
            electricity_sale_price: overrides
                .electricity_sale_price
                .unwrap_or(self.electricity_sale_price),
        }
    }

    /// Check that the parameters describe a well-formed asset.
    ///
    /// A depreciation period longer than the analysis period is allowed (the schedule is
    /// truncated), but a warning is emitted.
    pub fn validate(&self) -> Result<(), InvalidConfiguration> {
        check_non_negative("system_capex", self.system_capex)?;
        check_non_negative("annual_fixed_om", self.annual_fixed_om)?;
        check_non_negative("annual_variable_om", self.annual_variable_om)?;
        check_positive_production(self.annual_production)?;
        for value in &self.system_augment {
            check_finite("system_augment", *value)?;
        }

        check_proportion("investment_tax_credit", self.investment_tax_credit)?;
        check_proportion("debt_fraction", self.debt_fraction)?;
        check_proportion("grant_percentage", self.grant_percentage)?;
        check_proportion("tax_rate", self.tax_rate)?;
        check_proportion("property_tax_rate", self.property_tax_rate)?;
        check_proportion("insurance_rate", self.insurance_rate)?;
        if self.tax_rate == Dimensionless(1.0) {
            return Err(InvalidConfiguration::TaxRateOfOne);
        }

        check_finite("cost_of_equity", self.cost_of_equity)?;
        check_finite("interest_rate", self.interest_rate)?;
        check_finite("inflation", self.inflation)?;
        check_finite("escalation", self.escalation)?;
        check_finite("variable_om_unit_cost", self.variable_om_unit_cost)?;
        check_finite("electricity_sale_price", self.electricity_sale_price)?;

        check_period("analysis_period", self.analysis_period)?;
        check_period("depreciation_period", self.depreciation_period)?;
        if self.depreciation_period > self.analysis_period {
            warn!(
                "depreciation_period ({}) is longer than analysis_period ({}); depreciation after \
                the end of the analysis period will be ignored",
                self.depreciation_period, self.analysis_period
            );
        }

        check_augment_length(&self.system_augment, self.analysis_period)
    }
}

/// Per-call overrides for [`LcoeParameters`].
///
/// Any field which is `None` falls back to the stored value. Fields have the same meaning as in
/// [`LcoeParameters`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LcoeOverrides {
    pub system_capex: Option<Money>,
    pub annual_fixed_om: Option<Money>,
    pub annual_variable_om: Option<Money>,
    pub annual_production: Option<Energy>,
    pub system_augment: Option<Vec<Money>>,
    pub investment_tax_credit: Option<Dimensionless>,
    pub debt_fraction: Option<Dimensionless>,
    pub cost_of_equity: Option<Dimensionless>,
    pub interest_rate: Option<Dimensionless>,
    pub grant_percentage: Option<Dimensionless>,
    pub tax_rate: Option<Dimensionless>,
    pub inflation: Option<Dimensionless>,
    pub property_tax_rate: Option<Dimensionless>,
    pub insurance_rate: Option<Dimensionless>,
    pub depreciation_period: Option<u32>,
    pub escalation: Option<Dimensionless>,
    pub analysis_period: Option<u32>,
    pub variable_om_unit_cost: Option<MoneyPerEnergy>,
    pub electricity_sale_price: Option<MoneyPerEnergy>,
    /// Reserved for a fuel cost input. Accepted but not yet used in the calculation.
    pub gas_cost: Option<MoneyPerEnergy>,
}

/// Per-call overrides for the inputs to a depreciation schedule.
///
/// Any field which is `None` falls back to the stored value in [`LcoeParameters`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepreciationOverrides {
    pub analysis_period: Option<u32>,
    pub system_capex: Option<Money>,
    pub inflation: Option<Dimensionless>,
    pub depreciation_period: Option<u32>,
    pub investment_tax_credit: Option<Dimensionless>,
}

/// Indicates that the parameters for an asset are invalid
#[allow(missing_docs)]
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidConfiguration {
    /// A parameter is infinite or NaN
    #[error("{name} must be a finite number, got {value}")]
    NonFinite { name: &'static str, value: f64 },
    /// A monetary value is negative
    #[error("{name} cannot be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    /// A fraction lies outside [0, 1]
    #[error("{name} must be between 0 and 1, got {value}")]
    NotAProportion { name: &'static str, value: f64 },
    /// Before-tax figures are undefined for a tax rate of 100%
    #[error("tax_rate must be less than 1")]
    TaxRateOfOne,
    /// A period of zero years
    #[error("{name} must be at least one year")]
    ZeroPeriod { name: &'static str },
    /// LCOE is undefined without any production
    #[error("annual_production must be greater than zero, got {0}")]
    NonPositiveProduction(f64),
    /// Not enough entries to cover every year of the analysis
    #[error("system_augment has {actual} entries, but at least {required} are needed")]
    AugmentTooShort { required: usize, actual: usize },
}

/// Check that a parameter is finite
fn check_finite<T: UnitType>(name: &'static str, value: T) -> Result<(), InvalidConfiguration> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvalidConfiguration::NonFinite {
            name,
            value: value.value(),
        })
    }
}

/// Check that a monetary parameter is finite and non-negative
fn check_non_negative(name: &'static str, value: Money) -> Result<(), InvalidConfiguration> {
    check_finite(name, value)?;
    if value < Money(0.0) {
        return Err(InvalidConfiguration::Negative {
            name,
            value: value.0,
        });
    }

    Ok(())
}

/// Check that a parameter is between 0 and 1
fn check_proportion(name: &'static str, value: Dimensionless) -> Result<(), InvalidConfiguration> {
    if (0.0..=1.0).contains(&value.0) {
        Ok(())
    } else {
        Err(InvalidConfiguration::NotAProportion {
            name,
            value: value.0,
        })
    }
}

/// Check that a period covers at least one year
fn check_period(name: &'static str, value: u32) -> Result<(), InvalidConfiguration> {
    if value == 0 {
        return Err(InvalidConfiguration::ZeroPeriod { name });
    }

    Ok(())
}

/// Check that `annual_production` is a finite, positive amount
fn check_positive_production(value: Energy) -> Result<(), InvalidConfiguration> {
    check_finite("annual_production", value)?;
    if value <= Energy(0.0) {
        return Err(InvalidConfiguration::NonPositiveProduction(value.0));
    }

    Ok(())
}

/// Check there is an augment value for the base year and every year of the analysis
fn check_augment_length(
    system_augment: &[Money],
    analysis_period: u32,
) -> Result<(), InvalidConfiguration> {
    let required = analysis_period as usize + 1;
    if system_augment.len() < required {
        return Err(InvalidConfiguration::AugmentTooShort {
            required,
            actual: system_augment.len(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::parameters;
    use rstest::rstest;

    #[rstest]
    fn test_new_uses_defaults(parameters: LcoeParameters) {
        assert_eq!(parameters.investment_tax_credit, Dimensionless(0.5));
        assert_eq!(parameters.debt_fraction, Dimensionless(0.5));
        assert_eq!(parameters.cost_of_equity, Dimensionless(0.13));
        assert_eq!(parameters.interest_rate, Dimensionless(0.08));
        assert_eq!(parameters.grant_percentage, Dimensionless(0.0));
        assert_eq!(parameters.tax_rate, Dimensionless(0.257));
        assert_eq!(parameters.inflation, Dimensionless(0.028));
        assert_eq!(parameters.property_tax_rate, Dimensionless(0.0084));
        assert_eq!(parameters.insurance_rate, Dimensionless(0.004));
        assert_eq!(parameters.depreciation_period, 5);
        assert_eq!(parameters.escalation, Dimensionless(0.028));
        assert_eq!(parameters.analysis_period, 30);
        assert_eq!(parameters.variable_om_unit_cost, MoneyPerEnergy(0.003));
        assert_eq!(parameters.electricity_sale_price, MoneyPerEnergy(0.07));
    }

    #[rstest]
    fn test_with_overrides_empty(parameters: LcoeParameters) {
        assert_eq!(
            parameters.with_overrides(&LcoeOverrides::default()),
            parameters
        );
    }

    #[rstest]
    fn test_with_overrides(parameters: LcoeParameters) {
        let overrides = LcoeOverrides {
            system_capex: Some(Money(5.0)),
            tax_rate: Some(Dimensionless(0.1)),
            analysis_period: Some(3),
            system_augment: Some(vec![Money(1.0); 4]),
            ..Default::default()
        };
        let merged = parameters.with_overrides(&overrides);
        assert_eq!(merged.system_capex, Money(5.0));
        assert_eq!(merged.tax_rate, Dimensionless(0.1));
        assert_eq!(merged.analysis_period, 3);
        assert_eq!(merged.system_augment, vec![Money(1.0); 4]);

        // Everything else is untouched
        assert_eq!(merged.annual_fixed_om, parameters.annual_fixed_om);
        assert_eq!(merged.inflation, parameters.inflation);
        assert_eq!(merged.depreciation_period, parameters.depreciation_period);
    }

    #[rstest]
    fn test_grant_adjusted_capex(mut parameters: LcoeParameters) {
        parameters.grant_percentage = Dimensionless(0.25);
        assert_eq!(parameters.grant_adjusted_capex(), Money(750_000.0));
        parameters.grant_percentage = Dimensionless(1.0);
        assert_eq!(parameters.grant_adjusted_capex(), Money(0.0));
    }

    #[rstest]
    fn test_validate_ok(parameters: LcoeParameters) {
        assert_eq!(parameters.validate(), Ok(()));
    }

    #[rstest]
    fn test_validate_long_depreciation_period_ok(mut parameters: LcoeParameters) {
        parameters.depreciation_period = 40;
        assert_eq!(parameters.validate(), Ok(()));
    }

    #[rstest]
    #[case(LcoeOverrides {
        system_capex: Some(Money(-1.0)),
        ..Default::default()
    }, InvalidConfiguration::Negative { name: "system_capex", value: -1.0 })]
    #[case(LcoeOverrides {
        annual_fixed_om: Some(Money(f64::INFINITY)),
        ..Default::default()
    }, InvalidConfiguration::NonFinite { name: "annual_fixed_om", value: f64::INFINITY })]
    #[case(LcoeOverrides {
        annual_production: Some(Energy(0.0)),
        ..Default::default()
    }, InvalidConfiguration::NonPositiveProduction(0.0))]
    #[case(LcoeOverrides {
        debt_fraction: Some(Dimensionless(1.5)),
        ..Default::default()
    }, InvalidConfiguration::NotAProportion { name: "debt_fraction", value: 1.5 })]
    #[case(LcoeOverrides {
        grant_percentage: Some(Dimensionless(-0.1)),
        ..Default::default()
    }, InvalidConfiguration::NotAProportion { name: "grant_percentage", value: -0.1 })]
    #[case(LcoeOverrides {
        tax_rate: Some(Dimensionless(1.0)),
        ..Default::default()
    }, InvalidConfiguration::TaxRateOfOne)]
    #[case(LcoeOverrides {
        analysis_period: Some(0),
        ..Default::default()
    }, InvalidConfiguration::ZeroPeriod { name: "analysis_period" })]
    #[case(LcoeOverrides {
        depreciation_period: Some(0),
        ..Default::default()
    }, InvalidConfiguration::ZeroPeriod { name: "depreciation_period" })]
    #[case(LcoeOverrides {
        system_augment: Some(vec![Money(0.0); 30]),
        ..Default::default()
    }, InvalidConfiguration::AugmentTooShort { required: 31, actual: 30 })]
    fn test_validate_invalid(
        parameters: LcoeParameters,
        #[case] overrides: LcoeOverrides,
        #[case] expected: InvalidConfiguration,
    ) {
        assert_eq!(parameters.with_overrides(&overrides).validate(), Err(expected));
    }

    #[test]
    fn test_invalid_configuration_message() {
        let err = InvalidConfiguration::AugmentTooShort {
            required: 31,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "system_augment has 2 entries, but at least 31 are needed"
        );
    }
}
