//! The LCOE engine, which turns the parameters for an asset into annual cash flows and
//! techno-economic metrics.
//!
//! The calculation proceeds in order:
//!
//! 1. Discount rates (WACC and CRF) from the financing mix
//! 2. Annual cost, revenue and production series
//! 3. The depreciation schedule and its present value
//! 4. Fixed charge rates, NPVs and annualised costs
//! 5. A year-by-year simulation of cash flows and taxes
//! 6. Lifecycle totals, IRR, payback period and the two LCOE estimates
use crate::depreciation::{DepreciationSchedule, depreciation_schedule};
use crate::finance::{
    annuity_series, capital_recovery_factor, cumulative_from_first_year, discount_factor,
    escalating_series, irr, npv, payback_period,
};
use crate::parameters::{
    DepreciationOverrides, InvalidConfiguration, LcoeOverrides, LcoeParameters,
};
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy};
use log::{debug, warn};

/// Electricity purchased in the first year, before escalation.
///
/// There is currently no purchased-power path (e.g. grid backup) so this is always zero.
const BASE_ELECTRICITY_PURCHASES: Money = Money(0.0);

/// A quantity calculated both before and after tax
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrePostTax<T> {
    /// The before-tax value
    pub before_tax: T,
    /// The after-tax value
    pub after_tax: T,
}

/// Discount rates derived from the financing mix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountRates {
    /// Nominal weighted average cost of capital
    pub wacc_nominal: Dimensionless,
    /// Weighted average cost of capital, deflated to real terms
    pub wacc_real: Dimensionless,
    /// Capital recovery factor over the analysis period at the real WACC
    pub capital_recovery_factor: Dimensionless,
}

impl DiscountRates {
    /// Calculate the discount rates for the given parameters
    pub fn new(parameters: &LcoeParameters) -> Self {
        let one = Dimensionless(1.0);
        let wacc_nominal = parameters.debt_fraction
            * parameters.interest_rate
            * (one - parameters.tax_rate)
            + (one - parameters.debt_fraction) * parameters.cost_of_equity;
        let wacc_real = (one + wacc_nominal) / (one + parameters.inflation) - one;

        Self {
            wacc_nominal,
            wacc_real,
            capital_recovery_factor: capital_recovery_factor(parameters.analysis_period, wacc_real),
        }
    }
}

/// Annual series for operating costs, revenue and production.
///
/// Every series has `analysis_period + 1` entries. Index 0 is the base year, before operation
/// starts, and is zero for all series except `system_augment`, which is taken as given.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatingSeries {
    /// Fixed O&M costs
    pub fixed_om: Vec<Money>,
    /// Variable O&M costs
    pub variable_om: Vec<Money>,
    /// Cost of purchased electricity
    pub electricity_purchases: Vec<Money>,
    /// Revenue from electricity sales
    pub electricity_sales: Vec<Money>,
    /// Additional capital outlays
    pub system_augment: Vec<Money>,
    /// Energy delivered to load
    pub energy_production: Vec<Energy>,
}

impl OperatingSeries {
    /// Build the annual series for the given parameters.
    ///
    /// O&M costs and purchases escalate each year; sales and production are flat.
    pub fn new(parameters: &LcoeParameters) -> Self {
        let years = parameters.analysis_period;
        let no_escalation = Dimensionless(0.0);
        let annual_sales = parameters.annual_production * parameters.electricity_sale_price;

        Self {
            fixed_om: escalating_series(parameters.annual_fixed_om, parameters.escalation, years),
            variable_om: escalating_series(
                parameters.annual_variable_om,
                parameters.escalation,
                years,
            ),
            electricity_purchases: escalating_series(
                BASE_ELECTRICITY_PURCHASES,
                parameters.escalation,
                years,
            ),
            electricity_sales: escalating_series(annual_sales, no_escalation, years),
            system_augment: aligned_augment(&parameters.system_augment, years),
            energy_production: escalating_series(
                parameters.annual_production,
                no_escalation,
                years,
            ),
        }
    }

    /// Total operating cost in the given year, excluding insurance and property tax
    fn cost(&self, year: usize) -> Money {
        self.fixed_om[year]
            + self.variable_om[year]
            + self.electricity_purchases[year]
            + self.system_augment[year]
    }
}

/// Take the first `years + 1` augment values.
///
/// Missing years are treated as having no additional outlay.
fn aligned_augment(system_augment: &[Money], years: u32) -> Vec<Money> {
    let len = years as usize + 1;
    if system_augment.len() < len {
        warn!(
            "system_augment has {} entries but the analysis needs {len}; missing years are \
            treated as zero",
            system_augment.len()
        );
    }

    system_augment
        .iter()
        .copied()
        .chain(std::iter::repeat(Money(0.0)))
        .take(len)
        .collect()
}

/// Net present values of the annual series, all discounted at the real WACC
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetPresentValues {
    /// Fixed O&M costs
    pub fixed_om: Money,
    /// Variable O&M costs
    pub variable_om: Money,
    /// Real depreciation
    pub depreciation: Money,
    /// Energy delivered to load
    pub energy_production: Energy,
    /// Electricity sales
    pub electricity_sales: Money,
    /// Electricity purchases
    pub electricity_purchases: Money,
    /// Additional capital outlays (including the base year)
    pub system_augment: Money,
    /// Total operating costs from the cash-flow simulation
    pub costs: Money,
    /// Insurance and property tax
    pub other_tax: Money,
    /// Net cash flow, including the initial investment
    pub cash_flow: Money,
}

/// Annualised cost components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualisedCosts {
    /// Capital cost, via the fixed charge rates
    pub capex: PrePostTax<Money>,
    /// Fixed O&M
    pub fixed_om: PrePostTax<Money>,
    /// Variable O&M
    pub variable_om: PrePostTax<Money>,
    /// Electricity purchases
    pub electricity_purchases: PrePostTax<Money>,
    /// Electricity sales
    pub electricity_sales: PrePostTax<Money>,
    /// Additional capital outlays
    pub system_augment: PrePostTax<Money>,
}

impl AnnualisedCosts {
    /// The annual revenue required to cover all costs (i.e. every component except sales)
    pub fn annual_revenue_required(&self) -> PrePostTax<Money> {
        let components = [
            self.capex,
            self.fixed_om,
            self.variable_om,
            self.electricity_purchases,
            self.system_augment,
        ];

        PrePostTax {
            before_tax: components.iter().map(|c| c.before_tax).sum(),
            after_tax: components.iter().map(|c| c.after_tax).sum(),
        }
    }
}

/// Annualise a present value, before and after tax
fn annualise(
    present_value: Money,
    capital_recovery_factor: Dimensionless,
    tax_rate: Dimensionless,
) -> PrePostTax<Money> {
    let before_tax = present_value * capital_recovery_factor;
    PrePostTax {
        before_tax,
        after_tax: before_tax * (Dimensionless(1.0) - tax_rate),
    }
}

/// The figures for a single year of the cash-flow simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearlyCashFlow {
    /// Revenue from electricity sales
    pub revenue: Money,
    /// Operating costs, excluding insurance and property tax
    pub cost: Money,
    /// Insurance and property tax
    pub other_tax: Money,
    /// Depreciation claimed this year, including any rolled over from previous years
    pub depreciation_claimed: Money,
    /// Income subject to tax
    pub taxable_income: Money,
    /// Tax paid on income
    pub taxes: Money,
    /// Net cash flow for the year
    pub net_cash_flow: Money,
}

/// Simulate a single year of operation.
///
/// Depreciation which cannot be used against this year's earnings is rolled over to the next
/// year. Returns the figures for the year and the amount of depreciation rolled over.
pub fn cash_flow_year(
    revenue: Money,
    cost: Money,
    other_tax: Money,
    depreciation: Money,
    rollover: Money,
    tax_rate: Dimensionless,
) -> (YearlyCashFlow, Money) {
    let ebit = revenue - cost;
    let depreciation_claimed = depreciation + rollover;
    let earnings_after_depreciation = ebit - depreciation_claimed;
    let (taxable_income, next_rollover) = if earnings_after_depreciation < Money(0.0) {
        (Money(0.0), -earnings_after_depreciation)
    } else {
        (earnings_after_depreciation, Money(0.0))
    };
    let taxes = taxable_income * tax_rate;

    let year = YearlyCashFlow {
        revenue,
        cost,
        other_tax,
        depreciation_claimed,
        taxable_income,
        taxes,
        net_cash_flow: ebit - taxes - other_tax,
    };

    (year, next_rollover)
}

/// Annual results of the cash-flow simulation.
///
/// Every series has `analysis_period + 1` entries. Index 0 is the base year, in which the only
/// cash flow is the initial equity investment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CashFlows {
    /// Revenue from electricity sales
    pub revenues: Vec<Money>,
    /// Operating costs, excluding insurance and property tax
    pub costs: Vec<Money>,
    /// Insurance and property tax
    pub other_tax: Vec<Money>,
    /// Depreciation claimed, including rollover from previous years
    pub depreciation_claimed: Vec<Money>,
    /// Income subject to tax
    pub taxable_income: Vec<Money>,
    /// Tax paid on income
    pub taxes: Vec<Money>,
    /// Net cash flow
    pub net_cash_flow: Vec<Money>,
    /// Cumulative net cash flow from year 1, excluding the initial investment
    pub cumulative_cash_flow: Vec<Money>,
}

impl CashFlows {
    /// Append the figures for one year
    fn push(&mut self, year: &YearlyCashFlow) {
        self.revenues.push(year.revenue);
        self.costs.push(year.cost);
        self.other_tax.push(year.other_tax);
        self.depreciation_claimed.push(year.depreciation_claimed);
        self.taxable_income.push(year.taxable_income);
        self.taxes.push(year.taxes);
        self.net_cash_flow.push(year.net_cash_flow);
    }
}

/// Run the year-by-year cash-flow simulation
fn simulate_cash_flows(
    series: &OperatingSeries,
    depreciation: &[Money],
    other_tax: Money,
    initial_investment: Money,
    tax_rate: Dimensionless,
) -> CashFlows {
    let mut cash_flows = CashFlows::default();
    cash_flows.push(&YearlyCashFlow {
        revenue: Money(0.0),
        cost: Money(0.0),
        other_tax: Money(0.0),
        depreciation_claimed: Money(0.0),
        taxable_income: Money(0.0),
        taxes: Money(0.0),
        net_cash_flow: -initial_investment,
    });

    let mut rollover = Money(0.0);
    for year in 1..series.electricity_sales.len() {
        let (figures, next_rollover) = cash_flow_year(
            series.electricity_sales[year],
            series.cost(year),
            other_tax,
            depreciation[year],
            rollover,
            tax_rate,
        );
        cash_flows.push(&figures);
        rollover = next_rollover;
    }

    cash_flows.cumulative_cash_flow = cumulative_from_first_year(&cash_flows.net_cash_flow);
    cash_flows
}

/// Present value of the depreciable fractions over the depreciation period
pub fn present_value_of_depreciation(
    fractions: &[Dimensionless],
    discount_rate: Dimensionless,
    depreciation_period: u32,
) -> Dimensionless {
    fractions
        .iter()
        .zip(0..=depreciation_period)
        .map(|(fraction, year)| *fraction * discount_factor(discount_rate, year))
        .sum()
}

/// Calculate the after-tax-deduction and before-tax-revenue-required fixed charge rates
pub fn fixed_charge_rates(
    capital_recovery_factor: Dimensionless,
    present_value_of_depreciation: Dimensionless,
    parameters: &LcoeParameters,
) -> PrePostTax<Dimensionless> {
    let one = Dimensionless(1.0);
    let tax = parameters.tax_rate;
    let itc = parameters.investment_tax_credit;
    let capital_charge = capital_recovery_factor
        * (one - tax * present_value_of_depreciation * (one - itc / Dimensionless(2.0)) - itc);

    PrePostTax {
        after_tax: capital_charge
            + parameters.insurance_rate * (one - tax)
            + parameters.property_tax_rate * (one - tax),
        before_tax: (capital_charge + parameters.insurance_rate + parameters.property_tax_rate)
            / (one - tax),
    }
}

/// Total lifecycle cost, before and after tax
fn total_lifecycle_cost(
    initial_investment: Money,
    net_present_values: &NetPresentValues,
    tax_rate: Dimensionless,
) -> PrePostTax<Money> {
    let one = Dimensionless(1.0);
    let net_of_tax_shield = initial_investment - net_present_values.depreciation * tax_rate
        + net_present_values.costs * (one - tax_rate);

    PrePostTax {
        after_tax: net_of_tax_shield + net_present_values.other_tax * (one - tax_rate),
        before_tax: net_of_tax_shield / (one - tax_rate)
            + net_present_values.other_tax / (one - tax_rate),
    }
}

/// The full set of techno-economic metrics for an asset
#[derive(Debug, Clone, PartialEq)]
pub struct LcoeMetrics {
    /// WACC and capital recovery factor
    pub discount_rates: DiscountRates,
    /// Present value of depreciation (PVD), as a fraction of the depreciable base
    pub present_value_of_depreciation: Dimensionless,
    /// Fixed charge rates (FCR)
    pub fixed_charge_rates: PrePostTax<Dimensionless>,
    /// Annual cost, revenue and production series
    pub series: OperatingSeries,
    /// Depreciation schedule for the grant-adjusted capex
    pub depreciation: DepreciationSchedule,
    /// Net present values of the annual series
    pub net_present_values: NetPresentValues,
    /// Annualised cost components
    pub annualised: AnnualisedCosts,
    /// Annual revenue required (ARR) to cover all costs
    pub annual_revenue_required: PrePostTax<Money>,
    /// Results of the year-by-year simulation
    pub cash_flows: CashFlows,
    /// Initial equity investment, net of investment tax credit and grant
    pub initial_investment: Money,
    /// Internal rate of return of the net cash flows, if defined
    pub irr: Option<Dimensionless>,
    /// First year in which the initial investment has been recovered, if any
    pub payback_period: Option<u32>,
    /// Total lifecycle cost (TLCC)
    pub total_lifecycle_cost: PrePostTax<Money>,
    /// LCOE derived from the total lifecycle cost
    pub lcoe: PrePostTax<MoneyPerEnergy>,
    /// LCOE derived from the annual revenue required, in real terms
    pub lcoe_real: PrePostTax<MoneyPerEnergy>,
    /// Electricity purchased in the first year, before escalation
    pub annual_electricity_purchases: Money,
    /// Revenue from electricity sales each year
    pub annual_electricity_sales: Money,
}

/// Calculate all metrics for an asset.
///
/// The parameters are not validated: degenerate inputs give degenerate (e.g. non-finite) results.
/// See [`LcoeParameters::validate`].
pub fn calculate_metrics(parameters: &LcoeParameters) -> LcoeMetrics {
    let one = Dimensionless(1.0);
    let tax_rate = parameters.tax_rate;
    let years = parameters.analysis_period;

    let discount_rates = DiscountRates::new(parameters);
    let wacc_real = discount_rates.wacc_real;
    let crf = discount_rates.capital_recovery_factor;
    debug!(
        "WACC (nominal): {}, WACC (real): {wacc_real}, CRF: {crf}",
        discount_rates.wacc_nominal
    );

    let series = OperatingSeries::new(parameters);
    let capex = parameters.grant_adjusted_capex();
    let depreciation = depreciation_schedule(
        capex,
        parameters.investment_tax_credit,
        parameters.inflation,
        parameters.depreciation_period,
        years,
    );
    let present_value_of_depreciation = present_value_of_depreciation(
        &depreciation.fractions,
        wacc_real,
        parameters.depreciation_period,
    );
    let fixed_charge_rates = fixed_charge_rates(crf, present_value_of_depreciation, parameters);

    let npv_fixed_om = npv(wacc_real, &series.fixed_om);
    let npv_variable_om = npv(wacc_real, &series.variable_om);
    let npv_electricity_purchases = npv(wacc_real, &series.electricity_purchases);
    let npv_electricity_sales = npv(wacc_real, &series.electricity_sales);
    let npv_system_augment = npv(wacc_real, &series.system_augment);
    let annualised = AnnualisedCosts {
        capex: PrePostTax {
            before_tax: capex * fixed_charge_rates.before_tax,
            after_tax: capex * fixed_charge_rates.after_tax,
        },
        fixed_om: annualise(npv_fixed_om, crf, tax_rate),
        variable_om: annualise(npv_variable_om, crf, tax_rate),
        electricity_purchases: annualise(npv_electricity_purchases, crf, tax_rate),
        electricity_sales: annualise(npv_electricity_sales, crf, tax_rate),
        system_augment: annualise(npv_system_augment, crf, tax_rate),
    };
    let annual_revenue_required = annualised.annual_revenue_required();

    let initial_investment = parameters.system_capex
        * (one - parameters.investment_tax_credit)
        * (one - parameters.grant_percentage);
    let other_tax = parameters.insurance_rate * capex + parameters.property_tax_rate * capex;
    let cash_flows = simulate_cash_flows(
        &series,
        &depreciation.values,
        other_tax,
        initial_investment,
        tax_rate,
    );

    let net_present_values = NetPresentValues {
        fixed_om: npv_fixed_om,
        variable_om: npv_variable_om,
        depreciation: npv(wacc_real, &depreciation.values),
        energy_production: npv(wacc_real, &series.energy_production),
        electricity_sales: npv_electricity_sales,
        electricity_purchases: npv_electricity_purchases,
        system_augment: npv_system_augment,
        costs: npv(wacc_real, &cash_flows.costs),
        other_tax: npv(wacc_real, &cash_flows.other_tax),
        cash_flow: npv(wacc_real, &cash_flows.net_cash_flow),
    };

    let total_lifecycle_cost =
        total_lifecycle_cost(initial_investment, &net_present_values, tax_rate);
    let energy = net_present_values.energy_production;
    let lcoe = PrePostTax {
        before_tax: total_lifecycle_cost.before_tax / energy,
        after_tax: total_lifecycle_cost.after_tax / energy,
    };
    let lcoe_real = PrePostTax {
        before_tax: npv(
            wacc_real,
            &annuity_series(annual_revenue_required.before_tax, years),
        ) / energy,
        after_tax: npv(
            wacc_real,
            &annuity_series(annual_revenue_required.after_tax, years),
        ) / energy,
    };

    LcoeMetrics {
        discount_rates,
        present_value_of_depreciation,
        fixed_charge_rates,
        irr: irr(&cash_flows.net_cash_flow),
        payback_period: payback_period(&cash_flows.net_cash_flow),
        annual_electricity_purchases: BASE_ELECTRICITY_PURCHASES,
        annual_electricity_sales: parameters.annual_production * parameters.electricity_sale_price,
        series,
        depreciation,
        net_present_values,
        annualised,
        annual_revenue_required,
        cash_flows,
        initial_investment,
        total_lifecycle_cost,
        lcoe,
        lcoe_real,
    }
}

/// Calculates LCOE and related metrics for a single asset.
///
/// Stores a default set of parameters, any of which can be overridden for an individual
/// calculation. The stored parameters are never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct LcoeCalculator {
    parameters: LcoeParameters,
}

impl LcoeCalculator {
    /// Create a new calculator with the given default parameters
    pub fn new(parameters: LcoeParameters) -> Self {
        Self { parameters }
    }

    /// The stored default parameters
    pub fn parameters(&self) -> &LcoeParameters {
        &self.parameters
    }

    /// Calculate the depreciation schedule, applying the given overrides to the stored parameters.
    ///
    /// Note that `system_capex` is used as-is, without deducting any grant.
    pub fn depreciation(&self, overrides: &DepreciationOverrides) -> DepreciationSchedule {
        let parameters = &self.parameters;
        depreciation_schedule(
            overrides.system_capex.unwrap_or(parameters.system_capex),
            overrides
                .investment_tax_credit
                .unwrap_or(parameters.investment_tax_credit),
            overrides.inflation.unwrap_or(parameters.inflation),
            overrides
                .depreciation_period
                .unwrap_or(parameters.depreciation_period),
            overrides
                .analysis_period
                .unwrap_or(parameters.analysis_period),
        )
    }

    /// Calculate all metrics, applying the given overrides to the stored parameters.
    ///
    /// The merged parameters are not validated.
    pub fn calculate_metrics(&self, overrides: &LcoeOverrides) -> LcoeMetrics {
        log_unused_overrides(overrides);
        calculate_metrics(&self.parameters.with_overrides(overrides))
    }

    /// As [`LcoeCalculator::calculate_metrics`], but validating the merged parameters first
    pub fn calculate_metrics_checked(
        &self,
        overrides: &LcoeOverrides,
    ) -> Result<LcoeMetrics, InvalidConfiguration> {
        let parameters = self.parameters.with_overrides(overrides);
        parameters.validate()?;
        log_unused_overrides(overrides);

        Ok(calculate_metrics(&parameters))
    }
}

/// Note any overrides which are accepted but have no effect
fn log_unused_overrides(overrides: &LcoeOverrides) {
    if let Some(gas_cost) = overrides.gas_cost {
        debug!("Ignoring gas_cost ({gas_cost}): fuel costs are not yet part of the calculation");
    }
}
