//! Double-declining-balance depreciation schedules.
//!
//! Depreciation is claimed in nominal terms against the remaining book value of the asset, then
//! deflated to real terms so that it can be discounted at a real rate alongside the other cash
//! flows.
use crate::units::{Dimensionless, Money};

/// The depreciation claimed in each year of the analysis period.
///
/// Both series have one entry per year of the analysis period plus the base year (index 0), for
/// which they are always zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DepreciationSchedule {
    /// Depreciation claimed in each year, in real terms
    pub values: Vec<Money>,
    /// Each year's real depreciation as a fraction of the depreciable base
    pub fractions: Vec<Dimensionless>,
}

/// The outcome of depreciating an asset for a single year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepreciationStep {
    /// Depreciation claimed this year, in nominal terms
    pub nominal: Money,
    /// Depreciation claimed this year, deflated to real terms
    pub real: Money,
    /// Book value left at the end of the year
    pub remaining_book_value: Money,
}

/// The capital base against which depreciation is claimed.
///
/// Half of any investment tax credit is deducted from the base.
pub fn depreciable_base(capex: Money, investment_tax_credit: Dimensionless) -> Money {
    capex * (Dimensionless(1.0) - investment_tax_credit / Dimensionless(2.0))
}

/// The double-declining-balance rate for the given depreciation period.
///
/// Returns `None` for a zero-length period, for which no depreciation can be claimed.
pub fn double_declining_rate(depreciation_period: u32) -> Option<Dimensionless> {
    (depreciation_period > 0).then(|| Dimensionless(2.0 / f64::from(depreciation_period)))
}

/// Depreciate an asset for one year.
///
/// The amount claimed never exceeds the remaining book value, which therefore never becomes
/// negative.
pub fn depreciation_step(
    remaining_book_value: Money,
    rate: Dimensionless,
    inflation: Dimensionless,
    year: u32,
) -> DepreciationStep {
    let nominal = Money((remaining_book_value * rate).0.min(remaining_book_value.0));
    let real = nominal * (Dimensionless(1.0) - inflation).pow_years(year);

    DepreciationStep {
        nominal,
        real,
        remaining_book_value: remaining_book_value - nominal,
    }
}

/// Calculate the depreciation schedule for an asset.
///
/// Depreciation is only claimed for years `1..=depreciation_period`; any later years of the
/// analysis period (and any depreciation periods running past the end of the analysis period) are
/// ignored.
///
/// # Arguments
///
/// * `capex` - Capital expenditure, net of any grant
/// * `investment_tax_credit` - Investment tax credit as a fraction of capex
/// * `inflation` - Annual inflation rate
/// * `depreciation_period` - Number of years over which the asset is depreciated
/// * `analysis_period` - Number of years in the analysis
pub fn depreciation_schedule(
    capex: Money,
    investment_tax_credit: Dimensionless,
    inflation: Dimensionless,
    depreciation_period: u32,
    analysis_period: u32,
) -> DepreciationSchedule {
    let base = depreciable_base(capex, investment_tax_credit);
    let rate = double_declining_rate(depreciation_period);

    let mut schedule = DepreciationSchedule {
        values: vec![Money(0.0)],
        fractions: vec![Dimensionless(0.0)],
    };
    let mut remaining_book_value = base;
    for year in 1..=analysis_period {
        let real = match rate {
            Some(rate) if year <= depreciation_period => {
                let step = depreciation_step(remaining_book_value, rate, inflation, year);
                remaining_book_value = step.remaining_book_value;
                step.real
            }
            _ => Money(0.0),
        };

        schedule.values.push(real);
        schedule.fractions.push(fraction_of_base(real, base));
    }

    schedule
}

/// A year's depreciation as a fraction of the depreciable base (zero if there is no base)
fn fraction_of_base(depreciation: Money, base: Money) -> Dimensionless {
    if base == Money(0.0) {
        Dimensionless(0.0)
    } else {
        depreciation / base
    }
}
