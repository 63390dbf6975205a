//! General functions related to finance.
//!
//! All discounting follows the end-of-year convention: the value at index `t` of a series is
//! discounted by `(1 + r)^t`, so index 0 (the base year) is not discounted at all.
use crate::units::{Dimensionless, Money, UnitType};

/// Discount rates below this magnitude are treated as exactly zero
const ZERO_RATE_TOLERANCE: f64 = 1e-12;

/// Initial guess for the Newton-Raphson IRR solver
const IRR_INITIAL_GUESS: f64 = 0.1;

/// Maximum number of iterations for either IRR solver
const IRR_MAX_ITERATIONS: u32 = 200;

/// Convergence tolerance on successive IRR estimates
const IRR_TOLERANCE: f64 = 1e-12;

/// The rate the IRR is not allowed to fall below (a total loss every year)
const IRR_LOWER_BOUND: f64 = -0.99;

/// The largest rate scanned when bracketing the IRR
const IRR_UPPER_BOUND: f64 = 10.0;

/// Number of sub-intervals scanned when looking for a bracket around the IRR
const IRR_BRACKET_STEPS: u32 = 1100;

/// Calculates the capital recovery factor (CRF) for a given lifetime and discount rate.
///
/// The CRF is used to annualise a present value over the lifetime of an asset. For a discount rate
/// of (approximately) zero, the limiting value `1 / lifetime` is returned.
pub fn capital_recovery_factor(lifetime: u32, discount_rate: Dimensionless) -> Dimensionless {
    if lifetime == 0 {
        return Dimensionless(0.0);
    }
    if discount_rate.0.abs() < ZERO_RATE_TOLERANCE {
        return Dimensionless(1.0) / Dimensionless(f64::from(lifetime));
    }
    let factor = (Dimensionless(1.0) + discount_rate).pow_years(lifetime);
    (discount_rate * factor) / (factor - Dimensionless(1.0))
}

/// The factor by which a value in the given year is discounted
pub fn discount_factor(discount_rate: Dimensionless, year: u32) -> Dimensionless {
    Dimensionless(1.0) / (Dimensionless(1.0) + discount_rate).pow_years(year)
}

/// Calculates the net present value of a series, where index 0 is the base year.
pub fn npv<T: UnitType>(discount_rate: Dimensionless, values: &[T]) -> T {
    values
        .iter()
        .zip(0u32..)
        .map(|(value, year)| *value * discount_factor(discount_rate, year))
        .sum()
}

/// The NPV of a series of cash flows and its derivative with respect to the discount rate
fn npv_with_derivative(rate: f64, cash_flows: &[Money]) -> (f64, f64) {
    let one_plus_r = 1.0 + rate;
    cash_flows
        .iter()
        .zip(0u32..)
        .fold((0.0, 0.0), |(npv, dnpv), (cf, year)| {
            let t = f64::from(year);
            (
                npv + cf.0 / one_plus_r.powf(t),
                dnpv - t * cf.0 / one_plus_r.powf(t + 1.0),
            )
        })
}

/// Calculates the internal rate of return (IRR) of a series of cash flows.
///
/// The IRR is the discount rate at which the NPV of the cash flows is zero. Returns `None` if the
/// series has no change of sign (in which case there is no IRR) or if no root could be found.
pub fn irr(cash_flows: &[Money]) -> Option<Dimensionless> {
    let has_positive = cash_flows.iter().any(|cf| cf.0 > 0.0);
    let has_negative = cash_flows.iter().any(|cf| cf.0 < 0.0);
    if !(has_positive && has_negative) {
        return None;
    }

    newton_raphson_irr(cash_flows)
        .or_else(|| bisection_irr(cash_flows))
        .map(Dimensionless)
}

/// Newton-Raphson IRR solver.
///
/// Returns `None` if the iteration leaves the valid range of rates or fails to converge.
fn newton_raphson_irr(cash_flows: &[Money]) -> Option<f64> {
    let mut rate = IRR_INITIAL_GUESS;
    for _ in 0..IRR_MAX_ITERATIONS {
        let (npv, dnpv) = npv_with_derivative(rate, cash_flows);
        if dnpv == 0.0 || !dnpv.is_finite() || !npv.is_finite() {
            return None;
        }

        let next = rate - npv / dnpv;
        if !next.is_finite() || next <= IRR_LOWER_BOUND {
            return None;
        }
        if (next - rate).abs() < IRR_TOLERANCE {
            return Some(next);
        }
        rate = next;
    }

    None
}

/// Bisection IRR solver, used if Newton-Raphson fails.
///
/// Scans the range of plausible rates for the first interval where the NPV changes sign, then
/// bisects it.
fn bisection_irr(cash_flows: &[Money]) -> Option<f64> {
    let npv_at = |rate: f64| npv_with_derivative(rate, cash_flows).0;
    let step = (IRR_UPPER_BOUND - IRR_LOWER_BOUND) / f64::from(IRR_BRACKET_STEPS);

    let (mut low, mut high) = (0..IRR_BRACKET_STEPS)
        .map(|i| {
            let low = IRR_LOWER_BOUND + step * f64::from(i);
            (low, low + step)
        })
        .find(|(low, high)| npv_at(*low) * npv_at(*high) <= 0.0)?;

    for _ in 0..IRR_MAX_ITERATIONS {
        let mid = 0.5 * (low + high);
        if npv_at(low) * npv_at(mid) <= 0.0 {
            high = mid;
        } else {
            low = mid;
        }
        if high - low < IRR_TOLERANCE {
            break;
        }
    }

    Some(0.5 * (low + high))
}

/// Running total of a series.
///
/// The first element of the output is zero and the base-year value (index 0) is excluded, so the
/// output has the same length as the input.
pub fn cumulative_from_first_year(cash_flows: &[Money]) -> Vec<Money> {
    let mut total = Money(0.0);
    std::iter::once(total)
        .chain(cash_flows.iter().skip(1).map(|cf| {
            total += *cf;
            total
        }))
        .take(cash_flows.len())
        .collect()
}

/// Calculates the simple (undiscounted) payback period of a series of cash flows.
///
/// The initial investment is the negated base-year cash flow. The payback period is the first year
/// in which the cumulative cash flow from year 1 onwards covers it, or `None` if this never
/// happens.
pub fn payback_period(cash_flows: &[Money]) -> Option<u32> {
    let initial_investment = -*cash_flows.first()?;
    cumulative_from_first_year(cash_flows)
        .into_iter()
        .zip(0u32..)
        .find(|(cumulative, _)| *cumulative >= initial_investment)
        .map(|(_, year)| year)
}

/// A series which starts at `base` in year 1 and grows geometrically at `escalation` per year.
///
/// The value in year `v` is `base * (1 + escalation)^v` and year 0 is always zero.
pub fn escalating_series<T: UnitType>(base: T, escalation: Dimensionless, years: u32) -> Vec<T> {
    std::iter::once(T::zero())
        .chain((1..=years).map(|year| base * (Dimensionless(1.0) + escalation).pow_years(year)))
        .collect()
}

/// A level annual series: zero in year 0, `value` in years `1..=years`
pub fn annuity_series<T: UnitType>(value: T, years: u32) -> Vec<T> {
    std::iter::once(T::zero())
        .chain((1..=years).map(|_| value))
        .collect()
}
