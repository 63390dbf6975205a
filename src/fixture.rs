//! Fixtures for tests

use crate::metrics::LcoeCalculator;
use crate::parameters::LcoeParameters;
use crate::units::{Energy, Money};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A 2 GWh/year asset costing $1M, with default financial assumptions
#[fixture]
pub fn parameters() -> LcoeParameters {
    LcoeParameters::new(
        Money(1_000_000.0),
        Money(10_000.0),
        Money(5_000.0),
        Energy::from_mwh(2000.0),
        vec![Money(0.0); 31],
    )
}

#[fixture]
pub fn calculator(parameters: LcoeParameters) -> LcoeCalculator {
    LcoeCalculator::new(parameters)
}
