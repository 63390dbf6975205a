//! This module defines the unit types used throughout the model and the arithmetic rules between
//! them.
//!
//! All quantities are thin wrappers around `f64`. Multiplying or dividing two quantities is only
//! possible where a rule has been defined below, which catches unit mix-ups at compile time (e.g.
//! adding an energy to an amount of money).
use float_cmp::{ApproxEq, F64Margin};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Common behaviour of all unit types
pub trait UnitType:
    Copy
    + Debug
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + Mul<Dimensionless, Output = Self>
    + Div<Dimensionless, Output = Self>
    + Sum
    + ApproxEq<Margin = F64Margin>
{
    /// Create a new quantity from a raw `f64`
    fn new(value: f64) -> Self;

    /// The raw value of the quantity
    fn value(&self) -> f64;

    /// Whether the underlying value is neither infinite nor NaN
    fn is_finite(&self) -> bool {
        self.value().is_finite()
    }

    /// The zero value for this quantity
    fn zero() -> Self {
        Self::new(0.0)
    }
}

/// Implements the traits shared by every unit type, including [`Dimensionless`]
macro_rules! base_unit_struct {
    ($name:ident) => {
        impl UnitType for $name {
            fn new(value: f64) -> Self {
                Self(value)
            }

            fn value(&self) -> f64 {
                self.0
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl Neg for $name {
            type Output = $name;

            fn neg(self) -> $name {
                Self(-self.0)
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl ApproxEq for $name {
            type Margin = F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                self.0.approx_eq(other.0, margin)
            }
        }
    };
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::Display,
        )]
        pub struct $name(pub f64);

        base_unit_struct!($name);

        impl Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl Div for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

/// Represents a dimensionless quantity, such as a rate or a fraction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Default,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Display,
)]
pub struct Dimensionless(pub f64);

base_unit_struct!(Dimensionless);

impl Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl Dimensionless {
    /// Raise to the power of a whole number of years
    pub fn pow_years(self, years: u32) -> Self {
        Dimensionless(self.0.powf(f64::from(years)))
    }
}

// Base quantities
unit_struct!(Money);
unit_struct!(Energy);

// Derived quantities
unit_struct!(MoneyPerEnergy);

// Division rules
impl_div!(Money, Energy, MoneyPerEnergy);

// Multiplication rules
impl_mul!(Energy, MoneyPerEnergy, Money);

/// Number of kWh in one MWh
const KWH_PER_MWH: f64 = 1000.0;

impl Energy {
    /// Create an energy quantity (stored in kWh) from a value in MWh
    pub fn from_mwh(mwh: f64) -> Self {
        Energy(mwh * KWH_PER_MWH)
    }

    /// The value of this quantity in MWh
    pub fn as_mwh(self) -> f64 {
        self.0 / KWH_PER_MWH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_energy_mwh_conversion() {
        let energy = Energy::from_mwh(2.5);
        assert_eq!(energy, Energy(2500.0));
        assert_approx_eq!(f64, energy.as_mwh(), 2.5);
    }

    #[test]
    fn test_unit_arithmetic() {
        let sales = Energy(1000.0) * MoneyPerEnergy(0.07);
        assert_approx_eq!(Money, sales, Money(70.0));
        assert_approx_eq!(MoneyPerEnergy, sales / Energy(1000.0), MoneyPerEnergy(0.07));
        assert_approx_eq!(Dimensionless, Money(25.0) / Money(100.0), Dimensionless(0.25));
        assert_eq!(-Money(3.0), Money(-3.0));
    }

    #[test]
    fn test_sum_and_assign() {
        let mut total: Money = [Money(1.0), Money(2.0), Money(3.5)].into_iter().sum();
        assert_eq!(total, Money(6.5));
        total -= Money(0.5);
        total += Money(1.0);
        assert_eq!(total, Money(7.0));
    }

    #[test]
    fn test_pow_years() {
        assert_approx_eq!(
            Dimensionless,
            Dimensionless(1.1).pow_years(2),
            Dimensionless(1.21),
            epsilon = 1e-12
        );
        assert_eq!(Dimensionless(0.5).pow_years(0), Dimensionless(1.0));
    }
}
