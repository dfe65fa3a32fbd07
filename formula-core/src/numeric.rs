//! The numeric element type carried by [`Constant`](crate::eval::Evaluation::Constant)s and
//! produced by evaluation.
//!
//! Every expression tree is generic over one element type implementing [`Numeric`]. Reduction
//! uses the additive and multiplicative identities, addition, multiplication and ordering.
//! Evaluation also needs exponentiation.
//!
//! Implementations are provided for `f64`, `f32`, `i32` and `i64`. With the `rug` feature
//! enabled, [`rug::Integer`] is supported as well.

use std::fmt::{Debug, Display};

/// A numeric element kind that formula trees can be built over.
///
/// The [`Display`] implementation is used verbatim in canonical string forms, so two values that
/// print the same are considered the same constant.
pub trait Numeric: Clone + PartialEq + PartialOrd + Debug + Display + 'static {
    /// The additive identity.
    fn zero() -> Self;

    /// The multiplicative identity.
    fn one() -> Self;

    /// Converts a small integer into this type.
    fn from_i32(n: i32) -> Self;

    /// Returns `self + rhs`.
    fn plus(&self, rhs: &Self) -> Self;

    /// Returns `self * rhs`.
    fn times(&self, rhs: &Self) -> Self;

    /// Returns `self ^ exp`, or [`None`] if the power is undefined for this type (for example a
    /// negative base raised to a fractional power, or a negative integer exponent).
    fn power(&self, exp: &Self) -> Option<Self>;

    /// Lossy conversion to `f64`, used for comparisons against fixed constants such as `0.5`.
    fn to_f64(&self) -> f64;

    /// Returns true if the value equals the additive identity.
    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Returns the canonical representative of this value. Distinct representations of zero
    /// (such as `-0.0`) collapse to [`Numeric::zero`].
    fn normalize(self) -> Self {
        if self.is_zero() {
            Self::zero()
        } else {
            self
        }
    }
}

macro_rules! impl_float {
    ($($ty:ty),*) => {
        $(
            impl Numeric for $ty {
                fn zero() -> Self {
                    0.0
                }

                fn one() -> Self {
                    1.0
                }

                fn from_i32(n: i32) -> Self {
                    n as $ty
                }

                fn plus(&self, rhs: &Self) -> Self {
                    self + rhs
                }

                fn times(&self, rhs: &Self) -> Self {
                    self * rhs
                }

                fn power(&self, exp: &Self) -> Option<Self> {
                    let result = self.powf(*exp);
                    if result.is_nan() && !self.is_nan() && !exp.is_nan() {
                        None
                    } else {
                        Some(result)
                    }
                }

                fn to_f64(&self) -> f64 {
                    *self as f64
                }
            }
        )*
    };
}

macro_rules! impl_int {
    ($($ty:ty),*) => {
        $(
            impl Numeric for $ty {
                fn zero() -> Self {
                    0
                }

                fn one() -> Self {
                    1
                }

                fn from_i32(n: i32) -> Self {
                    n as $ty
                }

                fn plus(&self, rhs: &Self) -> Self {
                    self.wrapping_add(*rhs)
                }

                fn times(&self, rhs: &Self) -> Self {
                    self.wrapping_mul(*rhs)
                }

                fn power(&self, exp: &Self) -> Option<Self> {
                    let exp = u32::try_from(*exp).ok()?;
                    self.checked_pow(exp)
                }

                fn to_f64(&self) -> f64 {
                    *self as f64
                }
            }
        )*
    };
}

impl_float!(f32, f64);
impl_int!(i32, i64);

#[cfg(feature = "rug")]
impl Numeric for rug::Integer {
    fn zero() -> Self {
        rug::Integer::new()
    }

    fn one() -> Self {
        rug::Integer::from(1)
    }

    fn from_i32(n: i32) -> Self {
        rug::Integer::from(n)
    }

    fn plus(&self, rhs: &Self) -> Self {
        rug::Integer::from(self + rhs)
    }

    fn times(&self, rhs: &Self) -> Self {
        rug::Integer::from(self * rhs)
    }

    fn power(&self, exp: &Self) -> Option<Self> {
        use rug::ops::Pow;
        let exp = exp.to_u32()?;
        Some(rug::Integer::from(self.pow(exp)))
    }

    fn to_f64(&self) -> f64 {
        rug::Integer::to_f64(self)
    }

    fn is_zero(&self) -> bool {
        self.cmp0() == std::cmp::Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_zero_normalizes() {
        assert_eq!((-0.0f64).normalize().to_string(), "0");
        assert_eq!(2.5f64.normalize(), 2.5);
    }

    #[test]
    fn float_power_domain() {
        assert_eq!(4.0f64.power(&0.5), Some(2.0));
        assert_eq!((-4.0f64).power(&0.5), None);
        assert!(f64::NAN.power(&2.0).unwrap().is_nan());
    }

    #[test]
    fn integer_power_domain() {
        assert_eq!(3i64.power(&4), Some(81));
        assert_eq!(3i64.power(&-1), None);
        assert_eq!(i32::MAX.power(&2), None);
    }

    #[cfg(feature = "rug")]
    #[test]
    fn rug_integer_arithmetic() {
        let a = rug::Integer::from(12);
        let b = rug::Integer::from(-12);
        assert!(a.plus(&b).is_zero());
        assert_eq!(a.power(&rug::Integer::from(2)), Some(rug::Integer::from(144)));
    }
}
