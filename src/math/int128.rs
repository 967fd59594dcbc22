use std::cmp::Ordering;
use std::ops::{Add, Div, Neg, Sub};

/// Signed 128-bit integer used for products of 64-bit coordinates.
///
/// Orientation, slope and hole tests depend on the sign of these products, so
/// every operation here is exact: multiplication of two `i64` values cannot
/// overflow and division truncates toward zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WideInt128(i128);

impl WideInt128 {
    pub const ZERO: Self = Self(0);

    /// Exact product of two 64-bit values.
    #[must_use]
    pub fn product(lhs: i64, rhs: i64) -> Self {
        Self(i128::from(lhs) * i128::from(rhs))
    }

    /// Returns `-1`, `0` or `1`.
    #[must_use]
    pub fn signum(self) -> i32 {
        match self.0.cmp(&0) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Nearest `f64`; large magnitudes lose precision but keep their sign.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        self.0 as f64
    }

    #[must_use]
    pub fn get(self) -> i128 {
        self.0
    }
}

impl From<i64> for WideInt128 {
    fn from(value: i64) -> Self {
        Self(i128::from(value))
    }
}

impl Add for WideInt128 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for WideInt128 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Neg for WideInt128 {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

/// Truncating division. A zero divisor yields zero.
impl Div for WideInt128 {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        if rhs.0 == 0 {
            return Self::ZERO;
        }
        Self(self.0.wrapping_div(rhs.0))
    }
}
