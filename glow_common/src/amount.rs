use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const EURO_CURRENCY_CODE: &str = "EUR";

//--------------------------------------       Amount        ---------------------------------------------------------
/// A donation amount, held as an integer number of euro cents so that ledger totals stay exact.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Amount(i64);

op!(binary Amount, Add, add);
op!(binary Amount, Sub, sub);
op!(inplace Amount, AddAssign, add_assign);
op!(inplace Amount, SubAssign, sub_assign);
op!(unary Amount, Neg, neg);

impl Mul<i64> for Amount {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from_cents(self.cents() * rhs)
    }
}

/// Saturates at the `i64` bounds. Use [`Amount::checked_sum`] where an overflow must be reported.
impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, a| Self(acc.0.saturating_add(a.0)))
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a euro amount: {0}")]
pub struct AmountConversionError(String);

impl From<i64> for Amount {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl TryFrom<f64> for Amount {
    type Error = AmountConversionError;

    /// Converts a euro value (e.g. `12.5`) into cents, rounding to the nearest cent.
    fn try_from(euros: f64) -> Result<Self, Self::Error> {
        if !euros.is_finite() {
            return Err(AmountConversionError(format!("{euros} is not a finite number")));
        }
        let cents = (euros * 100.0).round();
        if cents.abs() > i64::MAX as f64 {
            return Err(AmountConversionError(format!("{euros} is too large")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(cents as i64))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}€{}.{:02}", abs / 100, abs % 100)
    }
}

impl Amount {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn from_euros(euros: i64) -> Self {
        Self(euros * 100)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// The whole-euro part of the amount. Fractions of a euro are truncated.
    pub fn whole_euros(&self) -> i64 {
        self.0 / 100
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// The sum of `amounts`, or `None` if it does not fit.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts.into_iter().try_fold(Self::default(), Self::checked_add)
    }
}
