use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A profile balance or an aggregate of job prices.
///
/// Wraps `rust_decimal::Decimal` so currency arithmetic never goes through
/// floating point. A `Balance` stored on a profile is never negative. All
/// arithmetic is checked and reports overflow as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub Decimal);

/// A strictly positive amount: a job price or a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::ValidationError(format!(
                "amount must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Subtracts `amount`, or returns `None` if the result would be negative.
    pub fn checked_debit(self, amount: Amount) -> Option<Self> {
        let remaining = self.0.checked_sub(amount.value())?;
        (remaining >= Decimal::ZERO).then_some(Self(remaining))
    }

    pub fn checked_credit(self, amount: Amount) -> Option<Self> {
        self.0.checked_add(amount.value()).map(Self)
    }

    /// Sum of `amounts`, or `None` if it does not fit in a `Decimal`.
    pub fn total<I: IntoIterator<Item = Amount>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_credit(amount))
    }

    /// Smallest whole unit not below `self * ratio`.
    pub fn ceil_fraction(self, ratio: Decimal) -> Option<Self> {
        self.0.checked_mul(ratio).map(|scaled| Self(scaled.ceil()))
    }

    /// Whether `amount` fits under this balance taken as a limit.
    pub fn admits(self, amount: Amount) -> bool {
        amount.value() <= self.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
