use super::money::{Amount, Balance};
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub u32);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Client,
    Contractor,
    Admin,
}

/// A marketplace participant and the balance they hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profession: String,
    pub balance: Balance,
    pub kind: ProfileKind,
}

impl Profile {
    pub fn new(id: ProfileId, kind: ProfileKind, balance: Balance) -> Self {
        Self {
            id,
            first_name: String::new(),
            last_name: String::new(),
            profession: String::new(),
            balance,
            kind,
        }
    }

    pub fn credit(&mut self, amount: Amount) -> Result<(), LedgerError> {
        self.balance = self.balance.checked_credit(amount).ok_or_else(|| {
            LedgerError::Overflow(format!("crediting {amount} to profile {}", self.id))
        })?;
        Ok(())
    }

    /// Takes `amount` out of the balance, refusing to go below zero.
    pub fn debit(&mut self, amount: Amount) -> Result<(), LedgerError> {
        match self.balance.checked_debit(amount) {
            Some(remaining) => {
                self.balance = remaining;
                Ok(())
            }
            None => Err(LedgerError::InsufficientBalance {
                available: self.balance,
                required: amount.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_profile_credit() {
        let mut profile = Profile::new(ProfileId(1), ProfileKind::Client, Balance::ZERO);
        profile.credit(Amount::new(dec!(10.0)).unwrap()).unwrap();
        assert_eq!(profile.balance, Balance::new(dec!(10.0)));
    }

    #[test]
    fn test_profile_credit_overflow_leaves_balance() {
        let mut profile =
            Profile::new(ProfileId(1), ProfileKind::Contractor, Balance::new(Decimal::MAX));

        let result = profile.credit(Amount::new(dec!(1)).unwrap());
        assert!(matches!(result, Err(LedgerError::Overflow(_))));
        assert_eq!(profile.balance, Balance::new(Decimal::MAX));
    }

    #[test]
    fn test_profile_debit_insufficient_leaves_balance() {
        let mut profile =
            Profile::new(ProfileId(1), ProfileKind::Client, Balance::new(dec!(100)));

        let result = profile.debit(Amount::new(dec!(5000)).unwrap());
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(profile.balance, Balance::new(dec!(100)));
    }

    #[test]
    fn test_profile_deserializes_kind() {
        let json = r#"{"id": 2, "first_name": "Jane", "balance": 200, "kind": "client"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.kind, ProfileKind::Client);
        assert_eq!(profile.balance, Balance::new(dec!(200)));
        assert!(profile.profession.is_empty());
    }
}
