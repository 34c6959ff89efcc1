//! Money value object.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places every amount is normalized to.
const SCALE: u32 = 2;

/// Errors produced while building or combining money values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The amount text is empty or not a decimal number.
    #[error("money: invalid amount, expected e.g. 149.99")]
    InvalidAmount,

    /// The currency code is empty or longer than three characters.
    #[error("money: invalid currency, expected e.g. USD")]
    InvalidCurrency,

    /// Two amounts in different currencies were combined.
    #[error("money: currency mismatch, expected {expected} but got {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },
}

/// A currency code of one to three characters, stored uppercased.
///
/// Codes are not checked against ISO 4217.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Currency(String);

impl Currency {
    /// Validates and normalizes a currency code.
    pub fn new(code: &str) -> Result<Self, MoneyError> {
        let len = code.chars().count();
        if len == 0 || len > 3 {
            return Err(MoneyError::InvalidCurrency);
        }
        Ok(Self(code.to_uppercase()))
    }

    /// Returns the code as a string slice.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An amount of money in a single currency.
///
/// Amounts are signed decimals rounded to two places on construction, so the
/// fixed two-decimal wire form always round-trips to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MoneyDto", into = "MoneyDto")]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Parses an amount and a currency code.
    ///
    /// Fails with `InvalidAmount` when the (trimmed) amount is empty or not a
    /// decimal, and with `InvalidCurrency` when the code is empty or longer
    /// than three characters.
    pub fn new(amount: &str, currency: &str) -> Result<Self, MoneyError> {
        let amount = amount.trim();
        if amount.is_empty() {
            return Err(MoneyError::InvalidAmount);
        }
        let amount = Decimal::from_str(amount).map_err(|_| MoneyError::InvalidAmount)?;
        let currency = Currency::new(currency)?;
        Ok(Self::from_decimal(amount, currency))
    }

    /// Builds money from an already parsed amount.
    pub fn from_decimal(amount: Decimal, currency: Currency) -> Self {
        let mut amount = amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(SCALE);
        Self { amount, currency }
    }

    /// Returns the amount.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency.
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Compares amounts only; the currency is ignored.
    pub fn greater_than(&self, other: &Money) -> bool {
        self.amount > other.amount
    }

    /// Compares amounts only; the currency is ignored.
    pub fn less_than(&self, other: &Money) -> bool {
        self.amount < other.amount
    }

    /// Returns true if both values share a currency.
    pub fn same_currency(&self, other: &Money) -> bool {
        self.currency == other.currency
    }

    /// Adds two amounts of the same currency.
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.plus(other))
    }

    /// Subtracts an amount of the same currency.
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.minus(other))
    }

    /// Adds `other`'s amount keeping this value's currency.
    ///
    /// Only for state transitions whose currency was validated when the
    /// command was accepted.
    pub(crate) fn plus(&self, other: &Money) -> Money {
        Money {
            amount: self.amount + other.amount,
            currency: self.currency.clone(),
        }
    }

    /// Subtracts `other`'s amount keeping this value's currency.
    pub(crate) fn minus(&self, other: &Money) -> Money {
        Money {
            amount: self.amount - other.amount,
            currency: self.currency.clone(),
        }
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.same_currency(other) {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                expected: self.currency.clone(),
                found: other.currency.clone(),
            })
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

/// Wire form: `{"amount": "12.34", "currency": "USD"}`.
#[derive(Serialize, Deserialize)]
struct MoneyDto {
    amount: String,
    currency: String,
}

impl TryFrom<MoneyDto> for Money {
    type Error = MoneyError;

    fn try_from(dto: MoneyDto) -> Result<Self, Self::Error> {
        Money::new(&dto.amount, &dto.currency)
    }
}

impl From<Money> for MoneyDto {
    fn from(money: Money) -> Self {
        MoneyDto {
            amount: format!("{:.2}", money.amount),
            currency: money.currency.0,
        }
    }
}
