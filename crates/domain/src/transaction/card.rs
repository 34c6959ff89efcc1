//! Credit card value object.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while validating card data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("credit card: invalid owner name, expected at least 3 characters")]
    InvalidOwner,

    #[error("credit card: invalid number")]
    InvalidNumber,

    #[error("credit card: invalid expiry date, expected MM/YYYY")]
    InvalidExpiry,

    #[error("credit card: invalid cvv code, expected 3 digits")]
    InvalidCvv,
}

/// Number whose authorizations are always declined.
pub const AUTH_DECLINE_NUMBER: CardNumber = CardNumber(4_000_000_000_000_119);

/// Number whose captures are always declined.
pub const CAPTURE_DECLINE_NUMBER: CardNumber = CardNumber(4_000_000_000_000_259);

/// Number whose refunds are always declined.
pub const REFUND_DECLINE_NUMBER: CardNumber = CardNumber(4_000_000_000_003_238);

/// Returns true if `number` passes the Luhn checksum.
///
/// Every second digit left of the check digit is doubled (digits above 9
/// are folded by summing them), and the total plus the check digit must be
/// divisible by 10.
pub fn luhn_valid(number: u64) -> bool {
    let check_digit = number % 10;
    let mut rest = number / 10;
    let mut sum = 0;
    let mut double = true;

    while rest > 0 {
        let mut digit = rest % 10;
        if double {
            digit *= 2;
            if digit > 9 {
                digit = digit % 10 + digit / 10;
            }
        }
        sum += digit;
        rest /= 10;
        double = !double;
    }

    (check_digit + sum) % 10 == 0
}

/// A card number that passed the Luhn check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardNumber(u64);

impl CardNumber {
    /// Parses a card number, ignoring spaces.
    pub fn parse(text: &str) -> Result<Self, CardError> {
        let digits: String = text.chars().filter(|c| *c != ' ').collect();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CardError::InvalidNumber);
        }

        let number: u64 = digits.parse().map_err(|_| CardError::InvalidNumber)?;
        if !luhn_valid(number) {
            return Err(CardError::InvalidNumber);
        }

        Ok(Self(number))
    }

    /// Returns the number as an integer.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns true for the all-zero number.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns the number with everything but the last four digits hidden.
    pub fn masked(&self) -> String {
        let digits = self.0.to_string();
        let visible = digits.len().saturating_sub(4);
        format!("{}{}", "*".repeat(visible), &digits[visible..])
    }
}

impl std::fmt::Display for CardNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Card expiry month.
///
/// The card stays valid until the last instant of its expiry month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    month: u32,
    year: i32,
    last_valid_instant: DateTime<Utc>,
}

impl Expiry {
    /// Parses `MM/YYYY`.
    pub fn parse(text: &str) -> Result<Self, CardError> {
        if text.len() != 7 || !text.is_ascii() || &text[2..3] != "/" {
            return Err(CardError::InvalidExpiry);
        }

        let month = parse_digits::<u32>(&text[..2])?;
        let year = parse_digits::<i32>(&text[3..])?;
        if !(1..=12).contains(&month) {
            return Err(CardError::InvalidExpiry);
        }

        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let start_of_next_month = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or(CardError::InvalidExpiry)?
            .and_utc();

        Ok(Self {
            month,
            year,
            last_valid_instant: start_of_next_month - TimeDelta::nanoseconds(1),
        })
    }

    /// Returns true if `now` is after the last instant of the expiry month.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.last_valid_instant
    }

    /// Returns the last instant at which the card is valid.
    pub fn last_valid_instant(&self) -> DateTime<Utc> {
        self.last_valid_instant
    }
}

impl std::fmt::Display for Expiry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

fn parse_digits<T: std::str::FromStr>(text: &str) -> Result<T, CardError> {
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CardError::InvalidExpiry);
    }
    text.parse().map_err(|_| CardError::InvalidExpiry)
}

/// A validated payment card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CardDto", into = "CardDto")]
pub struct Card {
    owner: String,
    number: CardNumber,
    expiry: Expiry,
    cvv: String,
}

impl Card {
    /// Validates card fields in order: owner, number, expiry, cvv.
    pub fn new(owner: &str, number: &str, expiry: &str, cvv: &str) -> Result<Self, CardError> {
        if owner.chars().count() < 3 {
            return Err(CardError::InvalidOwner);
        }
        let number = CardNumber::parse(number)?;
        let expiry = Expiry::parse(expiry)?;
        if cvv.len() != 3 || !cvv.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CardError::InvalidCvv);
        }

        Ok(Self {
            owner: owner.to_string(),
            number,
            expiry,
            cvv: cvv.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn number(&self) -> CardNumber {
        self.number
    }

    pub fn expiry(&self) -> Expiry {
        self.expiry
    }

    /// Returns true for the all-zero card number.
    pub fn is_zero(&self) -> bool {
        self.number.is_zero()
    }

    /// Returns true if the card expired before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_expired_at(now)
    }

    /// Returns true if the card has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn masked_number(&self) -> String {
        self.number.masked()
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.owner, self.number.masked(), self.expiry)
    }
}

/// Wire form with every field as a string.
#[derive(Serialize, Deserialize)]
struct CardDto {
    owner: String,
    number: String,
    expiry: String,
    cvv: String,
}

impl TryFrom<CardDto> for Card {
    type Error = CardError;

    fn try_from(dto: CardDto) -> Result<Self, Self::Error> {
        Card::new(&dto.owner, &dto.number, &dto.expiry, &dto.cvv)
    }
}

impl From<Card> for CardDto {
    fn from(card: Card) -> Self {
        CardDto {
            owner: card.owner,
            number: card.number.to_string(),
            expiry: card.expiry.to_string(),
            cvv: card.cvv,
        }
    }
}
