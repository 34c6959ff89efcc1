//! Payment transaction aggregate and related types.

mod aggregate;
mod card;
mod commands;
mod events;
mod money;
mod service;
mod state;

pub use aggregate::Transaction;
pub use card::{
    AUTH_DECLINE_NUMBER, CAPTURE_DECLINE_NUMBER, Card, CardError, CardNumber, Expiry,
    REFUND_DECLINE_NUMBER, luhn_valid,
};
pub use commands::{Authorize, Capture, Refund, Void};
pub use events::{AuthorizedData, CapturedData, RefundedData, TransactionEvent, VoidedData};
pub use money::{Currency, Money, MoneyError};
pub use service::PaymentGateway;
pub use state::TransactionState;

use thiserror::Error;

/// Reasons a transaction command is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The transaction has never been authorized.
    #[error("transaction: not found")]
    NotFound,

    #[error("transaction: already authorized")]
    AlreadyAuthorized,

    /// Part of the authorized amount has already been captured.
    #[error("transaction: void rejected")]
    VoidRejected,

    #[error("transaction: capture amount exceeded")]
    CaptureExceeded,

    #[error("transaction: refund amount exceeded")]
    RefundExceeded,

    #[error("transaction: voided")]
    Voided,

    /// The amount is zero or negative.
    #[error("transaction: insufficient amount")]
    InsufficientAmount,

    #[error("credit card: invalid card data")]
    InvalidCard,

    #[error("credit card: expired")]
    CardExpired,

    #[error("credit card: authorization failure")]
    CardAuthFailed,

    #[error("credit card: capture failure")]
    CardCaptureFailed,

    #[error("credit card: refund failure")]
    CardRefundFailed,

    /// The amount is not in the currency the transaction was authorized in.
    #[error("transaction: currency mismatch, expected {expected} but got {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },
}
