//! Domain layer for the payment service.
//!
//! This crate provides:
//! - Aggregate and DomainEvent traits for event-sourced entities
//! - CommandHandler, which reads aggregates from and writes them to an event store
//! - The Merchant capability checked on every payment operation
//! - The Transaction aggregate with its Money and Card value objects
//! - PaymentGateway, the entry point for authorize, void, capture and refund

pub mod aggregate;
pub mod command;
pub mod error;
pub mod merchant;
pub mod transaction;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::DomainError;
pub use merchant::{Merchant, StaticMerchant};
pub use transaction::{
    Authorize, Capture, Card, CardError, Currency, Money, MoneyError, PaymentGateway, Refund,
    Transaction, TransactionError, TransactionEvent, TransactionState, Void,
};
