//! Transaction domain events.

use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{Card, Money};

/// Events that can occur on a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TransactionEvent {
    /// Funds were reserved on a card.
    Authorized(AuthorizedData),

    /// The authorization was released.
    Voided(VoidedData),

    /// Part of the authorized amount was collected.
    Captured(CapturedData),

    /// Previously captured funds were returned.
    Refunded(RefundedData),
}

impl DomainEvent for TransactionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TransactionEvent::Authorized(_) => "TransactionAuthorized",
            TransactionEvent::Voided(_) => "TransactionVoided",
            TransactionEvent::Captured(_) => "TransactionCaptured",
            TransactionEvent::Refunded(_) => "TransactionRefunded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedData {
    pub card: Card,
    pub amount: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidedData {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedData {
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundedData {
    pub amount: Money,
}

// Convenience constructors
impl TransactionEvent {
    pub fn authorized(card: Card, amount: Money) -> Self {
        TransactionEvent::Authorized(AuthorizedData { card, amount })
    }

    pub fn voided() -> Self {
        TransactionEvent::Voided(VoidedData {})
    }

    pub fn captured(amount: Money) -> Self {
        TransactionEvent::Captured(CapturedData { amount })
    }

    pub fn refunded(amount: Money) -> Self {
        TransactionEvent::Refunded(RefundedData { amount })
    }
}
