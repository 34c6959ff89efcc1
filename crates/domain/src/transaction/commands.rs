//! Transaction commands.

use common::AggregateId;

use crate::command::Command;

use super::{Card, Money, Transaction};

/// Command to reserve funds on a card.
#[derive(Debug, Clone)]
pub struct Authorize {
    pub transaction_id: AggregateId,
    pub card: Card,
    pub amount: Money,
}

impl Authorize {
    pub fn new(transaction_id: AggregateId, card: Card, amount: Money) -> Self {
        Self {
            transaction_id,
            card,
            amount,
        }
    }

    /// Creates an Authorize command for a freshly generated transaction ID.
    pub fn with_new_id(card: Card, amount: Money) -> Self {
        Self::new(AggregateId::new(), card, amount)
    }
}

impl Command for Authorize {
    type Aggregate = Transaction;

    fn aggregate_id(&self) -> &AggregateId {
        &self.transaction_id
    }
}

/// Command to release an untouched authorization.
#[derive(Debug, Clone)]
pub struct Void {
    pub transaction_id: AggregateId,
}

impl Void {
    pub fn new(transaction_id: AggregateId) -> Self {
        Self { transaction_id }
    }
}

impl Command for Void {
    type Aggregate = Transaction;

    fn aggregate_id(&self) -> &AggregateId {
        &self.transaction_id
    }
}

/// Command to collect part of the available balance.
#[derive(Debug, Clone)]
pub struct Capture {
    pub transaction_id: AggregateId,
    pub amount: Money,
}

impl Capture {
    pub fn new(transaction_id: AggregateId, amount: Money) -> Self {
        Self {
            transaction_id,
            amount,
        }
    }
}

impl Command for Capture {
    type Aggregate = Transaction;

    fn aggregate_id(&self) -> &AggregateId {
        &self.transaction_id
    }
}

/// Command to return captured funds.
#[derive(Debug, Clone)]
pub struct Refund {
    pub transaction_id: AggregateId,
    pub amount: Money,
}

impl Refund {
    pub fn new(transaction_id: AggregateId, amount: Money) -> Self {
        Self {
            transaction_id,
            amount,
        }
    }
}

impl Command for Refund {
    type Aggregate = Transaction;

    fn aggregate_id(&self) -> &AggregateId {
        &self.transaction_id
    }
}
