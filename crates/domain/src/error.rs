//! Domain error types.

use event_store::EventStoreError;
use thiserror::Error;

use crate::transaction::TransactionError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// A transaction command was rejected.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// The merchant is not authenticated.
    #[error("merchant: not authenticated")]
    Forbidden,

    /// A stored event could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if a concurrent write won the race for the stream.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::EventStore(e) if e.is_conflict())
    }
}
