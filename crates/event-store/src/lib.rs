//! Append-only event log.
//!
//! Every aggregate owns one stream of [`EventEnvelope`]s ordered by
//! [`Version`]. Appends are version-checked so concurrent writers to the
//! same stream are detected instead of silently interleaved.

pub mod error;
pub mod event;
pub mod memory;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use store::{AppendOptions, EventStore, EventStoreExt};
