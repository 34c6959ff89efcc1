//! Shared types used across the payment transaction crates.

mod types;

pub use types::{AggregateId, InvalidAggregateId};
