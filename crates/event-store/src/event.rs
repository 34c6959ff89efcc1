use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AggregateId, EventStoreError};

/// Unique identifier for a single log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a record within its stream, used for optimistic concurrency control.
///
/// An empty stream is at version 0; the first record is version 1 and each
/// subsequent record increments by 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of an empty stream (0).
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version of the first record (1).
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One record of the append-only log.
///
/// Wraps a serialized domain event together with the stream it belongs to,
/// its position in that stream and the instant it was appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique identifier for this record.
    pub event_id: EventId,

    /// The stream (aggregate) this record belongs to.
    pub stream_id: AggregateId,

    /// Name of the event (e.g. "TransactionCaptured").
    pub event_name: String,

    /// Version of the stream after this record.
    pub version: Version,

    /// When the record was appended.
    pub created_at: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Creates a new event envelope builder.
    pub fn builder() -> EventEnvelopeBuilder {
        EventEnvelopeBuilder::default()
    }
}

/// Builder for constructing event envelopes.
#[derive(Debug, Default)]
pub struct EventEnvelopeBuilder {
    stream_id: Option<AggregateId>,
    event_name: Option<String>,
    version: Option<Version>,
    payload: Option<serde_json::Value>,
}

impl EventEnvelopeBuilder {
    /// Sets the stream the record is appended to.
    pub fn stream_id(mut self, id: AggregateId) -> Self {
        self.stream_id = Some(id);
        self
    }

    /// Sets the event name.
    pub fn event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = Some(name.into());
        self
    }

    /// Sets the version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Builds the envelope, failing if stream, name, version or payload is missing.
    pub fn build(self) -> crate::Result<EventEnvelope> {
        let missing = |field: &str| EventStoreError::InvalidAppend(format!("{field} is required"));

        Ok(EventEnvelope {
            event_id: EventId::new(),
            stream_id: self.stream_id.ok_or_else(|| missing("stream_id"))?,
            event_name: self.event_name.ok_or_else(|| missing("event_name"))?,
            version: self.version.ok_or_else(|| missing("version"))?,
            created_at: Utc::now(),
            payload: self.payload.ok_or_else(|| missing("payload"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_new_creates_unique_ids() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn version_ordering() {
        let v1 = Version::new(1);
        let v2 = Version::new(2);
        assert!(v1 < v2);
        assert_eq!(v1.next(), v2);
    }

    #[test]
    fn version_initial_and_first() {
        assert_eq!(Version::initial().as_i64(), 0);
        assert_eq!(Version::first().as_i64(), 1);
        assert_eq!(Version::initial().next(), Version::first());
    }

    #[test]
    fn envelope_builder_sets_fields() {
        let stream_id = AggregateId::parse("tx-1").unwrap();
        let payload = serde_json::json!({"amount": "10.00"});

        let envelope = EventEnvelope::builder()
            .stream_id(stream_id.clone())
            .event_name("TransactionCaptured")
            .version(Version::first())
            .payload_raw(payload.clone())
            .build()
            .unwrap();

        assert_eq!(envelope.stream_id, stream_id);
        assert_eq!(envelope.event_name, "TransactionCaptured");
        assert_eq!(envelope.version, Version::first());
        assert_eq!(envelope.payload, payload);
    }

    #[test]
    fn envelope_builder_reports_missing_field() {
        let result = EventEnvelope::builder()
            .event_name("TransactionVoided")
            .version(Version::first())
            .payload_raw(serde_json::json!({}))
            .build();

        match result {
            Err(EventStoreError::InvalidAppend(message)) => {
                assert_eq!(message, "stream_id is required")
            }
            other => panic!("expected InvalidAppend, got {other:?}"),
        }
    }
}
