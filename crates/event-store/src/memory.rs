use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, validate_events_for_append},
};

/// In-memory event log.
///
/// Streams are kept in a sharded map keyed by aggregate ID. The version
/// check and the append run under the stream's entry lock, so writes to the
/// same stream are linearized while writes to different streams do not wait
/// on each other. Cloning yields another handle to the same log.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<DashMap<AggregateId, Vec<EventEnvelope>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored across all streams.
    pub fn event_count(&self) -> usize {
        self.streams.iter().map(|stream| stream.len()).sum()
    }

    /// Returns the number of non-empty streams.
    pub fn stream_count(&self) -> usize {
        self.streams
            .iter()
            .filter(|stream| !stream.is_empty())
            .count()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let (aggregate_id, first_new_version, last_new_version) =
            match (events.first(), events.last()) {
                (Some(first), Some(last)) => {
                    (first.stream_id.clone(), first.version, last.version)
                }
                _ => return Err(EventStoreError::InvalidAppend("empty batch".to_string())),
            };

        let mut stream = self.streams.entry(aggregate_id.clone()).or_default();
        let current_version = stream
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial());

        if let Err(e) = check_append(&aggregate_id, current_version, first_new_version, &options) {
            // A rejected append must not leave an empty stream behind.
            let created = stream.is_empty();
            drop(stream);
            if created {
                self.streams.remove_if(&aggregate_id, |_, s| s.is_empty());
            }
            return Err(e);
        }

        let appended = events.len();
        for event in &events {
            tracing::debug!(
                stream_id = %event.stream_id,
                event_name = %event.event_name,
                version = %event.version,
                "event appended"
            );
        }
        stream.extend(events);
        metrics::counter!("event_store_events_appended_total").increment(appended as u64);

        Ok(last_new_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: &AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        Ok(self
            .streams
            .get(aggregate_id)
            .map(|stream| stream.value().clone())
            .unwrap_or_default())
    }

    async fn get_aggregate_version(&self, aggregate_id: &AggregateId) -> Result<Option<Version>> {
        Ok(self
            .streams
            .get(aggregate_id)
            .and_then(|stream| stream.last().map(|e| e.version)))
    }
}

/// Validates that a batch starting at `first_new_version` may follow
/// `current_version`, honouring the caller's expected version.
fn check_append(
    aggregate_id: &AggregateId,
    current_version: Version,
    first_new_version: Version,
    options: &AppendOptions,
) -> Result<()> {
    if let Some(expected) = options.expected_version
        && current_version != expected
    {
        metrics::counter!("event_store_conflicts_total").increment(1);
        tracing::warn!(
            stream_id = %aggregate_id,
            %expected,
            actual = %current_version,
            "append rejected: stream moved past expected version"
        );
        return Err(EventStoreError::ConcurrencyConflict {
            aggregate_id: aggregate_id.clone(),
            expected,
            actual: current_version,
        });
    }

    // Versions must continue the stream without overlap.
    if first_new_version <= current_version {
        metrics::counter!("event_store_conflicts_total").increment(1);
        return Err(EventStoreError::ConcurrencyConflict {
            aggregate_id: aggregate_id.clone(),
            expected: options.expected_version.unwrap_or(current_version),
            actual: current_version,
        });
    }
    if first_new_version != current_version.next() {
        return Err(EventStoreError::InvalidAppend(format!(
            "stream {aggregate_id} is at version {current_version}, cannot append version {first_new_version}"
        )));
    }

    Ok(())
}
