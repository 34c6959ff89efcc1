//! Command handling infrastructure.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were recorded and persisted.
    pub events: Vec<A::Event>,

    /// The version of the aggregate after the command.
    pub new_version: Version,
}

/// Trait for commands that can be executed against an aggregate.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the aggregate's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> &AggregateId;
}

/// Reads aggregates from and writes their new events to an event store.
///
/// `load` rebuilds an aggregate from its stream; `save` appends whatever the
/// aggregate recorded since, guarded by the version it was loaded at.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuilds an aggregate by replaying its stream.
    ///
    /// An unknown ID yields a fresh aggregate at version 0.
    #[tracing::instrument(skip(self), fields(aggregate_type = A::aggregate_type()))]
    pub async fn load(&self, aggregate_id: &AggregateId) -> Result<A, DomainError> {
        let records = self.store.get_events_for_aggregate(aggregate_id).await?;

        let mut aggregate = A::new(aggregate_id.clone());
        for record in records {
            let event: A::Event = serde_json::from_value(record.payload)?;
            aggregate.apply(event);
            aggregate.set_version(record.version);
        }

        Ok(aggregate)
    }

    /// Persists the aggregate's uncommitted events.
    ///
    /// The append expects the stream to still be at the version the aggregate
    /// was loaded at. On success the events are applied and the aggregate's
    /// version advanced; on a conflict nothing becomes visible in the store.
    /// Returns the persisted events, which may be empty.
    #[tracing::instrument(skip(self, aggregate), fields(aggregate_id = %aggregate.id()))]
    pub async fn save(&self, aggregate: &mut A) -> Result<Vec<A::Event>, DomainError> {
        let events = aggregate.take_uncommitted();
        if events.is_empty() {
            return Ok(events);
        }

        let read_version = aggregate.version();
        let envelopes = self.build_envelopes(aggregate.id(), read_version, &events)?;

        let new_version = self
            .store
            .append(envelopes, AppendOptions::expect_version(read_version))
            .await?;

        aggregate.apply_events(events.iter().cloned());
        aggregate.set_version(new_version);

        tracing::debug!(
            from = %read_version,
            to = %new_version,
            count = events.len(),
            "aggregate saved"
        );

        Ok(events)
    }

    /// Loads an aggregate, runs a command against it and saves the result.
    pub async fn execute<F>(
        &self,
        aggregate_id: &AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&mut A) -> Result<(), A::Error> + Send,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        command_fn(&mut aggregate)?;
        let events = self.save(&mut aggregate).await?;
        let new_version = aggregate.version();

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    fn build_envelopes(
        &self,
        aggregate_id: &AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .stream_id(aggregate_id.clone())
                .event_name(event.event_type())
                .version(version)
                .payload(event)?
                .build()?;
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}
