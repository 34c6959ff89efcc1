//! Payment gateway providing the transaction operations.

use common::AggregateId;
use event_store::{EventEnvelope, EventStore};

use crate::command::{Command, CommandHandler};
use crate::error::DomainError;
use crate::merchant::Merchant;

use super::{
    Authorize, Capture, Card, Money, Refund, Transaction, TransactionError, Void,
};

/// Entry point for payment operations.
///
/// Every operation checks the merchant, reads the transaction from the event
/// store, runs the command, writes the recorded events back and returns the
/// resulting balance. Writes are version-checked; a write that loses a race
/// fails with a concurrency conflict unless conflict retries are enabled, in
/// which case the whole read/command/write cycle is repeated.
pub struct PaymentGateway<S: EventStore> {
    handler: CommandHandler<S, Transaction>,
    conflict_retries: u32,
}

impl<S: EventStore> PaymentGateway<S> {
    /// Creates a gateway over the given event store with retries disabled.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
            conflict_retries: 0,
        }
    }

    /// Sets how many times a conflicting write is re-attempted.
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Transaction> {
        &self.handler
    }

    /// Reserves `amount` on `card` for transaction `id`.
    #[tracing::instrument(skip(self, merchant, card))]
    pub async fn authorize(
        &self,
        id: &AggregateId,
        merchant: &dyn Merchant,
        card: Card,
        amount: Money,
    ) -> Result<Money, DomainError> {
        self.execute("authorize", id, merchant, |tx| {
            tx.authorize(card.clone(), amount.clone())
        })
        .await
    }

    /// Releases an untouched authorization.
    #[tracing::instrument(skip(self, merchant))]
    pub async fn void(
        &self,
        id: &AggregateId,
        merchant: &dyn Merchant,
    ) -> Result<Money, DomainError> {
        self.execute("void", id, merchant, |tx| tx.void()).await
    }

    /// Collects `amount` from the available balance.
    #[tracing::instrument(skip(self, merchant))]
    pub async fn capture(
        &self,
        id: &AggregateId,
        merchant: &dyn Merchant,
        amount: Money,
    ) -> Result<Money, DomainError> {
        self.execute("capture", id, merchant, |tx| tx.capture(amount.clone()))
            .await
    }

    /// Returns `amount` of the captured funds.
    #[tracing::instrument(skip(self, merchant))]
    pub async fn refund(
        &self,
        id: &AggregateId,
        merchant: &dyn Merchant,
        amount: Money,
    ) -> Result<Money, DomainError> {
        self.execute("refund", id, merchant, |tx| tx.refund(amount.clone()))
            .await
    }

    pub async fn handle_authorize(
        &self,
        cmd: Authorize,
        merchant: &dyn Merchant,
    ) -> Result<Money, DomainError> {
        let id = cmd.aggregate_id().clone();
        self.authorize(&id, merchant, cmd.card, cmd.amount).await
    }

    pub async fn handle_void(&self, cmd: Void, merchant: &dyn Merchant) -> Result<Money, DomainError> {
        self.void(cmd.aggregate_id(), merchant).await
    }

    pub async fn handle_capture(
        &self,
        cmd: Capture,
        merchant: &dyn Merchant,
    ) -> Result<Money, DomainError> {
        let id = cmd.aggregate_id().clone();
        self.capture(&id, merchant, cmd.amount).await
    }

    pub async fn handle_refund(
        &self,
        cmd: Refund,
        merchant: &dyn Merchant,
    ) -> Result<Money, DomainError> {
        let id = cmd.aggregate_id().clone();
        self.refund(&id, merchant, cmd.amount).await
    }

    /// Replays a transaction from its stream.
    ///
    /// Unknown IDs yield an empty transaction.
    #[tracing::instrument(skip(self))]
    pub async fn transaction(&self, id: &AggregateId) -> Result<Transaction, DomainError> {
        self.handler.load(id).await
    }

    /// Returns the raw log records of a transaction, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn history(&self, id: &AggregateId) -> Result<Vec<EventEnvelope>, DomainError> {
        Ok(self.handler.store().get_events_for_aggregate(id).await?)
    }

    async fn execute<F>(
        &self,
        command: &'static str,
        id: &AggregateId,
        merchant: &dyn Merchant,
        apply: F,
    ) -> Result<Money, DomainError>
    where
        F: Fn(&mut Transaction) -> Result<(), TransactionError> + Send + Sync,
    {
        if !merchant.is_authenticated() {
            record_outcome(command, "forbidden");
            return Err(DomainError::Forbidden);
        }

        let mut retries_left = self.conflict_retries;
        let result = loop {
            match self.run_once(id, &apply).await {
                Err(e) if e.is_conflict() && retries_left > 0 => {
                    retries_left -= 1;
                    tracing::warn!(%id, command, retries_left, "write conflicted, retrying");
                }
                result => break result,
            }
        };

        match &result {
            Ok(balance) => tracing::debug!(%id, command, %balance, "command accepted"),
            Err(e) => tracing::debug!(%id, command, error = %e, "command failed"),
        }
        record_outcome(command, outcome(&result));
        result
    }

    async fn run_once<F>(&self, id: &AggregateId, apply: &F) -> Result<Money, DomainError>
    where
        F: Fn(&mut Transaction) -> Result<(), TransactionError> + Send + Sync,
    {
        let mut transaction = self.handler.load(id).await?;
        apply(&mut transaction)?;
        self.handler.save(&mut transaction).await?;

        transaction
            .balance()
            .cloned()
            .ok_or_else(|| DomainError::from(TransactionError::NotFound))
    }
}

fn outcome(result: &Result<Money, DomainError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(DomainError::Transaction(_)) => "rejected",
        Err(DomainError::Forbidden) => "forbidden",
        Err(e) if e.is_conflict() => "conflict",
        Err(_) => "error",
    }
}

fn record_outcome(command: &'static str, outcome: &'static str) {
    metrics::counter!("payment_commands_total", "command" => command, "outcome" => outcome)
        .increment(1);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::aggregate::{Aggregate, DomainEvent};
    use crate::merchant::StaticMerchant;
    use crate::transaction::{TransactionEvent, TransactionState};
    use async_trait::async_trait;
    use event_store::{AppendOptions, InMemoryEventStore, Version};

    const MERCHANT: StaticMerchant = StaticMerchant::trusted();

    fn card() -> Card {
        Card::new("Tom", "4242424242424242", "12/2099", "123").unwrap()
    }

    fn usd(amount: &str) -> Money {
        Money::new(amount, "USD").unwrap()
    }

    /// Lets a competing capture of 10 USD land right before the first write.
    struct RacingStore {
        inner: InMemoryEventStore,
        armed: AtomicBool,
    }

    impl RacingStore {
        fn new(inner: InMemoryEventStore) -> Self {
            Self {
                inner,
                armed: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl EventStore for RacingStore {
        async fn append(
            &self,
            events: Vec<EventEnvelope>,
            options: AppendOptions,
        ) -> event_store::Result<Version> {
            if self.armed.swap(false, Ordering::SeqCst)
                && let Some(first) = events.first()
            {
                let competitor = TransactionEvent::captured(usd("10"));
                let envelope = EventEnvelope::builder()
                    .stream_id(first.stream_id.clone())
                    .event_name(competitor.event_type())
                    .version(first.version)
                    .payload(&competitor)?
                    .build()?;
                self.inner
                    .append(vec![envelope], AppendOptions::new())
                    .await?;
            }
            self.inner.append(events, options).await
        }

        async fn get_events_for_aggregate(
            &self,
            aggregate_id: &AggregateId,
        ) -> event_store::Result<Vec<EventEnvelope>> {
            self.inner.get_events_for_aggregate(aggregate_id).await
        }

        async fn get_aggregate_version(
            &self,
            aggregate_id: &AggregateId,
        ) -> event_store::Result<Option<Version>> {
            self.inner.get_aggregate_version(aggregate_id).await
        }
    }

    #[tokio::test]
    async fn test_authorize_returns_balance() {
        let gateway = PaymentGateway::new(InMemoryEventStore::new());
        let id = AggregateId::new();

        let balance = gateway.authorize(&id, &MERCHANT, card(), usd("100")).await;
        assert_eq!(balance.unwrap(), usd("100"));
    }

    #[tokio::test]
    async fn test_capture_then_exceed() {
        let gateway = PaymentGateway::new(InMemoryEventStore::new());
        let id = AggregateId::new();

        gateway
            .authorize(&id, &MERCHANT, card(), usd("100"))
            .await
            .unwrap();
        let balance = gateway.capture(&id, &MERCHANT, usd("40")).await.unwrap();
        assert_eq!(balance, usd("60"));

        let result = gateway.capture(&id, &MERCHANT, usd("70")).await;
        assert!(matches!(
            result,
            Err(DomainError::Transaction(TransactionError::CaptureExceeded))
        ));
    }

    #[tokio::test]
    async fn test_void_returns_unchanged_balance() {
        let gateway = PaymentGateway::new(InMemoryEventStore::new());
        let id = AggregateId::new();

        gateway
            .authorize(&id, &MERCHANT, card(), usd("50"))
            .await
            .unwrap();
        assert_eq!(gateway.void(&id, &MERCHANT).await.unwrap(), usd("50"));
        assert_eq!(gateway.void(&id, &MERCHANT).await.unwrap(), usd("50"));

        assert_eq!(gateway.history(&id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unauthenticated_merchant_is_refused_before_read() {
        let store = InMemoryEventStore::new();
        let gateway = PaymentGateway::new(store.clone());
        let id = AggregateId::new();

        let result = gateway
            .authorize(&id, &StaticMerchant::anonymous(), card(), usd("10"))
            .await;

        assert!(matches!(result, Err(DomainError::Forbidden)));
        assert_eq!(store.event_count(), 0);
    }

    #[tokio::test]
    async fn test_command_structs() {
        let gateway = PaymentGateway::new(InMemoryEventStore::new());
        let cmd = Authorize::with_new_id(card(), usd("20"));
        let id = cmd.aggregate_id().clone();

        gateway.handle_authorize(cmd, &MERCHANT).await.unwrap();
        gateway
            .handle_capture(Capture::new(id.clone(), usd("20")), &MERCHANT)
            .await
            .unwrap();
        let balance = gateway
            .handle_refund(Refund::new(id.clone(), usd("5")), &MERCHANT)
            .await
            .unwrap();
        assert_eq!(balance, usd("5"));

        let void = Void::new(id.clone());
        assert_eq!(void.aggregate_id(), &id);
        let result = gateway.handle_void(void, &MERCHANT).await;
        assert!(matches!(
            result,
            Err(DomainError::Transaction(TransactionError::VoidRejected))
        ));

        let tx = gateway.transaction(&id).await.unwrap();
        assert_eq!(tx.version(), Version::new(3));
    }

    #[tokio::test]
    async fn test_transaction_projection() {
        let gateway = PaymentGateway::new(InMemoryEventStore::new());
        let id = AggregateId::new();

        let empty = gateway.transaction(&id).await.unwrap();
        assert_eq!(empty.state(), TransactionState::Empty);

        gateway
            .authorize(&id, &MERCHANT, card(), usd("10"))
            .await
            .unwrap();
        let tx = gateway.transaction(&id).await.unwrap();
        assert_eq!(tx.state(), TransactionState::Authorized);
        assert_eq!(tx.version(), Version::first());
    }

    #[tokio::test]
    async fn test_conflict_surfaces_without_retries() {
        let store = RacingStore::new(InMemoryEventStore::new());
        let id = AggregateId::new();
        let gateway = PaymentGateway::new(store);

        gateway
            .authorize(&id, &MERCHANT, card(), usd("100"))
            .await
            .unwrap();
        gateway.handler().store().armed.store(true, Ordering::SeqCst);

        let result = gateway.capture(&id, &MERCHANT, usd("30")).await;
        assert!(result.unwrap_err().is_conflict());

        let tx = gateway.transaction(&id).await.unwrap();
        assert_eq!(tx.balance(), Some(&usd("90")));
    }

    #[tokio::test]
    async fn test_conflict_is_retried_when_enabled() {
        let store = RacingStore::new(InMemoryEventStore::new());
        let id = AggregateId::new();
        let gateway = PaymentGateway::new(store).with_conflict_retries(1);

        gateway
            .authorize(&id, &MERCHANT, card(), usd("100"))
            .await
            .unwrap();
        gateway.handler().store().armed.store(true, Ordering::SeqCst);

        let balance = gateway.capture(&id, &MERCHANT, usd("30")).await.unwrap();
        assert_eq!(balance, usd("60"));
        assert_eq!(gateway.history(&id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_business_errors_are_not_retried() {
        let store = RacingStore::new(InMemoryEventStore::new());
        let id = AggregateId::new();
        let gateway = PaymentGateway::new(store).with_conflict_retries(3);

        gateway
            .authorize(&id, &MERCHANT, card(), usd("100"))
            .await
            .unwrap();
        gateway.handler().store().armed.store(true, Ordering::SeqCst);

        // The rejected command never writes, so the competitor is never injected.
        let result = gateway.capture(&id, &MERCHANT, usd("101")).await;
        assert!(matches!(
            result,
            Err(DomainError::Transaction(TransactionError::CaptureExceeded))
        ));
        assert!(gateway.handler().store().armed.load(Ordering::SeqCst));
    }
}
