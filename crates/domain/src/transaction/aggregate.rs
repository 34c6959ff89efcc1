//! Transaction aggregate implementation.

use common::AggregateId;
use event_store::Version;

use crate::aggregate::Aggregate;

use super::{
    AUTH_DECLINE_NUMBER, CAPTURE_DECLINE_NUMBER, Card, Money, REFUND_DECLINE_NUMBER,
    TransactionError, TransactionEvent, TransactionState, events::AuthorizedData,
};

/// Funds reserved by the first accepted authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Authorization {
    card: Card,
    authorized: Money,
    balance: Money,
}

/// Transaction aggregate root.
///
/// A transaction starts empty, is authorized once for an amount on a card,
/// then moves funds through captures and refunds until it is optionally
/// voided. Between commands `0 <= balance <= authorized` holds, and
/// `authorized - balance` equals the net captured amount.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: AggregateId,
    version: Version,
    authorization: Option<Authorization>,
    voided: bool,
    uncommitted: Vec<TransactionEvent>,
}

impl Aggregate for Transaction {
    type Event = TransactionEvent;
    type Error = TransactionError;

    fn aggregate_type() -> &'static str {
        "Transaction"
    }

    fn new(id: AggregateId) -> Self {
        Self {
            id,
            version: Version::initial(),
            authorization: None,
            voided: false,
            uncommitted: Vec::new(),
        }
    }

    fn id(&self) -> &AggregateId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            TransactionEvent::Authorized(data) => self.apply_authorized(data),
            TransactionEvent::Voided(_) => self.voided = true,
            TransactionEvent::Captured(data) => {
                if let Some(auth) = self.authorization.as_mut() {
                    auth.balance = auth.balance.minus(&data.amount);
                }
            }
            TransactionEvent::Refunded(data) => {
                if let Some(auth) = self.authorization.as_mut() {
                    auth.balance = auth.balance.plus(&data.amount);
                }
            }
        }
    }

    fn take_uncommitted(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.uncommitted)
    }
}

// Query methods
impl Transaction {
    pub fn state(&self) -> TransactionState {
        match (&self.authorization, self.voided) {
            (None, _) => TransactionState::Empty,
            (Some(_), false) => TransactionState::Authorized,
            (Some(_), true) => TransactionState::Voided,
        }
    }

    /// Returns the amount still available for capture.
    ///
    /// None until the transaction is authorized.
    pub fn balance(&self) -> Option<&Money> {
        self.authorization.as_ref().map(|auth| &auth.balance)
    }

    /// Returns the amount reserved by the authorization.
    pub fn authorized_amount(&self) -> Option<&Money> {
        self.authorization.as_ref().map(|auth| &auth.authorized)
    }

    pub fn card(&self) -> Option<&Card> {
        self.authorization.as_ref().map(|auth| &auth.card)
    }

    pub fn is_authorized(&self) -> bool {
        self.authorization.is_some()
    }

    pub fn is_voided(&self) -> bool {
        self.voided
    }

    /// Returns the events recorded but not yet saved.
    pub fn uncommitted(&self) -> &[TransactionEvent] {
        &self.uncommitted
    }
}

// Command methods (record events)
impl Transaction {
    /// Reserves `amount` on `card`.
    pub fn authorize(&mut self, card: Card, amount: Money) -> Result<(), TransactionError> {
        if !self.state().can_authorize() {
            return Err(TransactionError::AlreadyAuthorized);
        }
        if !amount.is_positive() {
            return Err(TransactionError::InsufficientAmount);
        }
        if card.is_zero() {
            return Err(TransactionError::InvalidCard);
        }
        if card.is_expired() {
            return Err(TransactionError::CardExpired);
        }
        if card.number() == AUTH_DECLINE_NUMBER {
            return Err(TransactionError::CardAuthFailed);
        }

        self.record(TransactionEvent::authorized(card, amount));
        Ok(())
    }

    /// Releases the authorization.
    ///
    /// Voiding an already voided transaction succeeds without recording
    /// anything. Only an untouched authorization can be voided.
    pub fn void(&mut self) -> Result<(), TransactionError> {
        if self.state().is_terminal() {
            return Ok(());
        }
        let auth = self.authorization()?;
        if auth.balance != auth.authorized {
            return Err(TransactionError::VoidRejected);
        }

        self.record(TransactionEvent::voided());
        Ok(())
    }

    /// Collects `amount` from the available balance.
    pub fn capture(&mut self, amount: Money) -> Result<(), TransactionError> {
        let auth = self.authorization()?;
        if auth.card.number() == CAPTURE_DECLINE_NUMBER {
            return Err(TransactionError::CardCaptureFailed);
        }
        if !self.state().can_move_funds() {
            return Err(TransactionError::Voided);
        }
        ensure_same_currency(&auth.balance, &amount)?;
        if amount.greater_than(&auth.balance) {
            return Err(TransactionError::CaptureExceeded);
        }
        if !amount.is_positive() {
            return Err(TransactionError::InsufficientAmount);
        }

        self.record(TransactionEvent::captured(amount));
        Ok(())
    }

    /// Returns `amount` of the captured funds.
    pub fn refund(&mut self, amount: Money) -> Result<(), TransactionError> {
        let auth = self.authorization()?;
        if auth.card.number() == REFUND_DECLINE_NUMBER {
            return Err(TransactionError::CardRefundFailed);
        }
        if !self.state().can_move_funds() {
            return Err(TransactionError::Voided);
        }
        ensure_same_currency(&auth.balance, &amount)?;
        let refundable = auth.authorized.minus(&auth.balance);
        if amount.greater_than(&refundable) {
            return Err(TransactionError::RefundExceeded);
        }
        if !amount.is_positive() {
            return Err(TransactionError::InsufficientAmount);
        }

        self.record(TransactionEvent::refunded(amount));
        Ok(())
    }

    fn authorization(&self) -> Result<&Authorization, TransactionError> {
        self.authorization
            .as_ref()
            .ok_or(TransactionError::NotFound)
    }

    fn record(&mut self, event: TransactionEvent) {
        self.uncommitted.push(event);
    }
}

// Apply helpers
impl Transaction {
    fn apply_authorized(&mut self, data: AuthorizedData) {
        if self.authorization.is_some() {
            return;
        }
        self.authorization = Some(Authorization {
            card: data.card,
            balance: data.amount.clone(),
            authorized: data.amount,
        });
    }
}

fn ensure_same_currency(balance: &Money, amount: &Money) -> Result<(), TransactionError> {
    if balance.same_currency(amount) {
        Ok(())
    } else {
        Err(TransactionError::CurrencyMismatch {
            expected: balance.currency().clone(),
            found: amount.currency().clone(),
        })
    }
}
