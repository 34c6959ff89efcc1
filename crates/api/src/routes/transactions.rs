//! Payment transaction endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::AggregateId;
use domain::{Card, DomainError, Merchant, Money, Transaction, TransactionEvent};
use event_store::{EventEnvelope, EventStore};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::merchant::RequestMerchant;

// -- Request types --

#[derive(Deserialize)]
pub struct AuthorizeRequest {
    /// Caller chosen transaction ID; generated when absent or empty.
    pub id: Option<String>,
    pub card: Card,
    pub money: Money,
}

// -- Response types --

/// Balance left on a transaction after an operation.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub id: String,
    pub available: Money,
}

/// Card details safe to show: the number is masked and the cvv omitted.
#[derive(Debug, Serialize)]
pub struct CardSummary {
    pub owner: String,
    pub number: String,
    pub expiry: String,
}

impl From<&Card> for CardSummary {
    fn from(card: &Card) -> Self {
        Self {
            owner: card.owner().to_string(),
            number: card.masked_number(),
            expiry: card.expiry().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub state: String,
    pub authorized: Money,
    pub available: Money,
    pub voided: bool,
    pub card: CardSummary,
    pub version: i64,
}

impl TransactionResponse {
    /// Builds the projection, or None if the transaction was never authorized.
    fn from_transaction(tx: &Transaction) -> Option<Self> {
        use domain::Aggregate;

        Some(Self {
            id: tx.id().to_string(),
            state: tx.state().to_string(),
            authorized: tx.authorized_amount()?.clone(),
            available: tx.balance()?.clone(),
            voided: tx.is_voided(),
            card: tx.card()?.into(),
            version: tx.version().as_i64(),
        })
    }
}

/// One log record with the card reduced to a summary.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub event_id: String,
    pub event_name: String,
    pub version: i64,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardSummary>,
}

impl TryFrom<EventEnvelope> for EventResponse {
    type Error = ApiError;

    fn try_from(record: EventEnvelope) -> Result<Self, Self::Error> {
        let event: TransactionEvent =
            serde_json::from_value(record.payload).map_err(DomainError::from)?;
        let (amount, card) = match event {
            TransactionEvent::Authorized(data) => {
                let card = CardSummary::from(&data.card);
                (Some(data.amount), Some(card))
            }
            TransactionEvent::Voided(_) => (None, None),
            TransactionEvent::Captured(data) => (Some(data.amount), None),
            TransactionEvent::Refunded(data) => (Some(data.amount), None),
        };

        Ok(Self {
            event_id: record.event_id.to_string(),
            event_name: record.event_name,
            version: record.version.as_i64(),
            created_at: record.created_at.to_rfc3339(),
            amount,
            card,
        })
    }
}

// -- Handlers --

/// POST /transactions/authorize: reserve funds on a card.
#[tracing::instrument(skip(state, merchant, body))]
pub async fn authorize<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    merchant: RequestMerchant,
    body: Result<Json<AuthorizeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BalanceResponse>), ApiError> {
    ensure_authenticated(&merchant)?;
    let Json(req) = body?;
    let id = AggregateId::or_generate(req.id.as_deref());

    let available = state
        .gateway
        .authorize(&id, &merchant, req.card, req.money)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BalanceResponse {
            id: id.to_string(),
            available,
        }),
    ))
}

/// PUT /transactions/{id}/void: release an untouched authorization.
#[tracing::instrument(skip(state, merchant))]
pub async fn void<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    merchant: RequestMerchant,
    Path(id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    ensure_authenticated(&merchant)?;
    let id = parse_id(&id)?;
    let available = state.gateway.void(&id, &merchant).await?;
    Ok(Json(BalanceResponse {
        id: id.to_string(),
        available,
    }))
}

/// PUT /transactions/{id}/capture: collect part of the balance.
#[tracing::instrument(skip(state, merchant, body))]
pub async fn capture<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    merchant: RequestMerchant,
    Path(id): Path<String>,
    body: Result<Json<Money>, JsonRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    ensure_authenticated(&merchant)?;
    let id = parse_id(&id)?;
    let Json(amount) = body?;
    let available = state.gateway.capture(&id, &merchant, amount).await?;
    Ok(Json(BalanceResponse {
        id: id.to_string(),
        available,
    }))
}

/// PUT /transactions/{id}/refund: return captured funds.
#[tracing::instrument(skip(state, merchant, body))]
pub async fn refund<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    merchant: RequestMerchant,
    Path(id): Path<String>,
    body: Result<Json<Money>, JsonRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    ensure_authenticated(&merchant)?;
    let id = parse_id(&id)?;
    let Json(amount) = body?;
    let available = state.gateway.refund(&id, &merchant, amount).await?;
    Ok(Json(BalanceResponse {
        id: id.to_string(),
        available,
    }))
}

/// GET /transactions/{id}: the transaction replayed from its events.
#[tracing::instrument(skip(state, merchant))]
pub async fn get<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    merchant: RequestMerchant,
    Path(id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    ensure_authenticated(&merchant)?;
    let aggregate_id = parse_id(&id)?;

    let tx = state.gateway.transaction(&aggregate_id).await?;
    let response = TransactionResponse::from_transaction(&tx)
        .ok_or_else(|| ApiError::NotFound(format!("transaction {id} not found")))?;

    Ok(Json(response))
}

/// GET /transactions/{id}/events: the transaction's log records.
#[tracing::instrument(skip(state, merchant))]
pub async fn events<S: EventStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    merchant: RequestMerchant,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    ensure_authenticated(&merchant)?;
    let aggregate_id = parse_id(&id)?;

    let records = state.gateway.history(&aggregate_id).await?;
    let responses = records
        .into_iter()
        .map(EventResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(responses))
}

fn parse_id(id: &str) -> Result<AggregateId, ApiError> {
    AggregateId::parse(id).map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn ensure_authenticated(merchant: &RequestMerchant) -> Result<(), ApiError> {
    if merchant.is_authenticated() {
        Ok(())
    } else {
        Err(DomainError::Forbidden.into())
    }
}
