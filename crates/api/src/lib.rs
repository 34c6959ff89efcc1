//! HTTP API server for the payment service.
//!
//! Exposes authorize, void, capture and refund over REST, plus read
//! projections of transactions and their event logs, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod merchant;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::PaymentGateway;
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore> {
    pub gateway: PaymentGateway<S>,
    /// Token merchants must present; None trusts every request.
    pub merchant_token: Option<String>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/transactions/authorize",
            post(routes::transactions::authorize::<S>),
        )
        .route("/transactions/{id}", get(routes::transactions::get::<S>))
        .route(
            "/transactions/{id}/events",
            get(routes::transactions::events::<S>),
        )
        .route(
            "/transactions/{id}/void",
            put(routes::transactions::void::<S>),
        )
        .route(
            "/transactions/{id}/capture",
            put(routes::transactions::capture::<S>),
        )
        .route(
            "/transactions/{id}/refund",
            put(routes::transactions::refund::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `event_store`.
pub fn create_default_state<S: EventStore + 'static>(
    event_store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    let gateway = PaymentGateway::new(event_store).with_conflict_retries(config.conflict_retries);

    Arc::new(AppState {
        gateway,
        merchant_token: config.merchant_token.clone(),
    })
}
