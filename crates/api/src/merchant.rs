//! Merchant identity taken from the request.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use domain::Merchant;
use event_store::EventStore;

use crate::AppState;

/// The merchant behind an HTTP request.
///
/// With no merchant token configured every request is trusted. Otherwise the
/// request must carry `Authorization: Bearer <token>` with the configured
/// token. A missing or wrong token is not rejected here; the gateway refuses
/// the operation.
#[derive(Debug, Clone, Copy)]
pub struct RequestMerchant {
    authenticated: bool,
}

impl RequestMerchant {
    pub fn from_headers(headers: &HeaderMap, expected_token: Option<&str>) -> Self {
        let authenticated = match expected_token {
            None => true,
            Some(expected) => bearer_token(headers) == Some(expected),
        };
        Self { authenticated }
    }
}

impl Merchant for RequestMerchant {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

impl<S: EventStore + 'static> FromRequestParts<Arc<AppState<S>>> for RequestMerchant {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(
            &parts.headers,
            state.merchant_token.as_deref(),
        ))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(authorization: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = authorization {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_trusted_without_configured_token() {
        let merchant = RequestMerchant::from_headers(&headers(None), None);
        assert!(merchant.is_authenticated());
    }

    #[test]
    fn test_token_must_match() {
        let expected = Some("s3cret");

        assert!(RequestMerchant::from_headers(&headers(Some("Bearer s3cret")), expected).is_authenticated());
        assert!(!RequestMerchant::from_headers(&headers(Some("Bearer nope")), expected).is_authenticated());
        assert!(!RequestMerchant::from_headers(&headers(Some("s3cret")), expected).is_authenticated());
        assert!(!RequestMerchant::from_headers(&headers(Some("Bearer ")), expected).is_authenticated());
        assert!(!RequestMerchant::from_headers(&headers(None), expected).is_authenticated());
    }
}
