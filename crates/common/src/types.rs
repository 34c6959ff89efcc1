use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a generated aggregate identifier.
const GENERATED_ID_LEN: usize = 20;

/// Unique identifier for an aggregate instance (one event stream).
///
/// Identifiers are opaque strings chosen by the caller, or random
/// 20-character alphanumeric values when the caller has none.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AggregateId(String);

impl AggregateId {
    /// Creates a new random aggregate ID.
    pub fn new() -> Self {
        let id: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_ID_LEN)
            .map(char::from)
            .collect();
        Self(id)
    }

    /// Creates an aggregate ID from a caller supplied value.
    ///
    /// Fails if the value is empty or only whitespace.
    pub fn parse(id: impl Into<String>) -> Result<Self, InvalidAggregateId> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InvalidAggregateId);
        }
        Ok(Self(id))
    }

    /// Uses the supplied value when present and non-empty, otherwise
    /// generates a fresh identifier.
    pub fn or_generate(id: Option<&str>) -> Self {
        match id {
            Some(id) if !id.trim().is_empty() => Self(id.to_string()),
            _ => Self::new(),
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AggregateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AggregateId {
    type Error = InvalidAggregateId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AggregateId> for String {
    fn from(id: AggregateId) -> Self {
        id.0
    }
}

impl AsRef<str> for AggregateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error returned when an aggregate identifier is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("aggregate id must not be empty")]
pub struct InvalidAggregateId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_id_new_creates_unique_ids() {
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn aggregate_id_new_is_twenty_alphanumeric_chars() {
        let id = AggregateId::new();
        assert_eq!(id.as_str().len(), 20);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn aggregate_id_parse_preserves_value() {
        let id = AggregateId::parse("tx-42").unwrap();
        assert_eq!(id.as_str(), "tx-42");
        assert_eq!(id.to_string(), "tx-42");
    }

    #[test]
    fn aggregate_id_parse_rejects_blank() {
        assert_eq!(AggregateId::parse(""), Err(InvalidAggregateId));
        assert_eq!(AggregateId::parse("   "), Err(InvalidAggregateId));
    }

    #[test]
    fn aggregate_id_or_generate() {
        assert_eq!(AggregateId::or_generate(Some("abc")).as_str(), "abc");
        assert_eq!(AggregateId::or_generate(Some("")).as_str().len(), 20);
        assert_eq!(AggregateId::or_generate(None).as_str().len(), 20);
    }

    #[test]
    fn aggregate_id_serialization_roundtrip() {
        let id = AggregateId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let deserialized: AggregateId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn invalid_aggregate_id_is_an_error() {
        let err: Box<dyn std::error::Error> = Box::new(InvalidAggregateId);
        assert_eq!(err.to_string(), "aggregate id must not be empty");
        assert_eq!(
            AggregateId::try_from(String::new()).unwrap_err().to_string(),
            "aggregate id must not be empty"
        );
    }

    #[test]
    fn aggregate_id_deserialization_rejects_empty() {
        let result: Result<AggregateId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
