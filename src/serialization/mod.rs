//! JSON serialization for stored governance records.
//!
//! Every value the engine writes to the key-value store is JSON:
//! - Amounts as decimal strings, ids as decimal strings
//! - Field order fixed by struct declaration, so identical records encode
//!   to identical bytes on every replica
//! - Schema evolution through `#[serde(default)]`

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Serialization errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    /// JSON encoding failed.
    #[error("JSON encoding failed: {0}")]
    Encode(String),

    /// JSON decoding failed.
    #[error("JSON decoding failed: {0}")]
    Decode(String),
}

/// Serialize to JSON bytes.
pub fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    serde_json::to_vec(value).map_err(|e| SerializationError::Encode(e.to_string()))
}

/// Deserialize from JSON bytes.
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::Decode(e.to_string()))
}
