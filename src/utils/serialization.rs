// src/utils/serialization.rs
//! Serialization utilities for the registry.
//!
//! Thin wrappers over `serde_json` so every persisted artifact goes through
//! one encoding path.

use serde::{de::DeserializeOwned, Serialize};

/// Serializes a value to pretty-printed JSON bytes.
///
/// # Returns
/// - `Ok(Vec<u8>)` with the JSON document on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn serialize<T: Serialize>(data: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(data)
}

/// Deserializes a value from JSON bytes.
///
/// # Returns
/// - `Ok(T)` with deserialized value on success
/// - `Err(serde_json::Error)` if the bytes are not a valid `T`
pub fn deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(data)
}
