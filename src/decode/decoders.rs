//! Decoder implementations

use super::types::ItemDecoder;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

// ============================================================================
// Serde Decoder
// ============================================================================

/// Decodes item arrays through `serde_json` into `Vec<T>`
pub struct SerdeDecoder<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> SerdeDecoder<T> {
    /// Create a new serde decoder
    pub fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> Default for SerdeDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeDecoder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SerdeDecoder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerdeDecoder")
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> ItemDecoder<T> for SerdeDecoder<T> {
    fn decode(&self, items: JsonValue) -> Result<Vec<T>> {
        if !items.is_array() {
            return Err(Error::decode(format!(
                "expected an array of items, found {}",
                json_type_name(&items)
            )));
        }
        serde_json::from_value(items).map_err(|e| {
            Error::decode(format!(
                "cannot map items into {}: {e}",
                std::any::type_name::<T>()
            ))
        })
    }
}

// ============================================================================
// Function Decoder
// ============================================================================

/// Decoder backed by a closure over the raw item array
pub struct FnDecoder<F> {
    decode_fn: F,
}

impl<F> FnDecoder<F> {
    /// Wrap a closure as a decoder
    pub fn new(decode_fn: F) -> Self {
        Self { decode_fn }
    }
}

impl<T, F> ItemDecoder<T> for FnDecoder<F>
where
    F: Fn(JsonValue) -> Result<Vec<T>> + Send + Sync,
{
    fn decode(&self, items: JsonValue) -> Result<Vec<T>> {
        (self.decode_fn)(items)
    }
}

impl<F> std::fmt::Debug for FnDecoder<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnDecoder").finish_non_exhaustive()
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
