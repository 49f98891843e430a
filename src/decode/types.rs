//! Decoder traits
//!
//! Defines the boundary between page documents and typed items.

use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Maps one page's item array into typed items.
///
/// The whole array is decoded at once; a failure rejects the entire page.
pub trait ItemDecoder<T>: Send + Sync {
    /// Decode an already-parsed item array
    fn decode(&self, items: JsonValue) -> Result<Vec<T>>;

    /// Decode raw JSON array bytes
    fn decode_slice(&self, bytes: &[u8]) -> Result<Vec<T>> {
        let items: JsonValue = serde_json::from_slice(bytes)
            .map_err(|e| Error::decode(format!("Item array is not valid JSON: {e}")))?;
        self.decode(items)
    }
}
