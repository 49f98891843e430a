//! Pagination types
//!
//! Defines where a page document keeps its items and its next link.

use crate::types::{JsonValue, DEFAULT_ITEMS_KEY, DEFAULT_NEXT_URL_KEY};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available at this URL
    Continue {
        /// URL of the next page, as found in the document
        url: String,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with a new URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::Continue { url: url.into() }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }

    /// URL of the next page, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Continue { url } => Some(url),
            Self::Done => None,
        }
    }
}

/// Location of a field inside a page document.
///
/// Keys are exact top-level member names unless explicitly configured as
/// RFC 6901 JSON Pointers. In serialized config a member is a plain string
/// and a pointer is `{"pointer": "/links/next"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldKey {
    /// Exact top-level member name, e.g. `hydra:member` or `/next`
    Member(String),
    /// JSON Pointer into the document, e.g. `/links/next`
    Pointer {
        /// The pointer expression
        pointer: String,
    },
}

impl FieldKey {
    /// Exact member name
    pub fn member(name: impl Into<String>) -> Self {
        Self::Member(name.into())
    }

    /// JSON Pointer
    pub fn pointer(pointer: impl Into<String>) -> Self {
        Self::Pointer {
            pointer: pointer.into(),
        }
    }

    /// The configured key or pointer text
    pub fn as_str(&self) -> &str {
        match self {
            Self::Member(name) => name,
            Self::Pointer { pointer } => pointer,
        }
    }

    /// Borrow the field from a document
    pub fn get<'v>(&self, doc: &'v JsonValue) -> Option<&'v JsonValue> {
        match self {
            Self::Member(name) => doc.as_object()?.get(name),
            Self::Pointer { pointer } => doc.pointer(pointer),
        }
    }

    /// Move the field out of a document, leaving nothing (or `null`) behind
    pub fn take(&self, doc: &mut JsonValue) -> Option<JsonValue> {
        match self {
            Self::Member(name) => doc.as_object_mut()?.remove(name),
            Self::Pointer { pointer } => doc.pointer_mut(pointer).map(JsonValue::take),
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-harvest pagination settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Location of the item array in each page document
    pub items_key: FieldKey,
    /// Location of the next page URL in each page document
    pub next_url_key: FieldKey,
    /// Upper bound on pages requested in one harvest (None = unlimited)
    pub max_pages: Option<usize>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self::with_keys(DEFAULT_ITEMS_KEY, DEFAULT_NEXT_URL_KEY)
    }
}

impl PaginationConfig {
    /// Create a config with the Hydra defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with custom member names, used exactly as given
    pub fn with_keys(items_key: impl Into<String>, next_url_key: impl Into<String>) -> Self {
        Self {
            items_key: FieldKey::member(items_key),
            next_url_key: FieldKey::member(next_url_key),
            max_pages: None,
        }
    }

    /// Set the items member name
    #[must_use]
    pub fn with_items_key(mut self, key: impl Into<String>) -> Self {
        self.items_key = FieldKey::member(key);
        self
    }

    /// Set the next URL member name
    #[must_use]
    pub fn with_next_url_key(mut self, key: impl Into<String>) -> Self {
        self.next_url_key = FieldKey::member(key);
        self
    }

    /// Read the item array through a JSON Pointer
    #[must_use]
    pub fn with_items_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.items_key = FieldKey::pointer(pointer);
        self
    }

    /// Read the next page URL through a JSON Pointer, e.g. `/links/next`
    #[must_use]
    pub fn with_next_url_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.next_url_key = FieldKey::pointer(pointer);
        self
    }

    /// Limit the number of pages requested
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Extract the next page link from a page document.
    ///
    /// Absent, `null` and empty links end pagination. Links of any other
    /// non-string type also end it, with a warning.
    pub fn next_page(&self, doc: &JsonValue) -> NextPage {
        match self.next_url_key.get(doc) {
            Some(JsonValue::String(url)) if !url.is_empty() => NextPage::with_url(url.as_str()),
            None | Some(JsonValue::Null | JsonValue::String(_)) => NextPage::Done,
            Some(other) => {
                warn!(
                    key = %self.next_url_key,
                    value = %other,
                    "next page link is not a string, ending pagination"
                );
                NextPage::Done
            }
        }
    }

    /// Move the item array out of a page document.
    ///
    /// Returns `None` when the key is absent or `null`, which means the page
    /// has no items.
    pub fn take_items(&self, doc: &mut JsonValue) -> Option<JsonValue> {
        match self.items_key.take(doc) {
            None | Some(JsonValue::Null) => None,
            Some(items) => Some(items),
        }
    }
}
