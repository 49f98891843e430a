//! Common types used throughout resource-harvester

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Default key of the item array in Hydra collections
pub const DEFAULT_ITEMS_KEY: &str = "hydra:member";

/// Default key of the next-page link in Hydra collections
pub const DEFAULT_NEXT_URL_KEY: &str = "hydra:next";
