//! Error types for resource-harvester
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for resource-harvester
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Request for {url} was aborted: {message}")]
    RequestAborted { url: String, message: String },

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to decode items: {message}")]
    Decode { message: String },
}

/// Which stage of page processing a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Network, connection or non-success HTTP status on a page fetch
    Transport,
    /// Response body is not valid JSON
    Parse,
    /// The item array could not be mapped into the target type
    Decode,
    /// Invalid configuration, never produced by a page
    Config,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Parse => "parse",
            Self::Decode => "decode",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an HTTP status error.
    ///
    /// The response body is cut to [`MAX_ERROR_BODY_CHARS`] characters.
    pub fn http_status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
            body: truncate_body(body.into()),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    /// Classify this error by the page-processing stage it belongs to
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Http(_)
            | Error::HttpStatus { .. }
            | Error::Timeout { .. }
            | Error::RequestAborted { .. }
            | Error::InvalidUrl { .. } => FailureKind::Transport,
            Error::JsonParse(_) => FailureKind::Parse,
            Error::Decode { .. } => FailureKind::Decode,
            Error::Config { .. } => FailureKind::Config,
        }
    }

    /// HTTP status code, if this error came from a non-success response
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Longest response body kept in an [`Error::HttpStatus`]
pub const MAX_ERROR_BODY_CHARS: usize = 512;

fn truncate_body(mut body: String) -> String {
    if let Some((cut, _)) = body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

/// Result type alias for resource-harvester
pub type Result<T> = std::result::Result<T, Error>;
