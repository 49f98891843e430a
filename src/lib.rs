//! # resource-harvester
//!
//! Harvest every item of a paginated JSON API that embeds a "next page"
//! link in each response (Hydra collections, `next_page_url` style APIs,
//! JSON:API `links.next`), as one lazily evaluated stream of typed items.
//!
//! ## Features
//!
//! - **Lazy streaming**: items are decoded and handed out one page at a time
//! - **Prefetch**: the next page is requested while the current one is consumed
//! - **Typed items**: pages decode into any `serde::Deserialize` type
//! - **Failure isolation**: a bad page ends the harvest cleanly, with a report
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use resource_harvester::{Harvester, HttpClient, HttpClientConfig, Result};
//!
//! #[derive(serde::Deserialize)]
//! struct Book {
//!     id: u32,
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HttpClient::with_config(
//!         HttpClientConfig::builder().base_url("https://api.example.com").build(),
//!     )?;
//!     let harvester = Harvester::from_client(client);
//!
//!     let mut books = harvester.harvest::<Book>("/books");
//!     while let Some(book) = books.next().await {
//!         println!("{}: {}", book.id, book.title);
//!     }
//!
//!     if let Some(failure) = books.report().and_then(|report| report.failure()) {
//!         eprintln!("harvest truncated: {failure}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                 Harvester::harvest(url) → Harvest<T>          │
//! └───────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──────────────┬─────────────────┐
//! │    HTTP      │          Engine              │     Decode      │
//! ├──────────────┼──────────────────────────────┼─────────────────┤
//! │ PageFetcher  │ fetch → next link → prefetch │ SerdeDecoder    │
//! │ Transport    │ → decode → emit → repeat     │ FnDecoder       │
//! │ Rate Limit   │ HarvestReport                │                 │
//! └──────────────┴──────────────────────────────┴─────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Page fetching over HTTP
pub mod http;

/// Next-link pagination contract
pub mod pagination;

/// Item decoders
pub mod decode;

/// Harvest engine
pub mod engine;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, FailureKind, Result};
pub use types::*;

pub use decode::{FnDecoder, ItemDecoder, SerdeDecoder};
pub use engine::{Harvest, HarvestOutcome, HarvestReport, HarvestStats, Harvester, PageFailure};
pub use http::{HttpClient, HttpClientConfig, PageFetcher, PageResponse, Transport};
pub use pagination::PaginationConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
