//! HTTP module
//!
//! The page fetcher side of a harvest.
//!
//! # Features
//!
//! - **Non-blocking fetches**: `PageFetcher` returns a handle immediately
//! - **Pluggable transport**: any `Transport` implementation can serve pages
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Base URL resolution**: relative next links resolve against the base URL

mod client;
mod fetcher;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, Transport};
pub use fetcher::{PageFetcher, PageResponse};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
