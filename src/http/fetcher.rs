//! Non-blocking page fetcher
//!
//! `PageFetcher::fetch` starts the request on the tokio runtime and returns a
//! `PageResponse` handle right away. Failures only show up once the handle is
//! materialized, which lets the engine issue the next request before it has
//! validated the current one.

use super::client::Transport;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use bytes::Bytes;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Issues page requests against a [`Transport`]
#[derive(Clone)]
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
}

impl PageFetcher {
    /// Create a fetcher over the given transport
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Create a fetcher over a shared transport
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Start a GET for `url` and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch(&self, url: &str) -> PageResponse {
        debug!(url, "issuing page request");
        let transport = Arc::clone(&self.transport);
        let target = url.to_string();
        let task = tokio::spawn(async move { transport.get(&target).await });

        PageResponse {
            url: url.to_string(),
            task,
        }
    }
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher").finish_non_exhaustive()
    }
}

/// Handle to one in-flight or completed page response.
///
/// Dropping the handle aborts the request if it is still running.
pub struct PageResponse {
    url: String,
    task: JoinHandle<Result<Bytes>>,
}

impl PageResponse {
    /// URL this response was requested for
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the request has already finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the response body
    pub async fn content(mut self) -> Result<Bytes> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) => Err(Error::RequestAborted {
                url: self.url.clone(),
                message: e.to_string(),
            }),
        }
    }

    /// Wait for the response body and parse it as JSON
    pub async fn json(self) -> Result<JsonValue> {
        let body = self.content().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl Drop for PageResponse {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for PageResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageResponse")
            .field("url", &self.url)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
