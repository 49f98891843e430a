//! Harvest engine module
//!
//! Walks next-link paginated collections.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Harvester` - Starts harvests against one page fetcher
//! - `Harvest` - The lazy item stream of a single harvest
//! - `HarvestReport` - Outcome and statistics once a harvest has ended
//!
//! Each harvest runs this state machine, one step per pull:
//!
//! ```text
//! Start ──▶ Processing ──▶ Emitting ──┬──▶ Processing (prefetched next page)
//!               │              ▲      └──▶ Done
//!               │              └─ one item per pull
//!               └──▶ Draining ──▶ Done   (page failure)
//! ```
//!
//! While a page's items are being emitted, the request for the following
//! page is already in flight. At most one decoded page and one prefetched
//! response are held at any time.

mod stream;
mod types;

pub use stream::Harvest;
pub use types::{HarvestOutcome, HarvestReport, HarvestStats, PageFailure};

use crate::decode::{ItemDecoder, SerdeDecoder};
use crate::error::Result;
use crate::http::{HttpClient, PageFetcher, PageResponse};
use crate::pagination::{NextPage, PaginationConfig};
use futures::stream::{unfold, BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// Starts harvests of next-link paginated collections
#[derive(Debug, Clone)]
pub struct Harvester {
    /// Page fetcher
    fetcher: PageFetcher,
    /// Pagination settings shared by every harvest
    config: PaginationConfig,
}

impl Harvester {
    /// Create a new harvester
    pub fn new(fetcher: PageFetcher, config: PaginationConfig) -> Self {
        Self { fetcher, config }
    }

    /// Create a harvester over an HTTP client with the Hydra defaults
    pub fn from_client(client: HttpClient) -> Self {
        Self::new(PageFetcher::new(client), PaginationConfig::default())
    }

    /// Set pagination configuration
    #[must_use]
    pub fn with_config(mut self, config: PaginationConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the pagination configuration
    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Harvest every item reachable from `initial_url`, decoded with serde.
    ///
    /// Nothing is requested until the returned stream is first polled. Page
    /// requests run as tokio tasks, so the stream must be polled from within
    /// a tokio runtime.
    pub fn harvest<T>(&self, initial_url: impl Into<String>) -> Harvest<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.harvest_with(initial_url, SerdeDecoder::<T>::new())
    }

    /// Harvest every item reachable from `initial_url` with a custom decoder.
    ///
    /// Like [`Harvester::harvest`], the stream must be polled from within a
    /// tokio runtime.
    pub fn harvest_with<T, D>(&self, initial_url: impl Into<String>, decoder: D) -> Harvest<T>
    where
        T: Send + 'static,
        D: ItemDecoder<T> + 'static,
    {
        let traversal = Traversal {
            fetcher: self.fetcher.clone(),
            config: self.config.clone(),
            decoder: Box::new(decoder),
            stats: HarvestStats::new(),
            pages_issued: 0,
            limit_reached: false,
        };
        Harvest::new(traversal.into_steps(initial_url.into()))
    }
}

/// One pull's worth of output from a traversal
pub(crate) enum Step<T> {
    /// A decoded item for the consumer
    Item(T),
    /// The traversal has ended; always the last step
    End(HarvestReport),
}

enum Phase<T> {
    Start {
        initial_url: String,
    },
    Processing {
        response: PageResponse,
    },
    Emitting {
        items: std::vec::IntoIter<T>,
        next: Option<PageResponse>,
    },
    Draining(PageFailure),
    Done,
    Finished,
}

struct PageBatch<T> {
    items: Vec<T>,
    next: Option<PageResponse>,
}

struct Traversal<T> {
    fetcher: PageFetcher,
    config: PaginationConfig,
    decoder: Box<dyn ItemDecoder<T>>,
    stats: HarvestStats,
    pages_issued: usize,
    limit_reached: bool,
}

impl<T: Send + 'static> Traversal<T> {
    fn into_steps(self, initial_url: String) -> BoxStream<'static, Step<T>> {
        unfold(
            (self, Phase::Start { initial_url }),
            |(mut traversal, phase)| async move {
                let (step, phase) = traversal.advance(phase).await?;
                Some((step, (traversal, phase)))
            },
        )
        .boxed()
    }

    /// Drive the state machine until it produces a step
    async fn advance(&mut self, mut phase: Phase<T>) -> Option<(Step<T>, Phase<T>)> {
        loop {
            phase = match phase {
                Phase::Start { initial_url } => {
                    self.stats.mark_started();
                    if self.config.max_pages == Some(0) {
                        self.limit_reached = true;
                        Phase::Done
                    } else {
                        Phase::Processing {
                            response: self.issue(&initial_url),
                        }
                    }
                }
                Phase::Processing { response } => {
                    let url = response.url().to_string();
                    let page = self.stats.pages_fetched + 1;
                    match self.process_page(response).await {
                        Ok(PageBatch { items, next }) => Phase::Emitting {
                            items: items.into_iter(),
                            next,
                        },
                        Err(error) => Phase::Draining(PageFailure::new(url, page, error)),
                    }
                }
                Phase::Emitting { mut items, next } => {
                    if let Some(item) = items.next() {
                        self.stats.add_item();
                        return Some((Step::Item(item), Phase::Emitting { items, next }));
                    }
                    match next {
                        Some(response) => Phase::Processing { response },
                        None => Phase::Done,
                    }
                }
                Phase::Draining(failure) => {
                    warn!(
                        url = %failure.url,
                        page = failure.page,
                        kind = %failure.kind(),
                        error = %failure.error,
                        items = self.stats.items_emitted,
                        "harvest truncated by page failure"
                    );
                    let report = self.finish(HarvestOutcome::Truncated(failure));
                    return Some((Step::End(report), Phase::Finished));
                }
                Phase::Done => {
                    let outcome = match self.config.max_pages {
                        Some(max_pages) if self.limit_reached => {
                            HarvestOutcome::PageLimitReached { max_pages }
                        }
                        _ => HarvestOutcome::Completed,
                    };
                    info!(
                        pages = self.stats.pages_fetched,
                        items = self.stats.items_emitted,
                        limit_reached = self.limit_reached,
                        "harvest finished"
                    );
                    return Some((Step::End(self.finish(outcome)), Phase::Finished));
                }
                Phase::Finished => return None,
            };
        }
    }

    /// Materialize, parse and decode one page, prefetching its successor
    async fn process_page(&mut self, response: PageResponse) -> Result<PageBatch<T>> {
        let url = response.url().to_string();
        let body = response.content().await?;
        self.stats.add_page(body.len());

        let mut doc: serde_json::Value = serde_json::from_slice(&body)?;
        drop(body);

        // Issued before decoding so the request overlaps with decode work
        let next = match self.config.next_page(&doc) {
            NextPage::Continue { url: next_url } => self.prefetch(&next_url),
            NextPage::Done => None,
        };

        // A decode failure drops `next`, aborting the prefetched request
        let items = match self.config.take_items(&mut doc) {
            Some(raw) => self.decoder.decode(raw)?,
            None => {
                debug!(url = %url, key = %self.config.items_key, "page has no items");
                Vec::new()
            }
        };

        debug!(
            url = %url,
            page = self.stats.pages_fetched,
            items = items.len(),
            has_next = next.is_some(),
            "page decoded"
        );
        Ok(PageBatch { items, next })
    }

    fn issue(&mut self, url: &str) -> PageResponse {
        self.pages_issued += 1;
        self.fetcher.fetch(url)
    }

    fn prefetch(&mut self, url: &str) -> Option<PageResponse> {
        if let Some(max_pages) = self.config.max_pages {
            if self.pages_issued >= max_pages {
                info!(max_pages, next = url, "page limit reached, not following next link");
                self.limit_reached = true;
                return None;
            }
        }
        Some(self.issue(url))
    }

    fn finish(&mut self, outcome: HarvestOutcome) -> HarvestReport {
        self.stats.mark_finished();
        HarvestReport {
            outcome,
            stats: std::mem::take(&mut self.stats),
        }
    }
}

#[cfg(test)]
mod tests;
