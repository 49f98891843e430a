//! Engine types
//!
//! Outcome, failure and statistics types reported at the end of a harvest.

use crate::error::{Error, FailureKind};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A page that could not be fetched, parsed or decoded
#[derive(Error, Debug)]
#[error("page {page} ({url}) failed: {error}")]
pub struct PageFailure {
    /// URL the page was requested from
    pub url: String,
    /// 1-based position of the page in the harvest
    pub page: usize,
    /// What went wrong
    #[source]
    pub error: Error,
}

impl PageFailure {
    /// Create a new page failure
    pub fn new(url: impl Into<String>, page: usize, error: Error) -> Self {
        Self {
            url: url.into(),
            page,
            error,
        }
    }

    /// Stage of page processing that failed
    pub fn kind(&self) -> FailureKind {
        self.error.failure_kind()
    }
}

/// How a harvest ended
#[derive(Debug)]
pub enum HarvestOutcome {
    /// The last page had no next link
    Completed,
    /// The configured page limit stopped pagination
    PageLimitReached {
        /// The configured limit
        max_pages: usize,
    },
    /// A page failed; items of that page and later pages were not emitted
    Truncated(PageFailure),
}

impl HarvestOutcome {
    /// Check if every page reachable from the initial URL was harvested
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Check if a page failure cut the harvest short
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated(_))
    }

    /// The page failure, if any
    pub fn failure(&self) -> Option<&PageFailure> {
        match self {
            Self::Truncated(failure) => Some(failure),
            _ => None,
        }
    }

    /// Take the page failure, if any
    pub fn into_failure(self) -> Option<PageFailure> {
        match self {
            Self::Truncated(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Statistics from a harvest
#[derive(Debug, Clone, Default)]
pub struct HarvestStats {
    /// Pages whose body was received
    pub pages_fetched: usize,
    /// Items handed to the consumer
    pub items_emitted: usize,
    /// Body bytes received
    pub bytes_received: u64,
    /// When the first page was requested
    pub started_at: Option<DateTime<Utc>>,
    /// When the harvest ended
    pub finished_at: Option<DateTime<Utc>>,
}

impl HarvestStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of the harvest
    pub fn mark_started(&mut self) {
        self.started_at = Some(Utc::now());
    }

    /// Record the end of the harvest
    pub fn mark_finished(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Add a received page
    pub fn add_page(&mut self, bytes: usize) {
        self.pages_fetched += 1;
        self.bytes_received += bytes as u64;
    }

    /// Add an emitted item
    pub fn add_item(&mut self) {
        self.items_emitted += 1;
    }

    /// Wall-clock duration between start and end, in milliseconds
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

/// Final report of a harvest, available once its stream has ended
#[derive(Debug)]
pub struct HarvestReport {
    /// How the harvest ended
    pub outcome: HarvestOutcome,
    /// What it did
    pub stats: HarvestStats,
}

impl HarvestReport {
    /// Check if the harvest finished without a page failure or limit
    pub fn is_complete(&self) -> bool {
        self.outcome.is_complete()
    }

    /// The page failure that truncated the harvest, if any
    pub fn failure(&self) -> Option<&PageFailure> {
        self.outcome.failure()
    }
}
