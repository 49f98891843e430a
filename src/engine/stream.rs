//! The item stream of a single harvest

use super::types::{HarvestReport, PageFailure};
use super::Step;
use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

pin_project! {
    /// Lazy, forward-only stream of the items of one harvest.
    ///
    /// A page failure ends the stream early instead of surfacing as an item;
    /// check [`Harvest::report`] once the stream has ended to tell a complete
    /// harvest from a truncated one, or use [`Harvest::try_items`] to receive
    /// the failure in-band. Dropping the stream cancels any prefetched request.
    ///
    /// Polling spawns page requests with `tokio::spawn`; it panics outside a
    /// tokio runtime.
    #[must_use = "streams do nothing unless polled"]
    pub struct Harvest<T> {
        #[pin]
        steps: BoxStream<'static, Step<T>>,
        report: Option<HarvestReport>,
    }
}

impl<T: Send + 'static> Harvest<T> {
    pub(crate) fn new(steps: BoxStream<'static, Step<T>>) -> Self {
        Self {
            steps,
            report: None,
        }
    }

    /// Final report, available once the stream has returned `None`
    pub fn report(&self) -> Option<&HarvestReport> {
        self.report.as_ref()
    }

    /// Take the final report
    pub fn into_report(self) -> Option<HarvestReport> {
        self.report
    }

    /// Check if the stream has ended
    pub fn is_finished(&self) -> bool {
        self.report.is_some()
    }

    /// Convert into a stream that yields a page failure as its last element
    pub fn try_items(self) -> BoxStream<'static, Result<T, PageFailure>> {
        let already_failed = self
            .report
            .and_then(|report| report.outcome.into_failure())
            .map(Err);

        let remaining = self.steps.filter_map(|step| {
            future::ready(match step {
                Step::Item(item) => Some(Ok(item)),
                Step::End(report) => report.outcome.into_failure().map(Err),
            })
        });

        stream::iter(already_failed).chain(remaining).boxed()
    }

    /// Collect every item, or the page failure that truncated the harvest
    pub async fn collect_all(self) -> Result<Vec<T>, PageFailure> {
        self.try_items().try_collect().await
    }
}

impl<T> Stream for Harvest<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.project();
        if this.report.is_some() {
            return Poll::Ready(None);
        }

        match ready!(this.steps.poll_next(cx)) {
            Some(Step::Item(item)) => Poll::Ready(Some(item)),
            Some(Step::End(report)) => {
                *this.report = Some(report);
                Poll::Ready(None)
            }
            None => Poll::Ready(None),
        }
    }
}

impl<T> std::fmt::Debug for Harvest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvest")
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}
