//! Tests for engine module

use super::*;
use crate::decode::FnDecoder;
use crate::error::{Error, FailureKind};
use crate::http::{PageFetcher, Transport};
use crate::pagination::PaginationConfig;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: u32,
}

// ============================================================================
// In-memory transport
// ============================================================================

#[derive(Clone, Default)]
struct MockTransport {
    pages: HashMap<String, std::result::Result<String, u16>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    fn new() -> Self {
        Self::default()
    }

    fn page(mut self, url: &str, body: serde_json::Value) -> Self {
        self.pages.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    fn raw(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), Err(status));
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> crate::Result<Bytes> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(Ok(body)) => Ok(Bytes::from(body.clone())),
            Some(Err(status)) => Err(Error::http_status(*status, url, "")),
            None => Err(Error::http_status(404, url, "Not Found")),
        }
    }
}

fn harvester(transport: &MockTransport) -> Harvester {
    Harvester::new(
        PageFetcher::new(transport.clone()),
        PaginationConfig::default(),
    )
}

fn ids(items: &[Item]) -> Vec<u32> {
    items.iter().map(|item| item.id).collect()
}

async fn drain(harvest: &mut Harvest<Item>) -> Vec<Item> {
    let mut items = Vec::new();
    while let Some(item) = harvest.next().await {
        items.push(item);
    }
    items
}

// ============================================================================
// Traversal Tests
// ============================================================================

#[tokio::test]
async fn test_harvest_multiple_pages() {
    let transport = MockTransport::new()
        .page(
            "/page/1",
            json!({"hydra:member": [{"id": 1}, {"id": 2}], "hydra:next": "/page/2"}),
        )
        .page("/page/2", json!({"hydra:member": [{"id": 3}, {"id": 4}]}));

    let mut harvest = harvester(&transport).harvest::<Item>("/page/1");
    let items = drain(&mut harvest).await;

    assert_eq!(ids(&items), vec![1, 2, 3, 4]);
    assert_eq!(transport.requests(), vec!["/page/1", "/page/2"]);

    let report = harvest.report().unwrap();
    assert!(report.is_complete());
    assert_eq!(report.stats.pages_fetched, 2);
    assert_eq!(report.stats.items_emitted, 4);
    assert!(report.stats.bytes_received > 0);
    assert!(report.stats.duration_ms().is_some());
}

#[tokio::test]
async fn test_harvest_preserves_page_then_array_order() {
    let transport = MockTransport::new()
        .page(
            "/a",
            json!({"hydra:member": [{"id": 9}, {"id": 3}], "hydra:next": "/b"}),
        )
        .page(
            "/b",
            json!({"hydra:member": [{"id": 7}], "hydra:next": "/c"}),
        )
        .page("/c", json!({"hydra:member": [{"id": 1}, {"id": 8}, {"id": 2}]}));

    let items = harvester(&transport)
        .harvest::<Item>("/a")
        .collect::<Vec<_>>()
        .await;

    assert_eq!(ids(&items), vec![9, 3, 7, 1, 8, 2]);
}

#[tokio::test]
async fn test_harvest_single_page_issues_one_request() {
    let transport = MockTransport::new().page(
        "/page/1",
        json!({"hydra:member": [{"id": 1}, {"id": 2}]}),
    );

    let items = harvester(&transport)
        .harvest::<Item>("/page/1")
        .collect::<Vec<_>>()
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(transport.requests(), vec!["/page/1"]);
}

#[tokio::test]
async fn test_harvest_empty_page() {
    let transport = MockTransport::new().page("/page/1", json!({"hydra:member": []}));

    let mut harvest = harvester(&transport).harvest::<Item>("/page/1");
    assert!(drain(&mut harvest).await.is_empty());
    assert!(harvest.report().unwrap().is_complete());
}

#[tokio::test]
async fn test_page_without_items_key_continues() {
    let transport = MockTransport::new()
        .page("/page/1", json!({"hydra:totalItems": 1, "hydra:next": "/page/2"}))
        .page("/page/2", json!({"hydra:member": [{"id": 5}], "hydra:next": null}));

    let mut harvest = harvester(&transport).harvest::<Item>("/page/1");
    let items = drain(&mut harvest).await;

    assert_eq!(ids(&items), vec![5]);
    assert_eq!(harvest.report().unwrap().stats.pages_fetched, 2);
}

#[tokio::test]
async fn test_empty_next_link_ends_harvest() {
    let transport = MockTransport::new()
        .page("/page/1", json!({"hydra:member": [{"id": 1}], "hydra:next": ""}));

    let items = harvester(&transport)
        .harvest::<Item>("/page/1")
        .collect::<Vec<_>>()
        .await;

    assert_eq!(ids(&items), vec![1]);
    assert_eq!(transport.requests(), vec!["/page/1"]);
}

#[tokio::test]
async fn test_harvest_custom_keys() {
    let transport = MockTransport::new()
        .page("/start", json!({"items": [{"id": 1}], "next_page": "/next"}))
        .page("/next", json!({"items": [{"id": 2}]}));

    let harvester = harvester(&transport)
        .with_config(PaginationConfig::with_keys("items", "next_page"));
    let items = harvester
        .harvest::<Item>("/start")
        .collect::<Vec<_>>()
        .await;

    assert_eq!(ids(&items), vec![1, 2]);
    assert_eq!(transport.requests(), vec!["/start", "/next"]);
}

#[tokio::test]
async fn test_custom_keys_ignore_hydra_defaults() {
    let transport = MockTransport::new().page(
        "/start",
        json!({"hydra:member": [{"id": 1}], "hydra:next": "/other", "items": [{"id": 2}]}),
    );

    let harvester = harvester(&transport)
        .with_config(PaginationConfig::with_keys("items", "next_page"));
    let items = harvester
        .harvest::<Item>("/start")
        .collect::<Vec<_>>()
        .await;

    assert_eq!(ids(&items), vec![2]);
    assert_eq!(transport.requests(), vec!["/start"]);
}

#[tokio::test]
async fn test_harvest_pointer_keys() {
    let transport = MockTransport::new()
        .page(
            "/articles",
            json!({"data": [{"id": 1}], "links": {"next": "/articles?page=2"}}),
        )
        .page(
            "/articles?page=2",
            json!({"data": [{"id": 2}], "links": {"next": null}}),
        );

    let harvester = harvester(&transport).with_config(
        PaginationConfig::new()
            .with_items_pointer("/data")
            .with_next_url_pointer("/links/next"),
    );
    let items = harvester
        .harvest::<Item>("/articles")
        .collect::<Vec<_>>()
        .await;

    assert_eq!(ids(&items), vec![1, 2]);
}

#[tokio::test]
async fn test_harvest_slash_prefixed_member_keys() {
    let transport = MockTransport::new()
        .page(
            "/p1",
            json!({"/items": [{"id": 1}], "/next": "/p2", "items": [{"id": 99}]}),
        )
        .page("/p2", json!({"/items": [{"id": 2}]}));

    let harvester =
        harvester(&transport).with_config(PaginationConfig::with_keys("/items", "/next"));
    let items = harvester.harvest::<Item>("/p1").collect::<Vec<_>>().await;

    assert_eq!(ids(&items), vec![1, 2]);
    assert_eq!(transport.requests(), vec!["/p1", "/p2"]);
}

#[tokio::test]
async fn test_harvest_with_custom_decoder() {
    let transport = MockTransport::new()
        .page("/page/1", json!({"hydra:member": [{"name": "a"}, {"name": "b"}]}));

    let decoder = FnDecoder::new(|items: serde_json::Value| -> crate::Result<Vec<String>> {
        Ok(items
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|item| item["name"].as_str().map(str::to_uppercase))
            .collect())
    });

    let names = harvester(&transport)
        .harvest_with("/page/1", decoder)
        .collect::<Vec<_>>()
        .await;

    assert_eq!(names, vec!["A", "B"]);
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_first_page_404_yields_nothing() {
    let transport = MockTransport::new().status("/error-page", 404);

    let mut harvest = harvester(&transport).harvest::<Item>("/error-page");
    assert!(drain(&mut harvest).await.is_empty());

    let report = harvest.report().unwrap();
    assert!(report.outcome.is_truncated());
    let failure = report.failure().unwrap();
    assert_eq!(failure.kind(), FailureKind::Transport);
    assert_eq!(failure.error.status(), Some(404));
    assert_eq!(failure.page, 1);
    assert_eq!(failure.url, "/error-page");
    assert_eq!(report.stats.pages_fetched, 0);
}

#[tokio::test]
async fn test_transport_failure_truncates_at_failing_page() {
    let transport = MockTransport::new()
        .page(
            "/page/1",
            json!({"hydra:member": [{"id": 1}, {"id": 2}], "hydra:next": "/page/2"}),
        )
        .status("/page/2", 500)
        .page("/page/3", json!({"hydra:member": [{"id": 5}]}));

    let mut harvest = harvester(&transport).harvest::<Item>("/page/1");
    let items = drain(&mut harvest).await;

    assert_eq!(ids(&items), vec![1, 2]);
    let failure = harvest.report().unwrap().failure().unwrap();
    assert_eq!(failure.page, 2);
    assert_eq!(failure.error.status(), Some(500));
    assert!(!transport.requests().contains(&"/page/3".to_string()));
}

#[tokio::test]
async fn test_invalid_json_truncates() {
    let transport = MockTransport::new()
        .page("/page/1", json!({"hydra:member": [{"id": 1}], "hydra:next": "/page/2"}))
        .raw("/page/2", "<html>maintenance</html>");

    let mut harvest = harvester(&transport).harvest::<Item>("/page/1");
    let items = drain(&mut harvest).await;

    assert_eq!(ids(&items), vec![1]);
    let failure = harvest.report().unwrap().failure().unwrap();
    assert_eq!(failure.kind(), FailureKind::Parse);
    assert_eq!(failure.page, 2);
}

#[tokio::test]
async fn test_decode_failure_discards_page_and_prefetch() {
    let transport = MockTransport::new()
        .page("/page/1", json!({"hydra:member": [{"id": 1}], "hydra:next": "/page/2"}))
        .page(
            "/page/2",
            json!({"hydra:member": [{"id": 2}, {"id": "bad"}], "hydra:next": "/page/3"}),
        )
        .page("/page/3", json!({"hydra:member": [{"id": 3}]}));

    let mut harvest = harvester(&transport).harvest::<Item>("/page/1");
    let items = drain(&mut harvest).await;

    // Nothing from the failing page, nothing from the already requested next page
    assert_eq!(ids(&items), vec![1]);
    let report = harvest.report().unwrap();
    let failure = report.failure().unwrap();
    assert_eq!(failure.kind(), FailureKind::Decode);
    assert_eq!(failure.page, 2);
    assert_eq!(report.stats.pages_fetched, 2);
    assert_eq!(report.stats.items_emitted, 1);
}

#[tokio::test]
async fn test_decode_failure_on_single_page() {
    let transport = MockTransport::new().page("/page/1", json!({"hydra:member": {"id": 1}}));

    let mut harvest = harvester(&transport).harvest::<Item>("/page/1");
    assert!(drain(&mut harvest).await.is_empty());
    assert_eq!(
        harvest.report().unwrap().failure().unwrap().kind(),
        FailureKind::Decode
    );
}

#[tokio::test]
async fn test_try_items_surfaces_failure_last() {
    let transport = MockTransport::new()
        .page(
            "/page/1",
            json!({"hydra:member": [{"id": 1}, {"id": 2}], "hydra:next": "/page/2"}),
        )
        .status("/page/2", 404);

    let results = harvester(&transport)
        .harvest::<Item>("/page/1")
        .try_items()
        .collect::<Vec<_>>()
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().id, 1);
    assert_eq!(results[1].as_ref().unwrap().id, 2);
    let failure = results[2].as_ref().unwrap_err();
    assert_eq!(failure.url, "/page/2");
    assert_eq!(failure.error.status(), Some(404));
}

#[tokio::test]
async fn test_try_items_clean_end() {
    let transport = MockTransport::new().page("/page/1", json!({"hydra:member": [{"id": 1}]}));

    let results = harvester(&transport)
        .harvest::<Item>("/page/1")
        .try_items()
        .collect::<Vec<_>>()
        .await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
}

#[tokio::test]
async fn test_try_items_after_exhaustion() {
    let transport = MockTransport::new().status("/page/1", 503);

    let mut harvest = harvester(&transport).harvest::<Item>("/page/1");
    assert!(harvest.next().await.is_none());
    assert!(harvest.is_finished());

    let results = harvest.try_items().collect::<Vec<_>>().await;
    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
}

#[tokio::test]
async fn test_collect_all() {
    let transport = MockTransport::new()
        .page("/ok", json!({"hydra:member": [{"id": 1}, {"id": 2}]}))
        .status("/broken", 404);
    let harvester = harvester(&transport);

    let items = harvester.harvest::<Item>("/ok").collect_all().await.unwrap();
    assert_eq!(ids(&items), vec![1, 2]);

    let failure = harvester
        .harvest::<Item>("/broken")
        .collect_all()
        .await
        .unwrap_err();
    assert_eq!(failure.kind(), FailureKind::Transport);
    assert!(failure.to_string().contains("/broken"));
}

// ============================================================================
// Page Limit Tests
// ============================================================================

#[tokio::test]
async fn test_max_pages_stops_cyclic_links() {
    let transport = MockTransport::new()
        .page("/a", json!({"hydra:member": [{"id": 1}], "hydra:next": "/b"}))
        .page("/b", json!({"hydra:member": [{"id": 2}], "hydra:next": "/a"}));

    let harvester = harvester(&transport).with_config(PaginationConfig::new().with_max_pages(3));
    let mut harvest = harvester.harvest::<Item>("/a");
    let items = drain(&mut harvest).await;

    assert_eq!(ids(&items), vec![1, 2, 1]);
    assert_eq!(transport.requests(), vec!["/a", "/b", "/a"]);
    assert!(matches!(
        harvest.report().unwrap().outcome,
        HarvestOutcome::PageLimitReached { max_pages: 3 }
    ));
}

#[tokio::test]
async fn test_max_pages_not_reached() {
    let transport = MockTransport::new().page("/a", json!({"hydra:member": [{"id": 1}]}));

    let harvester = harvester(&transport).with_config(PaginationConfig::new().with_max_pages(1));
    let mut harvest = harvester.harvest::<Item>("/a");
    drain(&mut harvest).await;

    assert!(harvest.report().unwrap().is_complete());
}

#[tokio::test]
async fn test_zero_max_pages_fetches_nothing() {
    let transport = MockTransport::new().page("/a", json!({"hydra:member": [{"id": 1}]}));

    let harvester = harvester(&transport).with_config(PaginationConfig::new().with_max_pages(0));
    let mut harvest = harvester.harvest::<Item>("/a");

    assert!(drain(&mut harvest).await.is_empty());
    assert!(transport.requests().is_empty());
}

// ============================================================================
// Laziness & Cancellation Tests
// ============================================================================

#[tokio::test]
async fn test_harvest_is_lazy() {
    let transport = MockTransport::new().page("/page/1", json!({"hydra:member": []}));

    let harvest = harvester(&transport).harvest::<Item>("/page/1");
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(transport.requests().is_empty());
    assert!(harvest.report().is_none());
}

#[tokio::test]
async fn test_next_page_is_prefetched_while_current_is_consumed() {
    let transport = MockTransport::new()
        .page(
            "/page/1",
            json!({"hydra:member": [{"id": 1}, {"id": 2}], "hydra:next": "/page/2"}),
        )
        .page("/page/2", json!({"hydra:member": [{"id": 3}]}));

    let mut harvest = harvester(&transport).harvest::<Item>("/page/1");
    let first = harvest.next().await.unwrap();
    assert_eq!(first.id, 1);

    // Give the prefetch task a chance to run
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.requests(), vec!["/page/1", "/page/2"]);

    let rest = drain(&mut harvest).await;
    assert_eq!(ids(&rest), vec![2, 3]);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_dropping_harvest_stops_fetching() {
    let transport = MockTransport::new()
        .page(
            "/page/1",
            json!({"hydra:member": [{"id": 1}, {"id": 2}], "hydra:next": "/page/2"}),
        )
        .page(
            "/page/2",
            json!({"hydra:member": [{"id": 3}], "hydra:next": "/page/3"}),
        )
        .page("/page/3", json!({"hydra:member": [{"id": 4}]}));

    let mut harvest = harvester(&transport).harvest::<Item>("/page/1");
    assert_eq!(harvest.next().await.unwrap().id, 1);
    drop(harvest);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let requests = transport.requests();
    assert!(!requests.contains(&"/page/3".to_string()));
    assert!(requests.len() <= 2);
}

#[tokio::test]
async fn test_polling_after_end_returns_none() {
    let transport = MockTransport::new().page("/page/1", json!({"hydra:member": [{"id": 1}]}));

    let mut harvest = harvester(&transport).harvest::<Item>("/page/1");
    assert!(harvest.next().await.is_some());
    assert!(harvest.next().await.is_none());
    assert!(harvest.next().await.is_none());
    assert_eq!(transport.requests().len(), 1);
    assert!(harvest.into_report().unwrap().is_complete());
}

#[tokio::test]
async fn test_each_harvest_is_independent() {
    let transport = MockTransport::new().page("/page/1", json!({"hydra:member": [{"id": 1}]}));
    let harvester = harvester(&transport);

    let first = harvester.harvest::<Item>("/page/1").collect::<Vec<_>>().await;
    let second = harvester.harvest::<Item>("/page/1").collect::<Vec<_>>().await;

    assert_eq!(first, second);
    assert_eq!(transport.requests().len(), 2);
}
