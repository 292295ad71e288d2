//! Batch and incremental room polling.
//!
//! Drives the adapters across a set of tracked rooms and folds the outcomes
//! into one report. Rooms are isolated from each other: a terminal failure
//! (unsupported URL, extraction failure, cache fault) lands that room in the
//! `failed` bucket and the batch moves on. A soft failure (live-status probe
//! died) degrades the snapshot, which still reconciles and persists, and is
//! additionally noted in `failed`.
//!
//! Input URLs are deduplicated before fan-out, so no two in-flight fetches
//! ever share a cache key; bounded concurrency does the rest.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use roomwatch_core::{CacheDb, Error, FetchStatus, RoomSnapshot, reconcile};

use crate::platform::Registry;

/// Outcome of a single-room incremental update.
#[derive(Debug, Clone)]
pub struct RoomUpdate {
    /// The merged snapshot that was persisted.
    pub snapshot: RoomSnapshot,
    /// Whether the watch-list fields visibly changed.
    pub changed: bool,
    /// Soft error from the live-status probe, if it failed.
    pub status_error: Option<String>,
}

/// A room whose update could not complete (or completed degraded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRoom {
    pub url: String,
    pub error: String,
}

/// Bucket counts for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: u32,
    pub updated: u32,
    pub changed: u32,
    pub failed: u32,
}

/// Aggregated result of a batch update, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub updated: Vec<RoomSnapshot>,
    pub changed: Vec<RoomSnapshot>,
    pub failed: Vec<FailedRoom>,
    pub summary: BatchSummary,
}

/// Update one tracked room: detect, extract, fetch, reconcile, persist.
///
/// # Errors
///
/// Only terminal faults surface: `UnsupportedPlatform`, `ExtractionError`
/// (including network faults while resolving a vanity URL), and cache I/O.
/// Fetch and live-status faults degrade into the snapshot instead.
pub async fn update_room(registry: &Registry, cache: &CacheDb, user: &str, url: &str) -> Result<RoomUpdate, Error> {
    let adapter = registry.detect(url)?;
    let room = adapter.extract_identifier(url).await?;

    let mut snapshot = adapter.fetch_room_info(&room).await;

    let mut status_error = None;
    match adapter.check_live_status(&room).await {
        Ok(live) => {
            snapshot.is_live = Some(live.is_live);
            snapshot.status = Some(live.status);
        }
        Err(e) => {
            tracing::warn!(room = %room.url, error = %e, "live-status probe failed");
            snapshot.fetch_status = FetchStatus::Failed;
            status_error = Some(e.to_string());
        }
    }

    let cached = cache.get(user, &room.url).await?;
    let merged = reconcile::merge(cached.as_ref(), &snapshot);
    let changed = reconcile::has_changed(cached.as_ref(), &merged);
    cache.put(user, &room.url, &merged).await?;

    tracing::debug!(room = %room.url, changed, degraded = status_error.is_some(), "room updated");

    Ok(RoomUpdate { snapshot: merged, changed, status_error })
}

/// Update every tracked room and fold the outcomes into a [`BatchReport`].
///
/// A single room's failure never aborts the batch.
pub async fn update_rooms(
    registry: &Arc<Registry>, cache: &CacheDb, user: &str, urls: &[String], max_concurrency: usize,
) -> BatchReport {
    let urls = dedup_urls(urls);
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));

    let mut join_set = JoinSet::new();

    for (index, url) in urls.iter().cloned().enumerate() {
        // The semaphore is never closed, so acquire cannot fail.
        let permit = semaphore.clone().acquire_owned().await.unwrap();
        let registry = Arc::clone(registry);
        let cache = cache.clone();
        let user = user.to_string();

        join_set.spawn(async move {
            // Hold the permit for the task's whole lifetime.
            let _permit = permit;
            let result = update_room(&registry, &cache, &user, &url).await;
            (index, url, result)
        });
    }

    let mut outcomes: Vec<(usize, String, Result<RoomUpdate, Error>)> = Vec::with_capacity(urls.len());
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => tracing::error!(error = %e, "room update task panicked"),
        }
    }
    outcomes.sort_by_key(|(index, _, _)| *index);

    let mut report = BatchReport {
        updated: Vec::new(),
        changed: Vec::new(),
        failed: Vec::new(),
        summary: BatchSummary { total: urls.len() as u32, updated: 0, changed: 0, failed: 0 },
    };

    for (_, url, result) in outcomes {
        match result {
            Ok(update) => {
                if update.changed {
                    report.changed.push(update.snapshot.clone());
                }
                if let Some(error) = update.status_error {
                    report.failed.push(FailedRoom { url, error });
                }
                report.updated.push(update.snapshot);
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "room update failed");
                report.failed.push(FailedRoom { url, error: e.to_string() });
            }
        }
    }

    report.summary.updated = report.updated.len() as u32;
    report.summary.changed = report.changed.len() as u32;
    report.summary.failed = report.failed.len() as u32;

    tracing::info!(
        total = report.summary.total,
        updated = report.summary.updated,
        changed = report.summary.changed,
        failed = report.summary.failed,
        "batch update complete"
    );

    report
}

/// Drop duplicate URLs, keeping first-seen order.
fn dedup_urls(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .filter(|url| seen.insert(url.trim().to_string()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomwatch_core::Platform;

    #[test]
    fn test_dedup_preserves_order() {
        let urls = vec![
            "https://a/1".to_string(),
            "https://b/2".to_string(),
            "https://a/1".to_string(),
            "https://c/3".to_string(),
        ];
        assert_eq!(dedup_urls(&urls), vec!["https://a/1", "https://b/2", "https://c/3"]);
    }

    #[test]
    fn test_dedup_trims_before_comparing() {
        let urls = vec!["https://a/1".to_string(), "  https://a/1  ".to_string()];
        assert_eq!(dedup_urls(&urls).len(), 1);
    }

    #[test]
    fn test_report_serialization_shape() {
        let snapshot = RoomSnapshot {
            platform: Platform::Douyu,
            room_id: "1".to_string(),
            url: "https://www.douyu.com/1".to_string(),
            anchor: String::new(),
            title: String::new(),
            avatar: String::new(),
            cover: String::new(),
            is_live: Some(false),
            status: Some("0".to_string()),
            popular_num: "0".to_string(),
            fetch_status: FetchStatus::Ok,
        };
        let report = BatchReport {
            updated: vec![snapshot.clone()],
            changed: vec![],
            failed: vec![FailedRoom { url: "https://example.com/x".to_string(), error: "UNSUPPORTED_PLATFORM: x".to_string() }],
            summary: BatchSummary { total: 2, updated: 1, changed: 0, failed: 1 },
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["updated"][0]["platform"], "douyu");
        assert!(value["failed"][0]["error"].as_str().unwrap().contains("UNSUPPORTED_PLATFORM"));
    }

    #[tokio::test]
    async fn test_batch_isolates_terminal_failures() {
        use crate::fetch::{HttpClient, HttpConfig};
        use std::time::Duration;

        let registry = Arc::new(Registry::new(HttpClient::new(HttpConfig::default()).unwrap(), None));
        let cache = CacheDb::open_in_memory(Duration::from_secs(86400)).await.unwrap();

        // An unsupported host never reaches the network; it must land in
        // `failed` without poisoning the batch machinery.
        let urls = vec!["https://example.com/live/1".to_string()];
        let report = update_rooms(&registry, &cache, "alice", &urls, 2).await;

        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.failed, 1);
        assert!(report.updated.is_empty());
        assert!(report.failed[0].error.contains("UNSUPPORTED_PLATFORM"));
    }
}
