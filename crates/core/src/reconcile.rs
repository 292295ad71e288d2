//! Snapshot reconciliation: diff + degrade-safe merge.
//!
//! Pure functions over read-only snapshots; persistence is the cache's job.
//! The merge policy is the core correctness property of the system: cached
//! quality never regresses from a single bad fetch.
//!
//! ### Change detection
//! [`has_changed`] compares a fixed watch-list of user-visible fields
//! (`is_live`, `title`, `cover`, `avatar`, `anchor`). A failed fetch that
//! produced placeholder empties is not reported as a real change.
//!
//! ### Merge
//! [`merge`] is two-tier. A failed fetch may still correctly report "room
//! went offline", so `is_live`/`status` are taken from the new snapshot when
//! present, but previously known display metadata is kept. A successful
//! fetch wins wholesale, except that critical display fields which came back
//! empty are restored from the cached value.

use crate::model::{FetchStatus, RoomSnapshot};

/// Placeholder a degraded fetch substitutes for a field it could not read.
fn is_placeholder(value: &str) -> bool {
    value.is_empty()
}

/// Critical-field policy: a populated cached value survives an empty new one.
fn restore_if_empty(new_value: &mut String, old_value: &str) {
    if new_value.is_empty() && !old_value.is_empty() {
        *new_value = old_value.to_string();
    }
}

fn text_changed(old: &str, new: &str, new_failed: bool) -> bool {
    if old == new {
        return false;
    }
    if old.is_empty() || new.is_empty() {
        // One-sided absence. A failed fetch producing boilerplate empties
        // must not be reported as a real change.
        if new_failed && is_placeholder(new) {
            return false;
        }
    }
    true
}

fn live_flag_changed(old: Option<bool>, new: Option<bool>) -> bool {
    match (old, new) {
        (None, None) => false,
        (Some(a), Some(b)) => a != b,
        _ => true,
    }
}

/// Did the room visibly change between `old` and `new`?
///
/// A missing `old` (first observation) always counts as a change.
pub fn has_changed(old: Option<&RoomSnapshot>, new: &RoomSnapshot) -> bool {
    let Some(old) = old else {
        return true;
    };

    let new_failed = new.fetch_status == FetchStatus::Failed;

    if live_flag_changed(old.is_live, new.is_live) {
        return true;
    }

    let watched = [
        (old.title.as_str(), new.title.as_str()),
        (old.cover.as_str(), new.cover.as_str()),
        (old.avatar.as_str(), new.avatar.as_str()),
        (old.anchor.as_str(), new.anchor.as_str()),
    ];

    watched.into_iter().any(|(o, n)| text_changed(o, n, new_failed))
}

/// Merge a freshly fetched snapshot against the previous cached one.
///
/// - Failed new fetch: start from a copy of `old` (or the degraded `new` when
///   there is no prior state) and overwrite only `is_live` and `status` when
///   the new fetch produced them. Display metadata is never wiped.
/// - Successful new fetch: start from `new`, then restore each critical
///   display field from `old` if the new value came back empty.
pub fn merge(old: Option<&RoomSnapshot>, new: &RoomSnapshot) -> RoomSnapshot {
    match new.fetch_status {
        FetchStatus::Failed => {
            let mut merged = old.cloned().unwrap_or_else(|| new.clone());
            if let Some(live) = new.is_live {
                merged.is_live = Some(live);
            }
            if let Some(status) = &new.status {
                merged.status = Some(status.clone());
            }
            merged
        }
        FetchStatus::Ok => {
            let mut merged = new.clone();
            if let Some(old) = old {
                restore_if_empty(&mut merged.title, &old.title);
                restore_if_empty(&mut merged.anchor, &old.anchor);
                restore_if_empty(&mut merged.avatar, &old.avatar);
                restore_if_empty(&mut merged.cover, &old.cover);
                restore_if_empty(&mut merged.popular_num, &old.popular_num);
            }
            merged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Platform, RoomIdentifier};

    fn room() -> RoomIdentifier {
        RoomIdentifier::new(Platform::Bilibili, "123456", "https://live.bilibili.com")
    }

    fn populated() -> RoomSnapshot {
        RoomSnapshot {
            platform: Platform::Bilibili,
            room_id: "123456".to_string(),
            url: "https://live.bilibili.com/123456".to_string(),
            anchor: "anchor".to_string(),
            title: "title".to_string(),
            avatar: "https://i.example/avatar.png".to_string(),
            cover: "https://i.example/cover.jpg".to_string(),
            is_live: Some(true),
            status: Some("streaming".to_string()),
            popular_num: "4200".to_string(),
            fetch_status: FetchStatus::Ok,
        }
    }

    #[test]
    fn test_has_changed_reflexive() {
        let snapshot = populated();
        assert!(!has_changed(Some(&snapshot), &snapshot));

        let degraded = RoomSnapshot::degraded(&room());
        assert!(!has_changed(Some(&degraded), &degraded));
    }

    #[test]
    fn test_first_observation_is_a_change() {
        assert!(has_changed(None, &populated()));
    }

    #[test]
    fn test_live_flag_flip_is_a_change() {
        let old = populated();
        let mut new = populated();
        new.is_live = Some(false);
        assert!(has_changed(Some(&old), &new));
    }

    #[test]
    fn test_failed_fetch_empties_are_suppressed() {
        let old = populated();
        let mut new = RoomSnapshot::degraded(&room());
        // Degraded fetch still observed the same live flag.
        new.is_live = old.is_live;
        assert!(!has_changed(Some(&old), &new));
    }

    #[test]
    fn test_ok_fetch_empty_title_is_a_change() {
        let old = populated();
        let mut new = populated();
        new.title = String::new();
        assert!(has_changed(Some(&old), &new));
    }

    #[test]
    fn test_unwatched_fields_do_not_count() {
        let old = populated();
        let mut new = populated();
        new.popular_num = "9000".to_string();
        new.status = Some("replay".to_string());
        assert!(!has_changed(Some(&old), &new));
    }

    #[test]
    fn test_merge_failed_keeps_metadata() {
        let old = populated();
        let mut new = RoomSnapshot::degraded(&room());
        new.is_live = Some(false);
        new.status = Some("offline".to_string());

        let merged = merge(Some(&old), &new);
        assert_eq!(merged.title, old.title);
        assert_eq!(merged.anchor, old.anchor);
        assert_eq!(merged.avatar, old.avatar);
        assert_eq!(merged.cover, old.cover);
        assert_eq!(merged.popular_num, old.popular_num);
        // The failed fetch still reported the room going offline.
        assert_eq!(merged.is_live, Some(false));
        assert_eq!(merged.status.as_deref(), Some("offline"));
    }

    #[test]
    fn test_merge_failed_without_flag_keeps_old_flag() {
        let old = populated();
        let new = RoomSnapshot::degraded(&room());
        assert!(new.is_live.is_none());

        let merged = merge(Some(&old), &new);
        assert_eq!(merged.is_live, old.is_live);
        assert_eq!(merged.status, old.status);
    }

    #[test]
    fn test_merge_failed_without_prior_state() {
        let mut new = RoomSnapshot::degraded(&room());
        new.is_live = Some(false);
        let merged = merge(None, &new);
        assert_eq!(merged.fetch_status, FetchStatus::Failed);
        assert_eq!(merged.is_live, Some(false));
        assert!(merged.title.is_empty());
    }

    #[test]
    fn test_merge_ok_restores_empty_critical_fields() {
        let old = populated();
        let mut new = populated();
        new.title = String::new();
        new.avatar = String::new();
        new.cover = "https://i.example/new-cover.jpg".to_string();

        let merged = merge(Some(&old), &new);
        assert_eq!(merged.title, "title");
        assert_eq!(merged.avatar, "https://i.example/avatar.png");
        // Populated new values win.
        assert_eq!(merged.cover, "https://i.example/new-cover.jpg");
        assert_eq!(merged.fetch_status, FetchStatus::Ok);
    }

    #[test]
    fn test_merge_ok_does_not_resurrect_empty_old() {
        let mut old = populated();
        old.avatar = String::new();
        let mut new = populated();
        new.avatar = String::new();

        let merged = merge(Some(&old), &new);
        assert!(merged.avatar.is_empty());
    }

    #[test]
    fn test_merge_then_diff_after_failure_reports_no_change() {
        // The orchestrator merges first, then diffs old against merged.
        let old = populated();
        let new = RoomSnapshot::degraded(&room());
        let merged = merge(Some(&old), &new);
        assert!(!has_changed(Some(&old), &merged));
    }
}
