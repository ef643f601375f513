//! Capacity-pressure eviction
//!
//! Two records can shrink without losing what the app needs:
//! - `quizResults`: a history list collapses to its most recent entry
//! - `timelineEvents`: entries dated before now are dropped
//!
//! Eviction runs at most once per save and is never re-checked.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::platform::KeyValueStore;
use crate::records::{RecordKey, parse_event_date};

/// Records eviction is allowed to rewrite
pub const EVICTABLE: [RecordKey; 2] = [RecordKey::QuizResults, RecordKey::TimelineEvents];

/// Shrink `value` in place if `key` is evictable. Returns true if it changed.
pub fn compact(key: &str, value: &mut Value, now: DateTime<Utc>) -> bool {
    match RecordKey::from_str(key) {
        Some(RecordKey::QuizResults) => compact_quiz_results(value),
        Some(RecordKey::TimelineEvents) => compact_timeline(value, now),
        _ => false,
    }
}

/// List -> its last element
fn compact_quiz_results(value: &mut Value) -> bool {
    let Value::Array(list) = value else {
        return false;
    };
    match list.pop() {
        Some(last) => {
            *value = last;
            true
        }
        None => false,
    }
}

/// Keep events dated at or after `now`, order preserved
fn compact_timeline(value: &mut Value, now: DateTime<Utc>) -> bool {
    let Value::Array(events) = value else {
        return false;
    };
    let before = events.len();
    events.retain(|event| {
        event
            .get("date")
            .and_then(parse_event_date)
            .is_some_and(|date| date >= now)
    });
    events.len() != before
}

/// Compact every evictable record in `store` except `skip`
///
/// Failures are logged and ignored. Returns the number of bytes freed.
pub fn evict(store: &mut dyn KeyValueStore, now: DateTime<Utc>, skip: &str) -> usize {
    let mut freed = 0;
    for key in EVICTABLE {
        let key = key.as_str();
        if key == skip {
            continue;
        }
        let text = match store.get(key) {
            Ok(Some(text)) => text,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("Eviction could not read {}: {}", key, e);
                continue;
            }
        };
        // Corrupt records are left for the read path to clean up
        let Ok(mut value) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        if !compact(key, &mut value, now) {
            continue;
        }
        let Ok(compacted) = serde_json::to_string(&value) else {
            continue;
        };
        match store.set(key, &compacted) {
            Ok(()) => {
                freed += text.len().saturating_sub(compacted.len());
                log::warn!("Evicted old {} data ({} -> {} bytes)", key, text.len(), compacted.len());
            }
            Err(e) => log::warn!("Eviction could not rewrite {}: {}", key, e),
        }
    }
    freed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_compact_quiz_list_keeps_last() {
        let mut value = json!([{"primaryStream": "Arts"}, {"primaryStream": "Commerce"}, {"primaryStream": "Science"}]);
        assert!(compact("quizResults", &mut value, now()));
        assert_eq!(value, json!({"primaryStream": "Science"}));

        // Already a single result
        assert!(!compact("quizResults", &mut value, now()));
        let mut empty = json!([]);
        assert!(!compact("quizResults", &mut empty, now()));
    }

    #[test]
    fn test_compact_timeline_keeps_future_in_order() {
        let mut value = json!([
            {"date": "2030-05-01", "title": "a"},
            {"date": "2020-05-01", "title": "b"},
            {"date": "2026-01-01T00:00:00Z", "title": "c"},
            {"date": "2027-02-01", "title": "d"},
            {"date": "whenever", "title": "e"},
            {"title": "f"}
        ]);
        assert!(compact("timelineEvents", &mut value, now()));
        let titles: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_compact_ignores_other_keys() {
        let mut value = json!([1, 2, 3]);
        assert!(!compact("collegeFavorites", &mut value, now()));
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn test_evict_skips_target_and_corrupt() {
        let mut store = MemoryStore::new();
        store.set("quizResults", r#"[{"n":1},{"n":2}]"#).unwrap();
        store.set("timelineEvents", "{broken").unwrap();

        let freed = evict(&mut store, now(), "timelineEvents");
        assert!(freed > 0);
        assert_eq!(store.get("quizResults").unwrap().as_deref(), Some(r#"{"n":2}"#));
        assert_eq!(store.get("timelineEvents").unwrap().as_deref(), Some("{broken"));

        // Target key is left alone
        store.set("quizResults", r#"[{"n":1},{"n":2}]"#).unwrap();
        assert_eq!(evict(&mut store, now(), "quizResults"), 0);
        assert_eq!(store.get("quizResults").unwrap().as_deref(), Some(r#"[{"n":1},{"n":2}]"#));
    }
}
