//! Logical records managed by the persistence facade
//!
//! Each record lives under one fixed key. The typed structs here are the
//! shapes the app writes; the facade itself stores any JSON value, so unknown
//! extra fields are carried through untouched.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::consts;
use crate::persistence::Persistence;
use crate::platform::KeyValueStore;
use crate::validation::{ValidationReport, validate_quiz_results, validate_user_profile};

/// The fixed set of logical keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    UserProfile,
    QuizResults,
    TimelineEvents,
    CollegeFavorites,
    CourseComparisons,
    AppSettings,
}

impl RecordKey {
    /// Every logical key, in export order
    pub const ALL: [RecordKey; 6] = [
        RecordKey::UserProfile,
        RecordKey::QuizResults,
        RecordKey::TimelineEvents,
        RecordKey::CollegeFavorites,
        RecordKey::CourseComparisons,
        RecordKey::AppSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKey::UserProfile => consts::USER_PROFILE,
            RecordKey::QuizResults => consts::QUIZ_RESULTS,
            RecordKey::TimelineEvents => consts::TIMELINE_EVENTS,
            RecordKey::CollegeFavorites => consts::COLLEGE_FAVORITES,
            RecordKey::CourseComparisons => consts::COURSE_COMPARISONS,
            RecordKey::AppSettings => consts::APP_SETTINGS,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Student profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    /// School class/grade, e.g. "10" or "12"
    pub class: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, age: u32, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            class: class.into(),
            extra: Map::new(),
        }
    }

    pub fn validate(&self) -> ValidationReport {
        serde_json::to_value(self)
            .map(|v| validate_user_profile(&v))
            .unwrap_or_else(|e| ValidationReport {
                is_valid: false,
                errors: vec![e.to_string()],
            })
    }
}

/// Outcome of one stream-recommendation quiz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    /// Question id -> chosen answer
    pub answers: Map<String, Value>,
    /// Recommended stream (Science, Commerce, Arts, ...)
    pub primary_stream: String,
    /// Percent, 0-100
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuizResult {
    pub fn validate(&self) -> ValidationReport {
        serde_json::to_value(self)
            .map(|v| validate_quiz_results(&v))
            .unwrap_or_else(|e| ValidationReport {
                is_valid: false,
                errors: vec![e.to_string()],
            })
    }
}

/// A dated entry on the admissions timeline (exam, deadline, counselling...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Date string or epoch milliseconds, see [`parse_event_date`]
    pub date: Value,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TimelineEvent {
    pub fn new(date: impl Into<Value>, title: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            title: title.into(),
            description: None,
            extra: Map::new(),
        }
    }

    pub fn when(&self) -> Option<DateTime<Utc>> {
        parse_event_date(&self.date)
    }
}

/// Parse an event `date` field
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (taken as UTC), `YYYY-MM-DD`
/// (UTC midnight) and JSON numbers holding epoch milliseconds.
pub fn parse_event_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(t) = DateTime::parse_from_rfc3339(s) {
                return Some(t.with_timezone(&Utc));
            }
            for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
                if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(t.and_utc());
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|t| t.and_utc())
        }
        _ => None,
    }
}

/// Format an event time relative to `now` in calendar days
pub fn format_relative(now: DateTime<Utc>, when: DateTime<Utc>) -> String {
    let days = (when.date_naive() - now.date_naive()).num_days();
    match days {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        d if d > 1 => format!("in {} days", d),
        d => format!("{} days ago", -d),
    }
}

/// Typed accessors over the logical records
impl<S: KeyValueStore> Persistence<S> {
    /// Stored profile, if present and well-formed
    pub fn user_profile(&mut self) -> Option<UserProfile> {
        self.get(RecordKey::UserProfile)
    }

    /// Save a profile after validating it
    pub fn save_user_profile(&mut self, profile: &UserProfile) -> Result<bool, ValidationReport> {
        let report = profile.validate();
        if !report.is_valid {
            log::warn!("Rejected user profile: {}", report.errors.join("; "));
            return Err(report);
        }
        Ok(self.save(RecordKey::UserProfile, profile))
    }

    /// Append a quiz result to the history list
    ///
    /// A single stored result (what eviction leaves behind) becomes the first
    /// element of the new list.
    pub fn record_quiz_result(&mut self, result: &QuizResult) -> Result<bool, ValidationReport> {
        let report = result.validate();
        if !report.is_valid {
            log::warn!("Rejected quiz result: {}", report.errors.join("; "));
            return Err(report);
        }
        let new = match serde_json::to_value(result) {
            Ok(new) => new,
            Err(e) => {
                log::error!("Could not encode quiz result: {}", e);
                return Ok(false);
            }
        };
        let history = match self.get::<Value>(RecordKey::QuizResults) {
            Some(Value::Array(mut list)) => {
                list.push(new);
                list
            }
            Some(single @ Value::Object(_)) => vec![single, new],
            _ => vec![new],
        };
        Ok(self.save(RecordKey::QuizResults, &history))
    }

    /// Most recent quiz result, whether stored as a list or a single value
    pub fn latest_quiz_result(&mut self) -> Option<QuizResult> {
        let value = match self.get::<Value>(RecordKey::QuizResults)? {
            Value::Array(mut list) => list.pop()?,
            other => other,
        };
        serde_json::from_value(value).ok()
    }

    /// Stored list under `key`, empty if absent
    ///
    /// Errors (logged) when the record cannot be read or is not a list, so
    /// callers never overwrite data they could not see.
    fn stored_list(&mut self, key: RecordKey) -> Result<Vec<Value>, ()> {
        match self.try_get::<Value>(key) {
            Ok(None) => Ok(Vec::new()),
            Ok(Some(Value::Array(list))) => Ok(list),
            Ok(Some(other)) => {
                log::error!("Refusing to modify {}: stored value is not a list ({})", key, other);
                Err(())
            }
            Err(e) => {
                log::error!("Failed to read {}: {}", key, e);
                Err(())
            }
        }
    }

    /// Append `item` to the list under `key` unless an equal item is there
    fn append_unique(&mut self, key: RecordKey, item: Value) -> bool {
        let Ok(mut list) = self.stored_list(key) else {
            return false;
        };
        if list.contains(&item) {
            return true;
        }
        list.push(item);
        self.save(key, &list)
    }

    /// Drop every item equal to `item` from the list under `key`
    fn remove_from_list(&mut self, key: RecordKey, item: &Value) -> bool {
        let Ok(mut list) = self.stored_list(key) else {
            return false;
        };
        let before = list.len();
        list.retain(|v| v != item);
        if list.len() == before {
            return true;
        }
        self.save(key, &list)
    }

    /// Stored timeline, in insertion order. Entries that do not decode are skipped.
    pub fn timeline(&mut self) -> Vec<TimelineEvent> {
        self.stored_list(RecordKey::TimelineEvents)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()
    }

    /// Append an event to the timeline
    ///
    /// Existing entries are kept verbatim, whatever their shape.
    pub fn add_timeline_event(&mut self, event: TimelineEvent) -> bool {
        if event.when().is_none() {
            log::warn!("Timeline event '{}' has unparseable date {}", event.title, event.date);
            return false;
        }
        let new = match serde_json::to_value(&event) {
            Ok(new) => new,
            Err(e) => {
                log::error!("Could not encode timeline event '{}': {}", event.title, e);
                return false;
            }
        };
        let Ok(mut events) = self.stored_list(RecordKey::TimelineEvents) else {
            return false;
        };
        events.push(new);
        self.save(RecordKey::TimelineEvents, &events)
    }

    /// Events dated at or after `now`, in insertion order
    pub fn upcoming_events(&mut self, now: DateTime<Utc>) -> Vec<TimelineEvent> {
        self.timeline()
            .into_iter()
            .filter(|e| e.when().is_some_and(|t| t >= now))
            .collect()
    }

    /// Favorited college ids
    pub fn favorites(&mut self) -> Vec<u32> {
        self.stored_list(RecordKey::CollegeFavorites)
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_u64().and_then(|id| u32::try_from(id).ok()))
            .collect()
    }

    /// Add a college to favorites (no-op if already there)
    pub fn add_favorite(&mut self, college_id: u32) -> bool {
        self.append_unique(RecordKey::CollegeFavorites, Value::from(college_id))
    }

    /// Remove a college from favorites
    pub fn remove_favorite(&mut self, college_id: u32) -> bool {
        self.remove_from_list(RecordKey::CollegeFavorites, &Value::from(college_id))
    }

    /// Courses picked for comparison
    pub fn comparisons(&mut self) -> Vec<String> {
        self.stored_list(RecordKey::CourseComparisons)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// Add a course to the comparison set
    ///
    /// Returns false when the set is already full or the write fails.
    pub fn add_comparison(&mut self, course_id: impl Into<String>) -> bool {
        let course_id = Value::String(course_id.into());
        let Ok(mut courses) = self.stored_list(RecordKey::CourseComparisons) else {
            return false;
        };
        if courses.contains(&course_id) {
            return true;
        }
        if courses.len() >= consts::MAX_COMPARISONS {
            log::info!("Comparison set full ({} courses)", consts::MAX_COMPARISONS);
            return false;
        }
        courses.push(course_id);
        self.save(RecordKey::CourseComparisons, &courses)
    }

    /// Empty the comparison set
    pub fn clear_comparisons(&mut self) -> bool {
        self.remove(RecordKey::CourseComparisons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn quiz(stream: &str) -> QuizResult {
        let mut answers = Map::new();
        answers.insert("q1".to_string(), json!("a"));
        QuizResult {
            answers,
            primary_stream: stream.to_string(),
            confidence: 72.5,
            completed_at: None,
        }
    }

    #[test]
    fn test_record_key_names() {
        let names: Vec<&str> = RecordKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "userProfile",
                "quizResults",
                "timelineEvents",
                "collegeFavorites",
                "courseComparisons",
                "appSettings",
            ]
        );
        assert_eq!(RecordKey::from_str("quizResults"), Some(RecordKey::QuizResults));
        assert_eq!(RecordKey::from_str("nope"), None);
    }

    #[test]
    fn test_parse_event_date_formats() {
        let midnight = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_event_date(&json!("2025-03-01")), Some(midnight));
        assert_eq!(parse_event_date(&json!("2025-03-01T00:00:00Z")), Some(midnight));
        assert_eq!(parse_event_date(&json!("2025-03-01T05:30:00+05:30")), Some(midnight));
        assert_eq!(parse_event_date(&json!("2025-03-01T00:00:00")), Some(midnight));
        assert_eq!(parse_event_date(&json!(midnight.timestamp_millis())), Some(midnight));
        assert_eq!(parse_event_date(&json!("soon")), None);
        assert_eq!(parse_event_date(&json!(null)), None);
    }

    #[test]
    fn test_format_relative() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap();
        let at = |d: u32| Utc.with_ymd_and_hms(2025, 3, d, 9, 0, 0).unwrap();
        assert_eq!(format_relative(now, at(10)), "Today");
        assert_eq!(format_relative(now, at(11)), "Tomorrow");
        assert_eq!(format_relative(now, at(9)), "Yesterday");
        assert_eq!(format_relative(now, at(20)), "in 10 days");
        assert_eq!(format_relative(now, at(3)), "7 days ago");
    }

    #[test]
    fn test_profile_extra_fields_survive() {
        let profile: UserProfile = serde_json::from_value(json!({
            "name": "Asha", "age": 16, "class": "10", "city": "Hyderabad"
        }))
        .unwrap();
        assert_eq!(profile.extra["city"], "Hyderabad");
        assert!(profile.validate().is_valid);
    }

    #[test]
    fn test_save_user_profile_rejects_invalid() {
        let mut db = Persistence::open(MemoryStore::new());
        let report = db.save_user_profile(&UserProfile::new("A", 10, "X")).unwrap_err();
        assert_eq!(report.errors, vec!["Age must be between 13 and 30"]);
        assert!(db.user_profile().is_none());

        assert_eq!(db.save_user_profile(&UserProfile::new("Asha", 16, "10")), Ok(true));
        assert_eq!(db.user_profile().unwrap().name, "Asha");
    }

    #[test]
    fn test_quiz_history_appends() {
        let mut db = Persistence::open(MemoryStore::new());
        assert!(db.latest_quiz_result().is_none());
        db.record_quiz_result(&quiz("Science")).unwrap();
        db.record_quiz_result(&quiz("Commerce")).unwrap();
        let stored: Vec<QuizResult> = db.get(RecordKey::QuizResults).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(db.latest_quiz_result().unwrap().primary_stream, "Commerce");
    }

    #[test]
    fn test_quiz_history_from_single_result() {
        let mut db = Persistence::open(MemoryStore::new());
        assert!(db.save(RecordKey::QuizResults, &quiz("Arts")));
        assert_eq!(db.latest_quiz_result().unwrap().primary_stream, "Arts");
        db.record_quiz_result(&quiz("Science")).unwrap();
        let stored: Vec<QuizResult> = db.get(RecordKey::QuizResults).unwrap();
        assert_eq!(stored[0].primary_stream, "Arts");
        assert_eq!(stored[1].primary_stream, "Science");
    }

    #[test]
    fn test_quiz_result_validation_blocks_save() {
        let mut db = Persistence::open(MemoryStore::new());
        let mut bad = quiz("Science");
        bad.confidence = 150.0;
        assert!(db.record_quiz_result(&bad).is_err());
        assert!(db.get::<Value>(RecordKey::QuizResults).is_none());
    }

    #[test]
    fn test_timeline_accessors() {
        let mut db = Persistence::open(MemoryStore::new());
        assert!(!db.add_timeline_event(TimelineEvent::new("someday", "Bad")));
        assert!(db.add_timeline_event(TimelineEvent::new("2001-01-01", "Past")));
        assert!(db.add_timeline_event(TimelineEvent::new("2999-06-01", "Exam")));
        assert!(db.add_timeline_event(TimelineEvent::new("2999-01-15", "Deadline")));

        assert_eq!(db.timeline().len(), 3);
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let titles: Vec<String> = db.upcoming_events(now).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["Exam", "Deadline"]);
    }

    #[test]
    fn test_favorites() {
        let mut db = Persistence::open(MemoryStore::new());
        assert!(db.add_favorite(3));
        assert!(db.add_favorite(7));
        assert!(db.add_favorite(3));
        assert_eq!(db.favorites(), vec![3, 7]);
        assert!(db.remove_favorite(3));
        assert!(db.remove_favorite(42));
        assert_eq!(db.favorites(), vec![7]);
    }

    #[test]
    fn test_comparisons_are_bounded() {
        let mut db = Persistence::open(MemoryStore::new());
        for course in ["cse", "it", "eee", "ai"] {
            assert!(db.add_comparison(course));
        }
        assert!(db.add_comparison("cse"));
        assert!(!db.add_comparison("mech"));
        assert_eq!(db.comparisons().len(), consts::MAX_COMPARISONS);
        assert!(db.clear_comparisons());
        assert!(db.comparisons().is_empty());
    }

    #[test]
    fn test_timeline_append_keeps_foreign_entries() {
        let mut db = Persistence::open(MemoryStore::new());
        let exam_ms = Utc.with_ymd_and_hms(2999, 3, 1, 0, 0, 0).unwrap().timestamp_millis();
        let seeded = json!([
            {"date": exam_ms, "title": "Exam", "kind": "exam"},
            {"date": "2999-01-01", "title": "Deadline", "kind": "deadline"}
        ]);
        assert!(db.save(RecordKey::TimelineEvents, &seeded));

        let events = db.timeline();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].date, json!(exam_ms));
        assert_eq!(events[0].extra["kind"], "exam");

        assert!(db.add_timeline_event(TimelineEvent::new("2999-06-01", "New")));
        let stored: Vec<Value> = db.get(RecordKey::TimelineEvents).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0], seeded[0]);
        assert_eq!(stored[1], seeded[1]);
        assert_eq!(stored[2]["title"], "New");
    }

    #[test]
    fn test_list_appends_never_overwrite_other_shapes() {
        let mut db = Persistence::open(MemoryStore::new());
        let odd = json!({"note": "not a list"});
        assert!(db.save(RecordKey::TimelineEvents, &odd));
        assert!(db.save(RecordKey::CollegeFavorites, &odd));
        assert!(db.save(RecordKey::CourseComparisons, &odd));

        assert!(!db.add_timeline_event(TimelineEvent::new("2999-06-01", "New")));
        assert!(!db.add_favorite(3));
        assert!(!db.remove_favorite(3));
        assert!(!db.add_comparison("cse"));

        for key in [RecordKey::TimelineEvents, RecordKey::CollegeFavorites, RecordKey::CourseComparisons] {
            assert_eq!(db.get::<Value>(key), Some(odd.clone()));
        }
        assert!(db.timeline().is_empty());
        assert!(db.favorites().is_empty());
    }

    #[test]
    fn test_favorites_keep_foreign_items() {
        let mut db = Persistence::open(MemoryStore::new());
        assert!(db.save(RecordKey::CollegeFavorites, &json!([5, "legacy-id"])));
        assert!(db.add_favorite(9));
        assert_eq!(db.favorites(), vec![5, 9]);
        assert!(db.remove_favorite(5));
        assert_eq!(db.get::<Value>(RecordKey::CollegeFavorites), Some(json!(["legacy-id", 9])));
    }
}
