//! Compass Store - client-side persistence for the Compass stream guide
//!
//! Core modules:
//! - `persistence`: Validated, capacity-aware facade over a key-value store
//! - `platform`: Browser/native storage backends and wall-clock time
//! - `records`: Typed logical records (profile, quiz results, timeline)
//! - `settings`: App settings record created on first run
//! - `validation`: Field-level checks for profiles and quiz results
//! - `recommend`: College recommendation scoring

pub mod persistence;
pub mod platform;
pub mod recommend;
pub mod records;
pub mod settings;
pub mod validation;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use persistence::{BackupBundle, PersistError, Persistence, StorageMode, StorageStats};
pub use platform::{KeyValueStore, MemoryStore, StoreError};
pub use records::{QuizResult, RecordKey, TimelineEvent, UserProfile};
pub use settings::{AppSettings, Theme};
pub use validation::{ValidationReport, validate_quiz_results, validate_user_profile};

/// Storage configuration constants
pub mod consts {
    /// Logical key: user profile
    pub const USER_PROFILE: &str = "userProfile";
    /// Logical key: quiz results (single result or history list)
    pub const QUIZ_RESULTS: &str = "quizResults";
    /// Logical key: timeline events
    pub const TIMELINE_EVENTS: &str = "timelineEvents";
    /// Logical key: favorited colleges
    pub const COLLEGE_FAVORITES: &str = "collegeFavorites";
    /// Logical key: courses selected for side-by-side comparison
    pub const COURSE_COMPARISONS: &str = "courseComparisons";
    /// Logical key: app settings
    pub const APP_SETTINGS: &str = "appSettings";

    /// Capacity threshold that triggers eviction (5 MiB)
    pub const STORAGE_CAPACITY_BYTES: usize = 5 * 1024 * 1024;

    /// Version stamped into exported backups
    pub const BACKUP_FORMAT_VERSION: &str = "1.0";

    /// Sentinel key written and deleted to check store usability
    pub const SENTINEL_KEY: &str = "__storage_test__";

    /// Most courses that can be compared at once
    pub const MAX_COMPARISONS: usize = 4;
}
