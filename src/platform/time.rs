//! Wall-clock time

use chrono::{DateTime, Utc};

/// Current time as Unix epoch milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Current time as Unix epoch milliseconds
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    Utc::now().timestamp_millis() as f64
}

/// Current time as a UTC timestamp
pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(now_ms() as i64).unwrap_or_default()
}
