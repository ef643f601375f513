//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (epoch milliseconds)
//! - Key-value storage (LocalStorage on web, a JSON file natively)

pub mod storage;
pub mod time;

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
#[cfg(not(target_arch = "wasm32"))]
pub use storage::JsonFileStore;
pub use storage::{KeyValueStore, MemoryStore, StoreError};
pub use time::{now, now_ms};
