//! Save/load persistence over a key-value store
//!
//! Features:
//! - JSON encoding of any serde value under a string key
//! - One-time durable/in-memory decision at startup
//! - Capacity check with best-effort eviction before writes
//! - Self-healing reads (corrupt records are deleted)
//! - Versioned backup export/import
//!
//! Every public operation comes in two forms: `try_*` returns a
//! [`PersistError`], the plain form logs it and returns `bool`/`Option`.

pub mod backup;
pub mod error;
pub mod eviction;

pub use backup::BackupBundle;
pub use error::PersistError;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::consts::{APP_SETTINGS, SENTINEL_KEY, STORAGE_CAPACITY_BYTES};
use crate::platform::{self, KeyValueStore, MemoryStore, StoreError};
use crate::records::RecordKey;
use crate::settings::AppSettings;

/// Which backend a facade ended up with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// The store handed to [`Persistence::open`]
    Durable,
    /// Process-lifetime map, used when the durable store was not usable
    InMemory,
}

/// Usage report
#[derive(Debug, Clone, PartialEq)]
pub enum StorageStats {
    Durable {
        /// Approximate bytes used by the whole store
        used: usize,
        /// Capacity threshold
        total: usize,
        /// `used / total`, percent, two decimals
        percentage: f64,
    },
    InMemory {
        /// Number of entries held in memory
        used: usize,
    },
}

impl StorageStats {
    pub fn used(&self) -> usize {
        match self {
            StorageStats::Durable { used, .. } | StorageStats::InMemory { used } => *used,
        }
    }
}

impl Serialize for StorageStats {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
        use serde::ser::SerializeStruct;
        match self {
            StorageStats::Durable {
                used,
                total,
                percentage,
            } => {
                let mut s = serializer.serialize_struct("StorageStats", 3)?;
                s.serialize_field("used", used)?;
                s.serialize_field("total", total)?;
                s.serialize_field("percentage", percentage)?;
                s.end()
            }
            StorageStats::InMemory { used } => {
                let mut s = serializer.serialize_struct("StorageStats", 3)?;
                s.serialize_field("used", used)?;
                s.serialize_field("total", "memory")?;
                s.serialize_field("percentage", &Option::<f64>::None)?;
                s.end()
            }
        }
    }
}

enum Backend<S> {
    Durable(S),
    InMemory(MemoryStore),
}

/// Validated, capacity-aware access to the logical records
///
/// Construct one per process and pass it to whatever needs persistence.
/// Single-threaded by contract: nothing guards against another tab writing
/// the same store.
pub struct Persistence<S> {
    backend: Backend<S>,
    clock: fn() -> DateTime<Utc>,
}

impl<S: KeyValueStore> Persistence<S> {
    /// Open over `store`, falling back to memory if it is not usable
    pub fn open(store: S) -> Self {
        Self::open_with_clock(store, platform::now)
    }

    /// [`Persistence::open`] with an injected clock
    pub fn open_with_clock(store: S, clock: fn() -> DateTime<Utc>) -> Self {
        match Self::try_open_durable(store, clock) {
            Ok(persistence) => persistence,
            Err(e) => {
                log::warn!("{}; falling back to in-memory storage", e);
                Self {
                    backend: Backend::InMemory(MemoryStore::new()),
                    clock,
                }
            }
        }
    }

    /// Open over `store` without the in-memory fallback
    pub fn try_open_durable(mut store: S, clock: fn() -> DateTime<Utc>) -> Result<Self, PersistError> {
        check_usable(&mut store).map_err(PersistError::StoreUnavailable)?;
        let mut persistence = Self {
            backend: Backend::Durable(store),
            clock,
        };
        persistence.ensure_settings();
        log::info!("Durable storage ready");
        Ok(persistence)
    }

    /// Create the settings record on first run
    fn ensure_settings(&mut self) {
        match self.store().get(APP_SETTINGS) {
            Ok(Some(_)) => {}
            Ok(None) => {
                let settings = AppSettings::new((self.clock)());
                if self.save(RecordKey::AppSettings, &settings) {
                    log::info!("Created default app settings");
                }
            }
            Err(e) => log::warn!("Could not read app settings: {}", e),
        }
    }

    pub fn mode(&self) -> StorageMode {
        match self.backend {
            Backend::Durable(_) => StorageMode::Durable,
            Backend::InMemory(_) => StorageMode::InMemory,
        }
    }

    /// The durable store, if this facade is using it
    pub fn durable_store(&self) -> Option<&S> {
        match &self.backend {
            Backend::Durable(store) => Some(store),
            Backend::InMemory(_) => None,
        }
    }

    fn store(&self) -> &dyn KeyValueStore {
        match &self.backend {
            Backend::Durable(store) => store,
            Backend::InMemory(map) => map,
        }
    }

    fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        match &mut self.backend {
            Backend::Durable(store) => store,
            Backend::InMemory(map) => map,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Encode and write `value` under `key`
    ///
    /// If the projected store size exceeds the capacity threshold, eviction
    /// runs once first. The size is not re-checked afterwards, so the write
    /// itself may still fail.
    pub fn try_save<T>(&mut self, key: impl AsRef<str>, value: &T) -> Result<(), PersistError>
    where
        T: Serialize + ?Sized,
    {
        let key = key.as_ref();
        let mut value = serde_json::to_value(value)?;
        if value.is_null() {
            return Err(PersistError::invalid(format!("refusing to save null under {}", key)));
        }
        let mut payload = serde_json::to_string(&value)?;

        if self.mode() == StorageMode::Durable {
            let projected = self.store().used_bytes()? + payload.len();
            if projected > STORAGE_CAPACITY_BYTES {
                log::warn!(
                    "Projected size {} exceeds {} bytes, evicting old data",
                    projected,
                    STORAGE_CAPACITY_BYTES
                );
                let now = self.now();
                let freed = eviction::evict(self.store_mut(), now, key);
                if eviction::compact(key, &mut value, now) {
                    payload = serde_json::to_string(&value)?;
                }
                log::debug!("Eviction freed {} bytes", freed);
            }
        }

        self.store_mut().set(key, &payload)?;
        log::debug!("Saved {} ({} bytes)", key, payload.len());
        Ok(())
    }

    /// [`Persistence::try_save`], logging failures. Returns true on success.
    pub fn save<T>(&mut self, key: impl AsRef<str>, value: &T) -> bool
    where
        T: Serialize + ?Sized,
    {
        let key = key.as_ref();
        match self.try_save(key, value) {
            Ok(()) => true,
            Err(PersistError::InvalidInput(msg)) => {
                log::warn!("Save rejected: {}", msg);
                false
            }
            Err(e) => {
                log::error!("Failed to save {}: {}", key, e);
                false
            }
        }
    }

    /// Read and decode the value under `key`
    ///
    /// Stored text that is not valid JSON is treated as corrupt: it is
    /// deleted and `Ok(None)` is returned. Valid JSON of the wrong shape for
    /// `T` is left in place and reported as a serialization error.
    pub fn try_get<T: DeserializeOwned>(&mut self, key: impl AsRef<str>) -> Result<Option<T>, PersistError> {
        let key = key.as_ref();
        let Some(text) = self.store().get(key)? else {
            return Ok(None);
        };
        let value = match serde_json::from_str::<Value>(&text) {
            Ok(Value::Null) => return Ok(None),
            Ok(value) => value,
            Err(e) => {
                log::warn!("Corrupted data under {} ({}), removing it", key, e);
                if let Err(e) = self.store_mut().delete(key) {
                    log::warn!("Could not remove corrupted {}: {}", key, e);
                }
                return Ok(None);
            }
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    /// [`Persistence::try_get`], logging failures
    pub fn get<T: DeserializeOwned>(&mut self, key: impl AsRef<str>) -> Option<T> {
        let key = key.as_ref();
        self.try_get(key).unwrap_or_else(|e| {
            log::error!("Failed to read {}: {}", key, e);
            None
        })
    }

    /// Delete the record under `key`
    pub fn try_remove(&mut self, key: impl AsRef<str>) -> Result<(), PersistError> {
        let key = key.as_ref();
        self.store_mut().delete(key)?;
        log::debug!("Removed {}", key);
        Ok(())
    }

    /// [`Persistence::try_remove`], logging failures. Returns true on success.
    pub fn remove(&mut self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref();
        match self.try_remove(key) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to remove {}: {}", key, e);
                false
            }
        }
    }

    /// Remove every logical record. Returns false if any removal failed.
    pub fn clear_all(&mut self) -> bool {
        let mut ok = true;
        for key in RecordKey::ALL {
            ok &= self.remove(key);
        }
        ok
    }

    /// Usage of the whole store
    ///
    /// Durable: bytes against the capacity threshold. In-memory: entry count.
    pub fn try_stats(&self) -> Result<StorageStats, StoreError> {
        match &self.backend {
            Backend::Durable(store) => {
                let used = store.used_bytes()?;
                let percentage = used as f64 / STORAGE_CAPACITY_BYTES as f64 * 100.0;
                Ok(StorageStats::Durable {
                    used,
                    total: STORAGE_CAPACITY_BYTES,
                    percentage: (percentage * 100.0).round() / 100.0,
                })
            }
            Backend::InMemory(map) => Ok(StorageStats::InMemory { used: map.len()? }),
        }
    }

    /// [`Persistence::try_stats`], logging failures
    pub fn stats(&self) -> Option<StorageStats> {
        self.try_stats()
            .map_err(|e| log::error!("Failed to compute storage stats: {}", e))
            .ok()
    }
}

/// Write then delete a sentinel key
fn check_usable(store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
    store.set(SENTINEL_KEY, SENTINEL_KEY)?;
    store.delete(SENTINEL_KEY)
}
