//! Key-value storage backends
//!
//! Every backend stores raw strings. Serialization is the persistence layer's
//! job, so a backend only needs the three primitives plus key enumeration for
//! size accounting.

use std::collections::BTreeMap;

use thiserror::Error;

/// Failure reported by a storage primitive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("storage I/O error: {0}")]
    Io(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Synchronous string key-value store
///
/// Mirrors the browser `Storage` interface: every call may fail, and the
/// caller is responsible for translating failures.
pub trait KeyValueStore {
    /// Write `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read the value under `key` (`None` if absent)
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Delete `key`. Deleting an absent key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;

    /// All keys currently present
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Number of entries
    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.keys()?.len())
    }

    /// Check if the store holds no entries
    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Approximate usage in bytes: key length plus value length, summed
    fn used_bytes(&self) -> Result<usize, StoreError> {
        let mut total = 0;
        for key in self.keys()? {
            if let Some(value) = self.get(&key)? {
                total += key.len() + value.len();
            }
        }
        Ok(total)
    }
}

/// In-process store backed by an ordered map
///
/// Used as the fallback when the durable store is unusable, and as the test
/// double everywhere else. An optional quota makes writes fail the way a
/// full LocalStorage does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Create an empty, unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects writes past `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    fn current_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(quota) = self.quota {
            let replaced = self.entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = self.current_bytes() - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.len())
    }

    fn used_bytes(&self) -> Result<usize, StoreError> {
        Ok(self.current_bytes())
    }
}

/// Browser LocalStorage (WASM only)
///
/// Acquiring `window.localStorage` can itself fail (privacy modes, sandboxed
/// iframes). That failure is kept and reported by every primitive so the
/// startup usability check sees it.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: Result<web_sys::Storage, StoreError>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// Acquire `window.localStorage`
    pub fn open() -> Self {
        let storage = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".to_string()))
            .and_then(|w| {
                w.local_storage()
                    .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))
            })
            .and_then(|s| s.ok_or_else(|| StoreError::Unavailable("localStorage is disabled".to_string())));
        Self { storage }
    }

    fn storage(&self) -> Result<&web_sys::Storage, StoreError> {
        self.storage.as_ref().map_err(Clone::clone)
    }
}

#[cfg(target_arch = "wasm32")]
fn js_error(e: wasm_bindgen::JsValue) -> StoreError {
    StoreError::Backend(format!("{:?}", e))
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        // Browsers throw QuotaExceededError here; the message is all we get.
        self.storage()?.set_item(key, value).map_err(js_error)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?.get_item(key).map_err(js_error)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage()?.remove_item(key).map_err(js_error)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let storage = self.storage()?;
        let len = storage.length().map_err(js_error)?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Some(key) = storage.key(i).map_err(js_error)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Single JSON file holding every entry (native only)
///
/// The whole map is kept in memory and rewritten on every mutation, which is
/// fine at LocalStorage scale.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct JsonFileStore {
    path: std::path::PathBuf,
    entries: BTreeMap<String, String>,
}

#[cfg(not(target_arch = "wasm32"))]
impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<std::path::PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| StoreError::Backend(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::Io(format!("{}: {}", path.display(), e))),
        };
        log::debug!("Opened {} ({} entries)", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    /// Path of the backing file
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Write tmp file then rename over the real one
    fn flush(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|e| StoreError::Io(format!("{}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::Io(format!("{}: {}", self.path.display(), e)))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for JsonFileStore {
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let previous = self.entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush() {
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}
