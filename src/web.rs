//! JavaScript bindings (WASM only)
//!
//! Values cross the boundary as JSON text so the page can hand over plain
//! objects via `JSON.stringify` and read results back with `JSON.parse`.

use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::persistence::{Persistence, StorageMode};
use crate::platform::LocalStorage;
use crate::recommend::{College, RecommendRequest, recommend};
use crate::validation::{ValidationReport, validate_quiz_results, validate_user_profile};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
}

fn parse(json: &str) -> Option<Value> {
    serde_json::from_str(json)
        .map_err(|e| log::warn!("Invalid JSON from page: {}", e))
        .ok()
}

fn report_json(report: ValidationReport) -> String {
    serde_json::to_string(&report).unwrap_or_else(|_| r#"{"isValid":false,"errors":[]}"#.to_string())
}

/// Persistence over `window.localStorage`
#[wasm_bindgen]
pub struct WebPersistence {
    inner: Persistence<LocalStorage>,
}

#[wasm_bindgen]
impl WebPersistence {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebPersistence {
        WebPersistence {
            inner: Persistence::open(LocalStorage::open()),
        }
    }

    /// "durable" or "memory"
    pub fn mode(&self) -> String {
        match self.inner.mode() {
            StorageMode::Durable => "durable".to_string(),
            StorageMode::InMemory => "memory".to_string(),
        }
    }

    pub fn save(&mut self, key: &str, json: &str) -> bool {
        match parse(json) {
            Some(value) => self.inner.save(key, &value),
            None => false,
        }
    }

    pub fn get(&mut self, key: &str) -> Option<String> {
        self.inner.get::<Value>(key).map(|v| v.to_string())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.inner.remove(key)
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&mut self) -> bool {
        self.inner.clear_all()
    }

    #[wasm_bindgen(js_name = exportAll)]
    pub fn export_all(&mut self) -> Option<String> {
        let bundle = self.inner.export_all()?;
        serde_json::to_string(&bundle).ok()
    }

    #[wasm_bindgen(js_name = importAll)]
    pub fn import_all(&mut self, json: &str) -> bool {
        match parse(json) {
            Some(bundle) => self.inner.import_all(&bundle),
            None => false,
        }
    }

    pub fn stats(&self) -> Option<String> {
        let stats = self.inner.stats()?;
        serde_json::to_string(&stats).ok()
    }
}

impl Default for WebPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen(js_name = validateUserProfile)]
pub fn validate_user_profile_json(json: &str) -> String {
    report_json(validate_user_profile(&parse(json).unwrap_or(Value::Null)))
}

#[wasm_bindgen(js_name = validateQuizResults)]
pub fn validate_quiz_results_json(json: &str) -> String {
    report_json(validate_quiz_results(&parse(json).unwrap_or(Value::Null)))
}

/// Rank a college list (`College[]` JSON) for a form payload
#[wasm_bindgen(js_name = recommendColleges)]
pub fn recommend_colleges(colleges_json: &str, request_json: &str) -> Option<String> {
    let colleges: Vec<College> = serde_json::from_str(colleges_json)
        .map_err(|e| log::warn!("Invalid college list: {}", e))
        .ok()?;
    let request: RecommendRequest = serde_json::from_str(request_json)
        .map_err(|e| log::warn!("Invalid recommendation request: {}", e))
        .ok()?;
    serde_json::to_string(&recommend(&colleges, &request)).ok()
}
