//! Backup export/import
//!
//! A bundle is a flat JSON object: one field per logical record that was
//! present at export time, plus `exportDate` and `version`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{PersistError, Persistence};
use crate::consts::BACKUP_FORMAT_VERSION;
use crate::platform::KeyValueStore;
use crate::records::RecordKey;

/// Snapshot of every logical record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupBundle {
    /// Logical key name -> stored value
    #[serde(flatten)]
    pub records: BTreeMap<String, Value>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl BackupBundle {
    pub fn get(&self, key: RecordKey) -> Option<&Value> {
        self.records.get(key.as_str())
    }
}

impl<S: KeyValueStore> Persistence<S> {
    /// Collect every present logical record into a bundle
    ///
    /// Any failure aborts the export; there are no partial bundles.
    pub fn try_export_all(&mut self) -> Result<BackupBundle, PersistError> {
        let mut records = BTreeMap::new();
        for key in RecordKey::ALL {
            if let Some(value) = self.try_get::<Value>(key)? {
                records.insert(key.as_str().to_string(), value);
            }
        }
        let bundle = BackupBundle {
            records,
            export_date: self.now(),
            version: BACKUP_FORMAT_VERSION.to_string(),
        };
        log::info!("Exported {} records", bundle.records.len());
        Ok(bundle)
    }

    /// [`Persistence::try_export_all`], logging failures
    pub fn export_all(&mut self) -> Option<BackupBundle> {
        self.try_export_all()
            .map_err(|e| log::error!("Export failed: {}", e))
            .ok()
    }

    /// Overwrite each logical record present in `bundle`
    ///
    /// Not transactional: a failure part-way leaves earlier records written.
    /// Keys outside the logical set are ignored.
    pub fn try_import_all(&mut self, bundle: &Value) -> Result<usize, PersistError> {
        let Value::Object(fields) = bundle else {
            return Err(PersistError::invalid("backup bundle must be a JSON object"));
        };
        match fields.get("version").and_then(Value::as_str) {
            Some(BACKUP_FORMAT_VERSION) => {}
            Some(other) => log::warn!("Importing backup with version {} (expected {})", other, BACKUP_FORMAT_VERSION),
            None => log::warn!("Importing backup without a version"),
        }

        let mut imported = 0;
        let mut first_error = None;
        for key in RecordKey::ALL {
            let Some(value) = fields.get(key.as_str()) else {
                continue;
            };
            match self.try_save(key, value) {
                Ok(()) => imported += 1,
                Err(e) => {
                    log::error!("Import of {} failed: {}", key, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        log::info!("Imported {} records", imported);
        match first_error {
            Some(e) => Err(e),
            None => Ok(imported),
        }
    }

    /// [`Persistence::try_import_all`], logging failures. True only if every
    /// present record was written.
    pub fn import_all(&mut self, bundle: &Value) -> bool {
        match self.try_import_all(bundle) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Import incomplete: {}", e);
                false
            }
        }
    }

    /// Import a typed bundle
    pub fn import_bundle(&mut self, bundle: &BackupBundle) -> bool {
        match serde_json::to_value(bundle) {
            Ok(value) => self.import_all(&value),
            Err(e) => {
                log::error!("Could not encode bundle: {}", e);
                false
            }
        }
    }
}
