use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;

use super::{Record, RecordSet, RecordStore, StorageError};

/// In-memory record store for tests/dev.
///
/// Records are kept as JSON values per set, in insertion order, so one store
/// serves every record type.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    sets: RwLock<HashMap<RecordSet, Vec<(String, JsonValue)>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held in `set`.
    pub fn len(&self, set: RecordSet) -> usize {
        self.sets
            .read()
            .map(|sets| sets.get(&set).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn encode<R: Record>(record: &R) -> Result<JsonValue, StorageError> {
        serde_json::to_value(record).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn lock_error<T>(_: T) -> StorageError {
        StorageError::Lock("in-memory record store".to_string())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn load_all<R: Record>(&self) -> Result<Vec<R>, StorageError> {
        let sets = self.sets.read().map_err(Self::lock_error)?;
        let Some(rows) = sets.get(&R::SET) else {
            return Ok(vec![]);
        };
        rows.iter()
            .map(|(_k, v)| {
                serde_json::from_value(v.clone()).map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .collect()
    }

    fn insert<R: Record>(&self, record: &R) -> Result<(), StorageError> {
        let key = record.key();
        let value = Self::encode(record)?;
        let mut sets = self.sets.write().map_err(Self::lock_error)?;
        let rows = sets.entry(R::SET).or_default();
        if rows.iter().any(|(k, _)| *k == key) {
            return Err(StorageError::DuplicateKey { set: R::SET, key });
        }
        rows.push((key, value));
        Ok(())
    }

    fn update<R: Record>(&self, key: &str, record: &R) -> Result<(), StorageError> {
        let value = Self::encode(record)?;
        let mut sets = self.sets.write().map_err(Self::lock_error)?;
        let slot = sets
            .get_mut(&R::SET)
            .and_then(|rows| rows.iter_mut().find(|(k, _)| k == key))
            .ok_or_else(|| StorageError::MissingKey {
                set: R::SET,
                key: key.to_string(),
            })?;
        *slot = (record.key(), value);
        Ok(())
    }

    fn delete<R: Record>(&self, key: &str) -> Result<(), StorageError> {
        let mut sets = self.sets.write().map_err(Self::lock_error)?;
        let rows = sets.entry(R::SET).or_default();
        let before = rows.len();
        rows.retain(|(k, _)| k != key);
        if rows.len() == before {
            return Err(StorageError::MissingKey {
                set: R::SET,
                key: key.to_string(),
            });
        }
        Ok(())
    }
}
