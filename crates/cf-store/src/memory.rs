use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{HashStore, Result};

/// In-process [`HashStore`]; state lives as long as the value.
#[derive(Default)]
pub struct MemoryStore {
    hashes: Mutex<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HashStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .hashes
            .lock()
            .get(key)
            .and_then(|h| h.get(field))
            .cloned())
    }

    async fn set(&self, key: &str, field: &str, value: &[u8]) -> Result<()> {
        self.hashes
            .lock()
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_vec());
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, field: &str, value: &[u8]) -> Result<bool> {
        let mut hashes = self.hashes.lock();
        let hash = hashes.entry(key.to_string()).or_default();
        if hash.contains_key(field) {
            return Ok(false);
        }
        hash.insert(field.to_string(), value.to_vec());
        Ok(true)
    }

    async fn delete(&self, key: &str, field: &str) -> Result<bool> {
        Ok(self
            .hashes
            .lock()
            .get_mut(key)
            .and_then(|h| h.remove(field))
            .is_some())
    }

    async fn exists(&self, key: &str, field: &str) -> Result<bool> {
        Ok(self
            .hashes
            .lock()
            .get(key)
            .is_some_and(|h| h.contains_key(field)))
    }

    async fn entries(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
        Ok(self
            .hashes
            .lock()
            .get(key)
            .map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}
