//! In-memory remote used by the sync tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{RemoteError, RemoteStore};
use crate::server::merge_fields;
use crate::store::Collection;

#[derive(Default)]
pub struct MemoryRemoteStore {
    data: Mutex<HashMap<Collection, BTreeMap<String, Value>>>,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail, simulating a network outage.
    pub fn set_offline(&self, offline: bool) {
        self.fail.store(offline, Ordering::SeqCst);
    }

    /// Adds latency to every call; lets tests hold a reconcile in flight.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn seed(&self, collection: Collection, docs: Vec<Value>) {
        let mut data = self.data.lock().unwrap();
        let map = data.entry(collection).or_default();
        for doc in docs {
            if let Some(id) = doc.get("id").and_then(|v| v.as_str()) {
                map.insert(id.to_string(), doc.clone());
            }
        }
    }

    pub fn documents(&self, collection: Collection) -> Vec<Value> {
        self.data
            .lock()
            .unwrap()
            .get(&collection)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, collection: Collection, id: &str) -> bool {
        self.data
            .lock()
            .unwrap()
            .get(&collection)
            .is_some_and(|m| m.contains_key(id))
    }

    async fn gate(&self) -> Result<(), RemoteError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteError::Http("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Value>, RemoteError> {
        self.gate().await?;
        Ok(self.documents(collection))
    }

    async fn upsert(
        &self,
        collection: Collection,
        id: &str,
        doc: &Value,
    ) -> Result<(), RemoteError> {
        self.gate().await?;
        let mut data = self.data.lock().unwrap();
        let map = data.entry(collection).or_default();
        match map.get_mut(id) {
            Some(existing) => merge_fields(existing, doc),
            None => {
                map.insert(id.to_string(), doc.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        self.gate().await?;
        let mut data = self.data.lock().unwrap();
        if let Some(map) = data.get_mut(&collection) {
            map.remove(id);
        }
        Ok(())
    }
}
