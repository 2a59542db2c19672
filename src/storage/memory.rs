//! In-memory storage backend
//!
//! Used for dry runs and tests; nothing survives the process.

use crate::storage::traits::{
    CacheBackend, CachedResponse, ProgressStore, ProgressValue, StorageBackend, StorageError,
    StorageResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct MemoryStorage {
    responses: Mutex<HashMap<(String, String), CachedResponse>>,
    progress: Mutex<HashMap<String, ProgressValue>>,
    closed: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> StorageResult<MutexGuard<'a, T>> {
        self.ensure_open()?;
        mutex
            .lock()
            .map_err(|_| StorageError::Database("memory storage lock poisoned".to_string()))
    }
}

impl CacheBackend for MemoryStorage {
    fn get_response(&self, method: &str, url: &str) -> StorageResult<Option<CachedResponse>> {
        let responses = self.lock(&self.responses)?;
        Ok(responses
            .get(&(method.to_string(), url.to_string()))
            .cloned())
    }

    fn put_response(
        &self,
        method: &str,
        url: &str,
        response: &CachedResponse,
    ) -> StorageResult<()> {
        let mut responses = self.lock(&self.responses)?;
        responses.insert((method.to_string(), url.to_string()), response.clone());
        Ok(())
    }

    fn count_responses(&self) -> StorageResult<u64> {
        Ok(self.lock(&self.responses)?.len() as u64)
    }
}

impl ProgressStore for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<ProgressValue>> {
        Ok(self.lock(&self.progress)?.get(key).cloned())
    }

    fn save(&self, key: &str, value: ProgressValue) -> StorageResult<()> {
        self.lock(&self.progress)?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.lock(&self.progress)?.remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.lock(&self.progress)?.clear();
        Ok(())
    }
}

impl StorageBackend for MemoryStorage {
    fn close(&self) -> StorageResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
