//! Nullable cache store: in-memory record for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use vantage_client::{CacheEntry, CacheStore, ClientError};

/// Holds the cache record in memory and counts writes.
#[derive(Default)]
pub struct NullCacheStore {
    entry: Mutex<Option<CacheEntry>>,
    saves: AtomicUsize,
}

impl NullCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(entry: CacheEntry) -> Self {
        Self {
            entry: Mutex::new(Some(entry)),
            saves: AtomicUsize::new(0),
        }
    }

    /// The currently stored record (for assertions).
    pub fn entry(&self) -> Option<CacheEntry> {
        self.entry.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl CacheStore for NullCacheStore {
    fn load(&self) -> Result<Option<CacheEntry>, ClientError> {
        Ok(self.entry.lock().unwrap().clone())
    }

    fn save(&self, entry: &CacheEntry) -> Result<(), ClientError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.entry.lock().unwrap() = Some(entry.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.entry.lock().unwrap() = None;
        Ok(())
    }
}
