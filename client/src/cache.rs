//! Address-keyed persistence of the last fingerprint.
//!
//! One record `{ip, latencyTokens}` is kept. A lookup hits only when the
//! stored address equals the caller's current address; there is no
//! time-based expiry. Empty fingerprints are never stored, so a run where
//! every region failed is retried on the next call.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use vantage_types::{CallerAddr, MeasurementRound};

use crate::{
    ChallengeTransport, ClientError, Fingerprint, MeasurementObserver, Orchestrator,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub ip: String,
    pub latency_tokens: Vec<String>,
}

impl CacheEntry {
    fn matches(&self, addr: &CallerAddr) -> bool {
        self.ip.parse::<CallerAddr>().is_ok_and(|stored| stored == *addr)
    }
}

/// Backing storage for the single cache record.
pub trait CacheStore: Send + Sync {
    fn load(&self) -> Result<Option<CacheEntry>, ClientError>;
    fn save(&self, entry: &CacheEntry) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

/// Stores the record as a JSON file.
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self) -> Result<Option<CacheEntry>, ClientError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ClientError::Cache(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| ClientError::Cache(format!("corrupt cache file {}: {e}", self.path.display())))
    }

    fn save(&self, entry: &CacheEntry) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ClientError::Cache(format!("failed to create {}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(entry)
            .map_err(|e| ClientError::Cache(e.to_string()))?;

        // Readers only ever see a complete record.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| ClientError::Cache(format!("failed to write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| ClientError::Cache(format!("failed to replace {}: {e}", self.path.display())))
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Cache(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

/// Tokens returned by [`LatencyCache::get_or_measure`].
#[derive(Clone, Debug, PartialEq)]
pub struct CachedFingerprint {
    pub latency_tokens: Vec<String>,
    /// The rounds behind `latency_tokens`; `None` on a cache hit.
    pub measured_rounds: Option<Vec<MeasurementRound>>,
}

impl CachedFingerprint {
    pub fn from_cache(&self) -> bool {
        self.measured_rounds.is_none()
    }
}

pub struct LatencyCache<S> {
    store: S,
}

impl<S: CacheStore> LatencyCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cached tokens for `addr`, if the stored record belongs to it.
    /// An unreadable record counts as a miss.
    pub fn lookup(&self, addr: &CallerAddr) -> Option<Vec<String>> {
        match self.store.load() {
            Ok(Some(entry)) if entry.matches(addr) => {
                tracing::debug!(%addr, tokens = entry.latency_tokens.len(), "latency cache hit");
                Some(entry.latency_tokens)
            }
            Ok(Some(entry)) => {
                tracing::debug!(%addr, cached = %entry.ip, "latency cache miss: address changed");
                None
            }
            Ok(None) => {
                tracing::debug!(%addr, "latency cache miss: empty");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable latency cache");
                None
            }
        }
    }

    /// Persist `tokens` for `addr`. Empty token lists are not stored.
    pub fn record(&self, addr: &CallerAddr, tokens: &[String]) -> Result<(), ClientError> {
        if tokens.is_empty() {
            tracing::debug!(%addr, "not caching empty fingerprint");
            return Ok(());
        }
        self.store.save(&CacheEntry {
            ip: addr.to_string(),
            latency_tokens: tokens.to_vec(),
        })
    }

    /// Return the cached tokens for `addr`, or measure, aggregate and cache.
    ///
    /// A failed cache write is logged; the measured tokens are returned
    /// regardless.
    pub async fn get_or_measure<T, O>(
        &self,
        addr: &CallerAddr,
        orchestrator: &Orchestrator<T>,
        observer: &mut O,
    ) -> Result<CachedFingerprint, ClientError>
    where
        T: ChallengeTransport,
        O: MeasurementObserver,
    {
        if let Some(latency_tokens) = self.lookup(addr) {
            return Ok(CachedFingerprint {
                latency_tokens,
                measured_rounds: None,
            });
        }

        let rounds = orchestrator.run(observer).await;
        let latency_tokens = Fingerprint::from_rounds(&rounds).to_token_list();
        if let Err(e) = self.record(addr, &latency_tokens) {
            tracing::warn!(error = %e, "failed to persist latency cache");
        }
        Ok(CachedFingerprint {
            latency_tokens,
            measured_rounds: Some(rounds),
        })
    }

    /// Drop the stored record so the next call measures again.
    pub fn invalidate(&self) -> Result<(), ClientError> {
        tracing::debug!("invalidating latency cache");
        self.store.clear()
    }
}
