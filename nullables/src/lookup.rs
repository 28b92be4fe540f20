//! Nullable address lookup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use vantage_client::{AddressLookup, ClientError};
use vantage_types::UserIpInfo;

/// Returns a configurable address without any network access.
pub struct NullLookup {
    ip: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl NullLookup {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: Mutex::new(Some(ip.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    /// A lookup that always fails.
    pub fn failing() -> Self {
        Self {
            ip: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Simulate the caller moving to another network.
    pub fn set_ip(&self, ip: &str) {
        *self.ip.lock().unwrap() = Some(ip.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AddressLookup for NullLookup {
    async fn lookup(&self) -> Result<UserIpInfo, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ip = self.ip.lock().unwrap().clone();
        ip.map(|ip| UserIpInfo {
            ip,
            country: String::new(),
        })
        .ok_or_else(|| ClientError::Lookup("null lookup configured to fail".into()))
    }
}
