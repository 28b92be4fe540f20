//! Client side of latency triangulation.
//!
//! The [`Orchestrator`] runs a fixed number of sequential rounds, each one a
//! concurrent TOTP1/TOTP2 exchange with every configured region. The
//! [`Fingerprint`] keeps the lowest-latency token per region, and the
//! [`LatencyCache`] reuses the last fingerprint while the caller's public
//! address is unchanged.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod lookup;
pub mod orchestrator;
pub mod transport;
pub mod triangulator;

pub use aggregate::Fingerprint;
pub use cache::{CacheEntry, CacheStore, CachedFingerprint, FileCacheStore, LatencyCache};
pub use config::ClientConfig;
pub use error::ClientError;
pub use lookup::{AddressLookup, HttpAddressLookup};
pub use orchestrator::{
    MeasurementEvent, MeasurementObserver, Orchestrator, DEFAULT_ROUNDS, DEFAULT_ROUND_DELAY,
};
pub use transport::{ChallengeTransport, HttpTransport};
pub use triangulator::{Triangulation, Triangulator};
