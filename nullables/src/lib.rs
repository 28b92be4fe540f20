//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the client and endpoint (clock, challenge
//! transport, cache storage, address lookup) sits behind a trait. The types
//! here implement those traits with values that:
//! - are deterministic
//! - can be scripted and inspected programmatically
//! - never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod cache;
pub mod clock;
pub mod lookup;
pub mod transport;

pub use cache::NullCacheStore;
pub use clock::NullClock;
pub use lookup::NullLookup;
pub use transport::{NullTransport, Scripted};
