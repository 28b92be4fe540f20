//! Fundamental types for latency triangulation.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! millisecond timestamps and clocks, measurement regions, caller addresses, and
//! the per-round measurement records that make up a triangulation report.

pub mod address;
pub mod error;
pub mod measurement;
pub mod region;
pub mod time;

pub use address::CallerAddr;
pub use error::TypesError;
pub use measurement::{
    MeasurementRound, RegionMeasurement, RegionOutcome, TriangulationReport, UserIpInfo,
};
pub use region::{validate_regions, Region, RegionId};
pub use time::{Clock, SystemClock, Timestamp};
