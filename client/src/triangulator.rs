//! Address lookup, cache and measurement wired into one call.

use vantage_types::{CallerAddr, TriangulationReport, UserIpInfo};

use crate::{
    AddressLookup, CacheStore, ChallengeTransport, ClientError, LatencyCache,
    MeasurementObserver, Orchestrator,
};

/// Result of [`Triangulator::run`].
#[derive(Clone, Debug)]
pub struct Triangulation {
    pub user_ip_info: UserIpInfo,
    /// `region;token` strings for vote submission. Empty means no latency
    /// evidence is available.
    pub latency_tokens: Vec<String>,
    /// The full measurement record; `None` when served from cache.
    pub report: Option<TriangulationReport>,
}

impl Triangulation {
    pub fn from_cache(&self) -> bool {
        self.report.is_none()
    }
}

pub struct Triangulator<T, L, S> {
    orchestrator: Orchestrator<T>,
    lookup: L,
    cache: LatencyCache<S>,
}

impl<T, L, S> Triangulator<T, L, S>
where
    T: ChallengeTransport,
    L: AddressLookup,
    S: CacheStore,
{
    pub fn new(orchestrator: Orchestrator<T>, lookup: L, cache: LatencyCache<S>) -> Self {
        Self {
            orchestrator,
            lookup,
            cache,
        }
    }

    pub fn cache(&self) -> &LatencyCache<S> {
        &self.cache
    }

    pub fn orchestrator(&self) -> &Orchestrator<T> {
        &self.orchestrator
    }

    /// Resolve the public address, then return cached tokens for it or
    /// measure afresh. `refresh` discards the cache first.
    pub async fn run<O: MeasurementObserver>(
        &self,
        refresh: bool,
        observer: &mut O,
    ) -> Result<Triangulation, ClientError> {
        let user_ip_info = self.lookup.lookup().await?;
        let addr = user_ip_info
            .ip
            .parse::<CallerAddr>()
            .map_err(|e| ClientError::Lookup(e.to_string()))?;

        if refresh {
            self.cache.invalidate()?;
        }

        let fingerprint = self
            .cache
            .get_or_measure(&addr, &self.orchestrator, observer)
            .await?;
        let report = fingerprint.measured_rounds.map(|measurement_rounds| {
            tracing::info!(
                %addr,
                regions = fingerprint.latency_tokens.len(),
                "latency fingerprint measured"
            );
            TriangulationReport {
                user_ip_info: user_ip_info.clone(),
                measurement_rounds,
                possible_countries: Vec::new(),
            }
        });

        Ok(Triangulation {
            user_ip_info,
            latency_tokens: fingerprint.latency_tokens,
            report,
        })
    }
}
