//! Nullable challenge transport: scripted endpoint behaviour.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use vantage_client::{ChallengeTransport, ClientError};
use vantage_protocol::ChallengeResponse;
use vantage_types::{Region, RegionId};

/// What a region does for one TOTP1/TOTP2 exchange.
#[derive(Clone, Debug)]
pub enum Scripted {
    /// Answer with this endpoint-side raw latency in milliseconds.
    Raw(u64),
    /// Refuse the first request.
    Fail,
    /// Answer the second request with this literal body.
    Body(String),
}

impl Scripted {
    /// Answer so the client derives `one_way_ms` (raw = 2 × one-way).
    pub fn one_way(one_way_ms: u64) -> Self {
        Self::Raw(one_way_ms * 2)
    }
}

/// A [`ChallengeTransport`] that replays scripted exchanges per region.
///
/// Each exchange consumes the next [`Scripted`] item for its region; an
/// exhausted script behaves like an unreachable endpoint. Tokens are
/// `null-<region>-<n>` where `n` counts that region's exchanges from 1.
#[derive(Default)]
pub struct NullTransport {
    scripts: Mutex<HashMap<RegionId, VecDeque<Scripted>>>,
    in_flight: Mutex<HashMap<String, Scripted>>,
    delays: HashMap<RegionId, Duration>,
    exchanges: Mutex<HashMap<RegionId, usize>>,
    warm_ups: AtomicUsize,
    first_requests: AtomicUsize,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `steps` for `region`, one per exchange.
    pub fn script(self, region: &str, steps: impl IntoIterator<Item = Scripted>) -> Self {
        let id = region_id(region);
        self.scripts
            .lock()
            .unwrap()
            .entry(id)
            .or_default()
            .extend(steps);
        self
    }

    /// Delay the second response for `region`, to reorder completions.
    pub fn with_delay(mut self, region: &str, delay: Duration) -> Self {
        self.delays.insert(region_id(region), delay);
        self
    }

    pub fn warm_ups(&self) -> usize {
        self.warm_ups.load(Ordering::SeqCst)
    }

    /// Number of TOTP1 requests across all regions.
    pub fn first_requests(&self) -> usize {
        self.first_requests.load(Ordering::SeqCst)
    }

    /// Exchanges started for `region`.
    pub fn exchanges(&self, region: &str) -> usize {
        self.exchanges
            .lock()
            .unwrap()
            .get(&region_id(region))
            .copied()
            .unwrap_or(0)
    }
}

fn region_id(region: &str) -> RegionId {
    RegionId::new(region).unwrap()
}

impl ChallengeTransport for NullTransport {
    async fn warm_up(&self, _region: &Region) -> Result<(), ClientError> {
        self.warm_ups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn request_first(&self, region: &Region) -> Result<String, ClientError> {
        self.first_requests.fetch_add(1, Ordering::SeqCst);
        let n = {
            let mut exchanges = self.exchanges.lock().unwrap();
            let n = exchanges.entry(region.id.clone()).or_default();
            *n += 1;
            *n
        };
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&region.id)
            .and_then(VecDeque::pop_front);

        match step {
            None | Some(Scripted::Fail) => Err(ClientError::Unreachable(format!(
                "null endpoint {} refused exchange {n}",
                region.id
            ))),
            Some(step) => {
                let token = format!("null-{}-{n}", region.id);
                self.in_flight.lock().unwrap().insert(token.clone(), step);
                Ok(token)
            }
        }
    }

    async fn request_second(&self, region: &Region, totp1: &str) -> Result<String, ClientError> {
        if let Some(delay) = self.delays.get(&region.id) {
            tokio::time::sleep(*delay).await;
        }
        let step = self.in_flight.lock().unwrap().remove(totp1);
        match step {
            Some(Scripted::Raw(raw_latency_ms)) => Ok(ChallengeResponse {
                region: region.id.clone(),
                token: format!("{totp1}-answer"),
                raw_latency_ms,
            }
            .to_string()),
            Some(Scripted::Body(body)) => Ok(body),
            Some(Scripted::Fail) | None => Err(ClientError::Status(400)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: &str) -> Region {
        Region::new(region_id(id), id, "http://null.invalid/")
    }

    #[tokio::test]
    async fn replays_script_in_order() {
        let transport = NullTransport::new().script("a", [Scripted::Raw(10), Scripted::Fail]);
        let a = region("a");

        let totp1 = transport.request_first(&a).await.unwrap();
        assert_eq!(totp1, "null-a-1");
        let body = transport.request_second(&a, &totp1).await.unwrap();
        assert_eq!(body, "a;null-a-1-answer;10");

        assert!(transport.request_first(&a).await.is_err());
        assert!(transport.request_first(&a).await.is_err());
        assert_eq!(transport.exchanges("a"), 3);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let transport = NullTransport::new();
        assert!(matches!(
            transport.request_second(&region("a"), "forged").await,
            Err(ClientError::Status(400))
        ));
    }
}
