//! Round-based latency measurement.
//!
//! Rounds run strictly one after another. Within a round every region's
//! TOTP1 → TOTP2 exchange runs concurrently, and the round completes only
//! when all of them have settled. A failing region produces a
//! [`RegionOutcome::Failed`] record for that round and nothing else.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;

use vantage_protocol::ChallengeResponse;
use vantage_types::{
    Clock, MeasurementRound, Region, RegionId, RegionMeasurement, RegionOutcome, SystemClock,
};

use crate::{ChallengeTransport, ClientError};

pub const DEFAULT_ROUNDS: u32 = 3;

/// Pause before every round after the first.
pub const DEFAULT_ROUND_DELAY: Duration = Duration::from_millis(800);

/// Progress notifications emitted while a run is in flight.
#[derive(Clone, Debug, PartialEq)]
pub enum MeasurementEvent {
    /// Coarse completion percentage, reported before each round starts.
    Progress(f64),
    /// Human-readable status line.
    Activity(String),
    RoundStarted { round: u32 },
    Sample {
        round: u32,
        region: RegionId,
        latency_ms: f64,
    },
    RegionFailed {
        round: u32,
        region: RegionId,
        reason: String,
    },
}

/// Receives [`MeasurementEvent`]s. Called only from the orchestrating task.
pub trait MeasurementObserver: Send {
    fn on_event(&mut self, event: MeasurementEvent);
}

impl MeasurementObserver for () {
    fn on_event(&mut self, _event: MeasurementEvent) {}
}

impl MeasurementObserver for Vec<MeasurementEvent> {
    fn on_event(&mut self, event: MeasurementEvent) {
        self.push(event);
    }
}

impl MeasurementObserver for mpsc::UnboundedSender<MeasurementEvent> {
    fn on_event(&mut self, event: MeasurementEvent) {
        let _ = self.send(event);
    }
}

pub struct Orchestrator<T> {
    transport: T,
    regions: Vec<Region>,
    rounds: u32,
    round_delay: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: ChallengeTransport> Orchestrator<T> {
    pub fn new(transport: T, regions: Vec<Region>) -> Self {
        Self {
            transport,
            regions,
            rounds: DEFAULT_ROUNDS,
            round_delay: DEFAULT_ROUND_DELAY,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_round_delay(mut self, delay: Duration) -> Self {
        self.round_delay = delay;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run every round and return them in order.
    pub async fn run<O: MeasurementObserver>(&self, observer: &mut O) -> Vec<MeasurementRound> {
        let total = self.rounds;
        let mut rounds = Vec::with_capacity(total as usize);

        for index in 0..total {
            let round_number = index + 1;

            if index == 0 {
                observer.on_event(MeasurementEvent::Activity("Warming up connections...".into()));
                self.warm_up().await;
            }

            observer.on_event(MeasurementEvent::Progress(
                f64::from(index) * 100.0 / f64::from(total),
            ));

            if index > 0 {
                observer.on_event(MeasurementEvent::Activity(format!(
                    "Waiting between measurement rounds ({round_number}/{total})..."
                )));
                tokio::time::sleep(self.round_delay).await;
            }

            observer.on_event(MeasurementEvent::Activity(format!(
                "Running measurement round {round_number}/{total}"
            )));
            observer.on_event(MeasurementEvent::RoundStarted {
                round: round_number,
            });

            let round = self.run_round(round_number, observer).await;
            tracing::info!(
                round = round_number,
                measured = round.measurements().count(),
                failed = round.failed_regions().count(),
                "measurement round complete"
            );
            rounds.push(round);
        }

        rounds
    }

    async fn warm_up(&self) {
        let results = join_all(self.regions.iter().map(|r| self.transport.warm_up(r))).await;
        for (region, result) in self.regions.iter().zip(results) {
            if let Err(e) = result {
                tracing::debug!(region = %region.id, error = %e, "warm-up failed");
            }
        }
    }

    async fn run_round<O: MeasurementObserver>(
        &self,
        round_number: u32,
        observer: &mut O,
    ) -> MeasurementRound {
        let mut pending: FuturesUnordered<_> = self
            .regions
            .iter()
            .enumerate()
            .map(|(index, region)| async move { (index, self.measure_region(region).await) })
            .collect();

        let mut slots: Vec<Option<RegionOutcome>> = vec![None; self.regions.len()];
        while let Some((index, result)) = pending.next().await {
            let region = &self.regions[index];
            let outcome = match result {
                Ok(measurement) => {
                    observer.on_event(MeasurementEvent::Sample {
                        round: round_number,
                        region: region.id.clone(),
                        latency_ms: measurement.latency_ms,
                    });
                    RegionOutcome::Measured(measurement)
                }
                Err(e) => {
                    tracing::warn!(round = round_number, region = %region.id, error = %e, "region measurement failed");
                    observer.on_event(MeasurementEvent::RegionFailed {
                        round: round_number,
                        region: region.id.clone(),
                        reason: e.to_string(),
                    });
                    RegionOutcome::Failed {
                        region: region.id.clone(),
                        reason: e.to_string(),
                    }
                }
            };
            slots[index] = Some(outcome);
        }

        MeasurementRound {
            round_number,
            outcomes: slots.into_iter().flatten().collect(),
        }
    }

    async fn measure_region(&self, region: &Region) -> Result<RegionMeasurement, ClientError> {
        let client_send_time = self.clock.now();
        let totp1 = self.transport.request_first(region).await?;
        let body = self.transport.request_second(region, &totp1).await?;
        let client_receive_time = self.clock.now();

        let response = body
            .parse::<ChallengeResponse>()
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        if response.region != region.id {
            return Err(ClientError::InvalidResponse(format!(
                "expected region {}, response names {}",
                region.id, response.region
            )));
        }

        Ok(RegionMeasurement {
            region: region.id.clone(),
            client_send_time,
            client_receive_time,
            latency_ms: response.raw_latency_ms as f64 / 2.0,
            raw_latency_ms: response.raw_latency_ms,
            token: response.token,
        })
    }
}
