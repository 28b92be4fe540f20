//! vantage: latency triangulation endpoint and client.

mod config;

use anyhow::{bail, Context};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use vantage_client::{
    FileCacheStore, HttpAddressLookup, HttpTransport, LatencyCache, MeasurementEvent,
    MeasurementObserver, Orchestrator, Triangulator,
};
use vantage_crypto::{TokenCodec, TokenKey};
use vantage_endpoint::{ChallengeServer, ShutdownController};
use vantage_protocol::{verify_entry, EvidenceSet, Freshness};
use vantage_types::{CallerAddr, RegionId, SystemClock, Timestamp};
use vantage_utils::{format_millis, init_logging, LogFormat};

use crate::config::VantageConfig;

#[derive(Parser)]
#[command(name = "vantage", about = "Latency triangulation endpoint and client")]
struct Cli {
    /// Path to a TOML configuration file. CLI flags and env vars
    /// override its values.
    #[arg(long, global = true, env = "VANTAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, global = true, env = "VANTAGE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, global = true, env = "VANTAGE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run a challenge endpoint for one region.
    Serve {
        /// Region this endpoint answers for.
        #[arg(long, env = "VANTAGE_REGION")]
        region: Option<RegionId>,

        /// Listen address.
        #[arg(long, env = "VANTAGE_LISTEN")]
        listen: Option<SocketAddr>,

        /// Shared secret; hashed to the token key.
        #[arg(long, env = "VANTAGE_ENCRYPTION_KEY", hide_env_values = true)]
        encryption_key: String,
    },

    /// Measure (or reuse) this machine's latency fingerprint.
    Measure {
        /// Discard the cached fingerprint and measure again.
        #[arg(long)]
        refresh: bool,

        /// Write the full measurement report as JSON to this file.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Decrypt and check `region;token` entries for a caller address.
    Verify {
        /// Address the entries must be bound to.
        #[arg(long)]
        ip: CallerAddr,

        /// Reject entries whose challenge is older than this.
        #[arg(long)]
        max_age_ms: Option<u64>,

        /// Shared secret; hashed to the token key.
        #[arg(long, env = "VANTAGE_ENCRYPTION_KEY", hide_env_values = true)]
        encryption_key: String,

        #[arg(required = true)]
        entries: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => VantageConfig::from_toml_file(path)?,
        None => VantageConfig::default(),
    };

    let log_format = cli.log_format.unwrap_or(config.log_format);
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_logging(log_format, &log_level);

    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    match cli.command {
        Command::Serve {
            region,
            listen,
            encryption_key,
        } => serve(config, region, listen, &encryption_key).await,
        Command::Measure { refresh, report } => measure(config, refresh, report).await,
        Command::Verify {
            ip,
            max_age_ms,
            encryption_key,
            entries,
        } => verify(ip, max_age_ms, &encryption_key, &entries),
    }
}

fn codec(secret: &str) -> anyhow::Result<TokenCodec> {
    let key = TokenKey::derive(secret).context("encryption key is required")?;
    Ok(TokenCodec::new(key))
}

async fn serve(
    config: VantageConfig,
    region: Option<RegionId>,
    listen: Option<SocketAddr>,
    secret: &str,
) -> anyhow::Result<()> {
    let mut endpoint = config.endpoint;
    if region.is_some() {
        endpoint.region = region;
    }
    if let Some(listen) = listen {
        endpoint.listen_addr = listen;
    }

    let server = ChallengeServer::new(&endpoint, codec(secret)?, Arc::new(SystemClock))?;
    let listener = server.bind().await?;

    let shutdown = ShutdownController::new();
    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    server.serve(listener, shutdown.signalled()).await?;
    tracing::info!("vantage endpoint exited cleanly");
    Ok(())
}

/// Forwards measurement progress to the log.
struct LogObserver;

impl MeasurementObserver for LogObserver {
    fn on_event(&mut self, event: MeasurementEvent) {
        match event {
            MeasurementEvent::Progress(percent) => tracing::debug!(percent, "progress"),
            MeasurementEvent::Activity(activity) => tracing::info!("{activity}"),
            MeasurementEvent::RoundStarted { .. } => {}
            MeasurementEvent::Sample {
                round,
                region,
                latency_ms,
            } => tracing::info!(round, %region, latency = %format_millis(latency_ms), "sample"),
            MeasurementEvent::RegionFailed { round, region, .. } => {
                tracing::info!(round, %region, "no sample")
            }
        }
    }
}

async fn measure(
    config: VantageConfig,
    refresh: bool,
    report_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let regions = config.measurement_regions()?.to_vec();
    let lookup = HttpAddressLookup::new(config.address_lookup_url()?, &config.client)?;
    let orchestrator = Orchestrator::new(HttpTransport::new(&config.client)?, regions)
        .with_rounds(config.client.rounds)
        .with_round_delay(config.client.round_delay());
    let cache = LatencyCache::new(FileCacheStore::new(&config.client.cache_path));

    let triangulator = Triangulator::new(orchestrator, lookup, cache);
    let result = triangulator.run(refresh, &mut LogObserver).await?;

    if result.latency_tokens.is_empty() {
        tracing::warn!("no region produced a sample; no latency evidence available");
    }
    if let Some(path) = report_path {
        match &result.report {
            Some(report) => {
                let json = serde_json::to_string_pretty(report)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                tracing::info!("report written to {}", path.display());
            }
            None => tracing::warn!("fingerprint served from cache; use --refresh to produce a report"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&result.latency_tokens)?);
    Ok(())
}

fn verify(
    ip: CallerAddr,
    max_age_ms: Option<u64>,
    secret: &str,
    entries: &[String],
) -> anyhow::Result<()> {
    let codec = codec(secret)?;
    let now = Timestamp::now();

    for entry in entries {
        let checked = verify_entry(&codec, entry, &ip).and_then(|evidence| {
            if let Some(max_age_ms) = max_age_ms {
                evidence.check_age(now, max_age_ms)?;
            }
            Ok(evidence)
        });
        match checked {
            Ok(evidence) => println!(
                "ok\t{}\t{}\tissued {}",
                evidence.region,
                format_millis(evidence.latency_ms),
                evidence.issued_at
            ),
            Err(e) => println!("invalid\t{e}"),
        }
    }

    let freshness = max_age_ms.map(|max_age_ms| Freshness { now, max_age_ms });
    let set = EvidenceSet::collect(&codec, entries.iter().map(String::as_str), &ip, freshness);
    if set.is_empty() {
        bail!("no valid latency evidence for {ip}");
    }
    println!("{} region(s) verified for {ip}", set.len());
    Ok(())
}
