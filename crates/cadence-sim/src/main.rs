//! Synthetic traffic driver for the cadence dispatcher.
//!
//! Spins up a dispatcher on the real monotonic clock, feeds it randomized
//! flows at every priority, applies downgrade feedback to flow state the
//! way a host stack would, drains egress with an occasional simulated
//! stall, and prints the teardown report as JSON.
//!
//! ```text
//! cadence-sim [--seed N] [--rounds N] [--config path.toml]
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::RngExt as _;
use rand::SeedableRng;

use cadence_core::clock::MonotonicClock;
use cadence_core::config::SchedulerConfig;
use cadence_core::dispatch::{BandAvailability, EnqueueOutcome, PriorityDispatcher};
use cadence_core::packet::Packet;
use cadence_core::rates::MAX_BANDS;

/// Queue depth at which the driver starts shedding backlog, emulating a
/// host queue-length limit.
const BACKLOG_LIMIT: usize = 512;

/// One synthetic traffic source. `priority` is mutable host state: the
/// dispatcher's downgrade notices land here.
struct Flow {
    id: u64,
    priority: u8,
    sent: u64,
    dropped: u64,
    downgraded: bool,
}

/// Availability driven by the simulation loop. At most one band is
/// stalled at a time; the sentinel `usize::MAX` means none. Clones share
/// the same cell, so the loop keeps a handle while the dispatcher owns
/// another.
#[derive(Clone)]
struct SimAvailability {
    stalled: Arc<AtomicUsize>,
}

impl SimAvailability {
    fn new() -> Self {
        SimAvailability {
            stalled: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    fn stall(&self, band: Option<usize>) {
        self.stalled
            .store(band.unwrap_or(usize::MAX), Ordering::Relaxed);
    }
}

impl BandAvailability for SimAvailability {
    fn band_available(&self, band: usize) -> bool {
        self.stalled.load(Ordering::Relaxed) != band
    }
}

fn main() -> Result<()> {
    let mut seed = 7u64;
    let mut rounds = 10_000usize;
    let mut config_path: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                seed = args.next().context("missing --seed value")?.parse()?;
            }
            "--rounds" => {
                rounds = args.next().context("missing --rounds value")?.parse()?;
            }
            "--config" => {
                config_path = Some(args.next().context("missing --config value")?);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    let config = match &config_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {path}"))?;
            SchedulerConfig::from_toml_str(&raw)?
        }
        None => SchedulerConfig::default(),
    };

    // RUST_LOG wins; otherwise the configured verbosity picks the filter.
    let default_filter = match config.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(true)
        .compact()
        .init();

    tracing::info!(seed, rounds, auto_downgrade = config.auto_downgrade, "starting");

    let avail = SimAvailability::new();
    let mut dispatcher =
        PriorityDispatcher::new(&config, MonotonicClock::new(), avail.clone(), 8)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut flows: Vec<Flow> = (0..MAX_BANDS as u64)
        .map(|id| Flow {
            id,
            priority: id as u8,
            sent: 0,
            dropped: 0,
            downgraded: false,
        })
        .collect();

    let mut delivered = 0u64;
    let mut shed_bytes = 0u64;

    for round in 0..rounds {
        let flow = &mut flows[rng.random_range(0..MAX_BANDS)];
        let len = 64 + rng.random_range(0..1200);
        let pkt = Packet::new(Bytes::from(vec![0u8; len]), flow.priority).with_flow(flow.id);

        flow.sent += 1;
        match dispatcher.enqueue(pkt) {
            EnqueueOutcome::Queued {
                reclassify_to: Some(p),
                band,
            } => {
                tracing::debug!(flow = flow.id, band, new_priority = p, "flow downgraded");
                flow.priority = p;
                flow.downgraded = true;
            }
            EnqueueOutcome::Queued { .. } => {}
            EnqueueOutcome::Dropped => flow.dropped += 1,
        }

        // Emulate egress pacing: two service slots per arrival, a
        // rotating single-band stall every few hundred rounds, and a
        // queue-length limit enforced by shedding.
        for _ in 0..2 {
            if dispatcher.dequeue().is_some() {
                delivered += 1;
            }
        }
        while dispatcher.len() > BACKLOG_LIMIT {
            shed_bytes += dispatcher.drop_one() as u64;
        }
        if round % 400 == 0 {
            let stalled = if rng.random::<bool>() {
                Some(rng.random_range(0..MAX_BANDS))
            } else {
                None
            };
            avail.stall(stalled);
        }
    }

    avail.stall(None);
    while dispatcher.dequeue().is_some() {
        delivered += 1;
    }

    for flow in &flows {
        tracing::info!(
            flow = flow.id,
            priority = flow.priority,
            sent = flow.sent,
            dropped = flow.dropped,
            downgraded = flow.downgraded,
            "flow summary"
        );
    }

    let report = dispatcher.teardown();
    tracing::info!(delivered, shed_bytes, drops = report.total_drops, "simulation complete");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
