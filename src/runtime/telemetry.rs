use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Default interval used by the metrics reporter task.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(5);

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back
/// to `info`. Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Lightweight rolling counters used to derive worker runtime metrics.
#[derive(Default, Debug)]
pub struct Telemetry {
    executions: AtomicU64,
    execution_failures: AtomicU64,
    resolver_builds: AtomicU64,
    resolver_cache_hits: AtomicU64,
    preseeded_resolvers: AtomicU64,
    preseed_failures: AtomicU64,
}

impl Telemetry {
    pub fn record_execution(&self) {
        self.executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_execution_failure(&self) {
        self.execution_failures.fetch_add(1, Ordering::Relaxed);
        self.executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resolver_build(&self) {
        self.resolver_builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resolver_cache_hit(&self) {
        self.resolver_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_preseeded_resolver(&self) {
        self.preseeded_resolvers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_preseed_failure(&self) {
        self.preseed_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            executions: self.executions.load(Ordering::Relaxed),
            execution_failures: self.execution_failures.load(Ordering::Relaxed),
            resolver_builds: self.resolver_builds.load(Ordering::Relaxed),
            resolver_cache_hits: self.resolver_cache_hits.load(Ordering::Relaxed),
            preseeded_resolvers: self.preseeded_resolvers.load(Ordering::Relaxed),
            preseed_failures: self.preseed_failures.load(Ordering::Relaxed),
        }
    }

    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }

    pub fn execution_failures(&self) -> u64 {
        self.execution_failures.load(Ordering::Relaxed)
    }

    pub fn resolver_builds(&self) -> u64 {
        self.resolver_builds.load(Ordering::Relaxed)
    }

    pub fn resolver_cache_hits(&self) -> u64 {
        self.resolver_cache_hits.load(Ordering::Relaxed)
    }

    pub fn preseeded_resolvers(&self) -> u64 {
        self.preseeded_resolvers.load(Ordering::Relaxed)
    }

    pub fn preseed_failures(&self) -> u64 {
        self.preseed_failures.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TelemetrySnapshot {
    pub executions: u64,
    pub execution_failures: u64,
    pub resolver_builds: u64,
    pub resolver_cache_hits: u64,
    pub preseeded_resolvers: u64,
    pub preseed_failures: u64,
}

/// Spawns a background task that periodically logs execution throughput,
/// failure counts, and resolver cache activity.
pub fn spawn_metrics_reporter(
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_snapshot = telemetry.snapshot();
        let mut last_tick = Instant::now();

        loop {
            select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(target: "testrig::metrics", "metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let current_snapshot = telemetry.snapshot();
                    let executed_delta = current_snapshot
                        .executions
                        .saturating_sub(last_snapshot.executions);
                    let elapsed = last_tick.elapsed().as_secs_f64();
                    let throughput = if elapsed <= f64::EPSILON {
                        0.0
                    } else {
                        executed_delta as f64 / elapsed
                    };

                    tracing::info!(
                        target: "testrig::metrics",
                        throughput = format!("{throughput:.2}"),
                        executions = current_snapshot.executions,
                        execution_failures = current_snapshot.execution_failures,
                        resolver_builds = current_snapshot.resolver_builds,
                        resolver_cache_hits = current_snapshot.resolver_cache_hits,
                        preseeded_resolvers = current_snapshot.preseeded_resolvers,
                        preseed_failures = current_snapshot.preseed_failures,
                        "worker metrics snapshot"
                    );

                    last_snapshot = current_snapshot;
                    last_tick = Instant::now();
                }
            }
        }
    })
}
