// Cycle scheduler engine implementation

use crate::errors::TriggerError;
use crate::trigger::{JobTrigger, TriggerSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Configuration for the cycle scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Wall-clock pause between cycles
    pub interval: Duration,
    /// Pause after a failed cycle before the loop resumes
    pub cooldown: Duration,
    /// How often the interval and cooldown sleeps re-check the running flag
    pub poll_granularity: Duration,
    /// Optional bound on a single trigger deploy; `None` means unbounded
    pub trigger_timeout: Option<Duration>,
    /// Whether `start()` begins counting cycles from 1 again
    pub reset_cycle_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2 * 3600),
            cooldown: Duration::from_secs(300),
            poll_granularity: Duration::from_secs(1),
            trigger_timeout: None,
            reset_cycle_on_start: false,
        }
    }
}

/// True when the prediction job is due: even cycles only.
pub fn prediction_due(cycle: u64) -> bool {
    cycle % 2 == 0
}

/// True when the validation job is due: every third cycle.
pub fn validation_due(cycle: u64) -> bool {
    cycle % 3 == 0
}

/// Drives the three batch jobs on a fixed cadence.
///
/// One background task runs the loop; `start()` and `stop()` may be called
/// from any other task. Cancellation is cooperative: the loop polls the
/// running flag during its sleeps, so a stop request is observed within one
/// granularity step, but an in-flight deploy is never interrupted.
pub struct CycleScheduler {
    config: SchedulerConfig,
    triggers: TriggerSet,
    running: Arc<AtomicBool>,
    cycle_count: Arc<AtomicU64>,
    handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl CycleScheduler {
    pub fn new(config: SchedulerConfig, triggers: TriggerSet) -> Self {
        Self {
            config,
            triggers,
            running: Arc::new(AtomicBool::new(false)),
            cycle_count: Arc::new(AtomicU64::new(0)),
            handle: tokio::sync::Mutex::new(None),
        }
    }

    /// Spawn the scheduling loop and return immediately.
    ///
    /// Calling `start()` while the loop is already running is a no-op.
    #[instrument(skip(self))]
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("scheduler already running, ignoring start request");
            return;
        }

        if self.config.reset_cycle_on_start {
            self.cycle_count.store(0, Ordering::SeqCst);
        }

        let config = self.config.clone();
        let triggers = self.triggers.clone();
        let running = Arc::clone(&self.running);
        let cycle_count = Arc::clone(&self.cycle_count);

        let handle = tokio::spawn(run_loop(config, triggers, running, cycle_count));
        *self.handle.lock().await = Some(handle);

        info!(
            interval_seconds = self.config.interval.as_secs(),
            "scheduler started"
        );
    }

    /// Clear the running flag and wait for the loop task to exit.
    ///
    /// Latency is bounded by one poll-granularity step plus any in-flight
    /// deploy. Calling `stop()` on a stopped scheduler is a no-op.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("scheduler already stopped");
            return;
        }

        info!("stopping scheduler");
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "scheduler loop task panicked");
            }
        }

        info!(
            cycles_completed = self.cycle_count.load(Ordering::SeqCst),
            "scheduler stopped"
        );
    }

    /// Number of cycles started since the counter was last reset.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

async fn run_loop(
    config: SchedulerConfig,
    triggers: TriggerSet,
    running: Arc<AtomicBool>,
    cycle_count: Arc<AtomicU64>,
) {
    while running.load(Ordering::Acquire) {
        let cycle = cycle_count.fetch_add(1, Ordering::AcqRel) + 1;
        info!(cycle, "starting cycle");

        match deploy_due_triggers(&triggers, cycle, config.trigger_timeout).await {
            Ok(()) => {
                debug!(
                    cycle,
                    sleep_seconds = config.interval.as_secs(),
                    "cycle complete, sleeping until next cycle"
                );
                interruptible_sleep(config.interval, &running, config.poll_granularity).await;
            }
            Err(e) => {
                // The failed cycle still counts; the next attempt is the
                // next cycle, after the cooldown.
                error!(
                    cycle,
                    error = %e,
                    cooldown_seconds = config.cooldown.as_secs(),
                    "cycle failed, entering cooldown"
                );
                interruptible_sleep(config.cooldown, &running, config.poll_granularity).await;
            }
        }
    }

    info!("scheduler loop exited");
}

/// Deploy every trigger due at `cycle`: enrichment unconditionally,
/// prediction on even cycles, validation on multiples of three.
///
/// The first failure aborts the remainder of the cycle.
pub async fn deploy_due_triggers(
    triggers: &TriggerSet,
    cycle: u64,
    timeout: Option<Duration>,
) -> Result<(), TriggerError> {
    deploy_one(triggers.enrichment.as_ref(), timeout).await?;

    if prediction_due(cycle) {
        deploy_one(triggers.prediction.as_ref(), timeout).await?;
    }

    if validation_due(cycle) {
        deploy_one(triggers.validation.as_ref(), timeout).await?;
    }

    Ok(())
}

async fn deploy_one(
    trigger: &dyn JobTrigger,
    timeout: Option<Duration>,
) -> Result<(), TriggerError> {
    info!(trigger = trigger.name(), "deploying job");

    match timeout {
        Some(limit) => match tokio::time::timeout(limit, trigger.deploy()).await {
            Ok(result) => result,
            Err(_) => Err(TriggerError::Timeout {
                trigger: trigger.name().to_string(),
                seconds: limit.as_secs(),
            }),
        },
        None => trigger.deploy().await,
    }
}

/// Sleep for `total`, re-checking `running` every `granularity` so a stop
/// request never waits out a long interval or cooldown.
async fn interruptible_sleep(total: Duration, running: &AtomicBool, granularity: Duration) {
    let mut remaining = total;
    while !remaining.is_zero() && running.load(Ordering::Acquire) {
        let step = remaining.min(granularity);
        sleep(step).await;
        remaining = remaining.saturating_sub(step);
    }
}
