//! Background runtime that drives the sampler on a timer.
//!
//! The sampler runs on a dedicated single-worker Tokio runtime. The shared
//! [`MonitorContext`] sits behind a mutex; the sampler holds it for a whole
//! pass, and the screen holds it (the "mask") only while copying state out.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::error::{MonitorError, Result};

use super::sampler::{MonitorContext, Sampler};
use super::scheduler::{FireOutcome, UpdateScheduler};
use super::source::MetricSource;
use super::users::UserLookup;

const WARMUP_SPACING: Duration = Duration::from_secs(1);

/// Held while the consumer reads shared state; no pass runs meanwhile.
pub type MaskGuard<'a> = MutexGuard<'a, MonitorContext>;

pub struct SamplerRuntime {
    context: Arc<Mutex<MonitorContext>>,
    period_tx: watch::Sender<Duration>,
    shutdown_tx: broadcast::Sender<()>,
    runtime: tokio::runtime::Runtime,
}

/// Check that `secs` is usable as an update period.
pub fn period_from_secs(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(MonitorError::InvalidPeriod(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| MonitorError::InvalidPeriod(secs))
}

impl SamplerRuntime {
    /// Spawn the sampler task. `warmup_passes` passes run one second apart
    /// before the periodic timer is armed.
    pub fn start<S, U>(
        sampler: Sampler<S, U>,
        context: MonitorContext,
        period: Duration,
        warmup_passes: u32,
    ) -> Result<Self>
    where
        S: MetricSource + Send + 'static,
        U: UserLookup + Send + 'static,
    {
        if period.is_zero() {
            return Err(MonitorError::InvalidPeriod(0.0));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .thread_name("sampler")
            .build()
            .map_err(|e| MonitorError::runtime(e.to_string()))?;

        let context = Arc::new(Mutex::new(context));
        let (period_tx, period_rx) = watch::channel(period);
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

        runtime.spawn(sampler_task(
            sampler,
            Arc::clone(&context),
            period_rx,
            shutdown_rx,
            warmup_passes,
        ));
        log::info!("Sampler started, period {:.1}s", period.as_secs_f64());

        Ok(Self {
            context,
            period_tx,
            shutdown_tx,
            runtime,
        })
    }

    /// Block sampling and borrow the shared state.
    pub fn mask(&self) -> MaskGuard<'_> {
        self.context.lock()
    }

    pub fn period(&self) -> Duration {
        *self.period_tx.borrow()
    }

    /// Re-arm the timer. Decay history is kept.
    pub fn set_period(&self, period: Duration) -> Result<()> {
        if period.is_zero() {
            return Err(MonitorError::InvalidPeriod(0.0));
        }
        self.period_tx
            .send(period)
            .map_err(|_| MonitorError::runtime("sampler task is not running"))?;
        log::info!("Update period set to {:.1}s", period.as_secs_f64());
        Ok(())
    }

    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        self.runtime.shutdown_timeout(Duration::from_millis(500));
        log::debug!("Sampler stopped");
    }
}

fn arm_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Deadline of the tick after one that was scheduled for `fired` and
/// observed at `polled`. A late tick pushes the schedule back under
/// `MissedTickBehavior::Delay`.
fn next_deadline(fired: Instant, polled: Instant, period: Duration) -> Instant {
    fired.max(polled) + period
}

async fn sampler_task<S, U>(
    mut sampler: Sampler<S, U>,
    context: Arc<Mutex<MonitorContext>>,
    mut period_rx: watch::Receiver<Duration>,
    mut shutdown: broadcast::Receiver<()>,
    warmup_passes: u32,
) where
    S: MetricSource,
    U: UserLookup,
{
    for _ in 0..warmup_passes {
        sampler.pass(&mut context.lock());
        tokio::select! {
            _ = tokio::time::sleep(WARMUP_SPACING) => {}
            _ = shutdown.recv() => return,
        }
    }

    let mut scheduler = UpdateScheduler::new();
    let mut period = *period_rx.borrow_and_update();
    let mut ticker = arm_ticker(period);

    loop {
        tokio::select! {
            fired = ticker.tick() => {
                let next_due = next_deadline(fired, Instant::now(), period);
                let outcome = scheduler.fire(&mut sampler, &mut context.lock(), || Instant::now() >= next_due);
                if outcome == FireOutcome::Skipped {
                    log::warn!("Update skipped, {} overruns so far", scheduler.overruns());
                }
            }
            changed = period_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                period = *period_rx.borrow_and_update();
                ticker = arm_ticker(period);
            }
            _ = shutdown.recv() => break,
        }
    }
}
