//! Timer-firing state machine with overrun detection.

use serde::Serialize;

use super::messages::Priority;
use super::sampler::{MonitorContext, Sampler};
use super::source::MetricSource;
use super::users::UserLookup;

/// Message queued when a pass outlasts the update period.
pub const OVERRUN_MESSAGE: &str = "Delay too short!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Idle,
    Sampling,
    /// The last pass overran; the next firing is dropped.
    Skipping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Sampled,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct UpdateScheduler {
    state: SchedulerState,
    skip: u32,
    overruns: u64,
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            skip: 0,
            overruns: 0,
        }
    }

    /// Handle one timer firing.
    ///
    /// `pending` is asked right after the pass whether another firing is
    /// already due. If so the pass is taken to have overrun and the next
    /// firing returns without touching any source. The check is racy: a
    /// firing landing after the probe goes unnoticed.
    pub fn fire<S, U, P>(
        &mut self,
        sampler: &mut Sampler<S, U>,
        ctx: &mut MonitorContext,
        pending: P,
    ) -> FireOutcome
    where
        S: MetricSource,
        U: UserLookup,
        P: FnOnce() -> bool,
    {
        if self.skip > 0 {
            self.skip -= 1;
            self.state = SchedulerState::Idle;
            log::debug!("Skipping update after overrun");
            return FireOutcome::Skipped;
        }

        self.state = SchedulerState::Sampling;
        sampler.pass(ctx);

        if pending() {
            self.skip += 1;
            self.overruns += 1;
            self.state = SchedulerState::Skipping;
            ctx.messages.push(Priority::Max, OVERRUN_MESSAGE);
        } else {
            self.state = SchedulerState::Idle;
        }
        FireOutcome::Sampled
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}
