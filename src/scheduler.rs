//! Cooperative periodic job scheduler.
//!
//! The scheduler knows intervals and last-run times, nothing else.  When a
//! job is due it calls the [`SchedulerDelegate`], which the controller
//! implements to blink the LEDs or publish telemetry.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  Scheduler (registration order)                      │
//! │    heartbeat      every  5 s                         │
//! │    sensor         every 60 s                         │
//! │    door snapshot  every 60 s                         │
//! └──────────────────────────┬───────────────────────────┘
//!                            │ tick()
//!                            ▼
//!               SchedulerDelegate::on_job_due(job)
//! ```
//!
//! Due jobs run to completion in registration order.  A job's last-run time
//! is stamped after it finishes, whether or not it succeeded; a wake that is
//! several intervals late runs the job once, not once per missed interval.

use log::{info, warn};

use crate::app::ports::SchedulerDelegate;

/// Maximum number of jobs (stack-allocated).
const MAX_JOBS: usize = 4;

/// The periodic duties of the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Blink the liveness LEDs.
    Heartbeat,
    /// Read and publish the environment sensor.
    SensorTelemetry,
    /// Publish the raw door input levels.
    DoorSnapshot,
}

/// One registered job.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub label: &'static str,
    pub job: Job,
    pub interval_ms: u64,
    last_run_ms: u64,
}

/// The scheduler engine.
pub struct Scheduler {
    jobs: heapless::Vec<ScheduledJob, MAX_JOBS>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            jobs: heapless::Vec::new(),
        }
    }

    /// Register `job`.  Its first run is one interval after `now_ms`.
    /// Returns `false` if the table is full.
    pub fn add(&mut self, label: &'static str, job: Job, interval_ms: u64, now_ms: u64) -> bool {
        let entry = ScheduledJob {
            label,
            job,
            interval_ms,
            last_run_ms: now_ms,
        };
        if self.jobs.push(entry).is_err() {
            warn!("Scheduler: table full, '{}' not added", label);
            return false;
        }
        info!("Scheduler: added '{}' every {} ms", label, interval_ms);
        true
    }

    /// Run every due job.  The clock is re-read after each job so a long
    /// job does not make the next one look early.
    pub fn tick(&mut self, delegate: &mut impl SchedulerDelegate) {
        for entry in self.jobs.iter_mut() {
            let now = delegate.now_ms();
            if now.saturating_sub(entry.last_run_ms) < entry.interval_ms {
                continue;
            }
            if let Err(e) = delegate.on_job_due(entry.job) {
                warn!("Scheduler: '{}' failed: {}", entry.label, e);
            }
            entry.last_run_ms = delegate.now_ms();
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
