//! Cooperative rotation/redraw scheduler
//!
//! No timer threads: the main loop calls [`Scheduler::run_pending`] once per
//! iteration and every due job runs synchronously on the caller's thread, in
//! registration order. Each job keeps its own next-due instant, read against
//! an injectable [`Clock`].
//!
//! - A job fires at most once per poll, however many intervals have elapsed
//! - The next due time is computed from the actual fire time
//! - A failing or panicking callback is reported in the [`PollReport`];
//!   remaining due jobs still run
//!
//! A callback that never returns stalls the loop; there are no job timeouts.
//!
//! ```rust
//! use std::rc::Rc;
//! use chrono::TimeDelta;
//! use facewatch::clock::ManualClock;
//! use facewatch::schedule::{Interval, Scheduler};
//!
//! let clock = Rc::new(ManualClock::default());
//! let mut scheduler: Scheduler<u32> = Scheduler::new(clock.clone());
//! scheduler.every("tick", Interval::parse(1, "second")?, |n: &mut u32| {
//!     *n += 1;
//!     Ok(())
//! });
//!
//! let mut ticks = 0;
//! scheduler.run_pending(&mut ticks);
//! assert_eq!(ticks, 0);
//!
//! clock.advance(TimeDelta::seconds(10));
//! scheduler.run_pending(&mut ticks);
//! assert_eq!(ticks, 1);
//! # Ok::<(), facewatch::Error>(())
//! ```

mod period;

pub use period::{Interval, Period};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::{Error, Result};

type JobFn<C> = Box<dyn FnMut(&mut C) -> Result<()>>;

/// Handle to a registered job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(usize);

struct ScheduledJob<C> {
    label: String,
    interval: Interval,
    next_due: DateTime<Local>,
    runs: u64,
    failures: u64,
    callback: JobFn<C>,
}

/// Outcome of one [`Scheduler::run_pending`] call.
#[derive(Debug, Default)]
pub struct PollReport {
    /// Labels of jobs that ran, in run order
    pub fired: Vec<String>,
    /// One `JobFailed` per callback that returned an error
    pub failures: Vec<Error>,
}

impl PollReport {
    /// Whether no job was due.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.fired.is_empty()
    }
}

/// Poll-driven scheduler over a job context `C`.
///
/// Callbacks receive `&mut C`, so jobs and the main loop share state without
/// interior mutability.
pub struct Scheduler<C> {
    clock: Rc<dyn Clock>,
    jobs: Vec<ScheduledJob<C>>,
}

impl<C> Scheduler<C> {
    /// Create a scheduler reading time from `clock`.
    #[must_use]
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            jobs: Vec::new(),
        }
    }

    /// Register a job first due one interval from now.
    pub fn every<F>(&mut self, label: impl Into<String>, interval: Interval, callback: F) -> JobId
    where
        F: FnMut(&mut C) -> Result<()> + 'static,
    {
        let label = label.into();
        let next_due = self.clock.now() + interval.as_delta();
        debug!(job = %label, %interval, %next_due, "Scheduled job");
        self.jobs.push(ScheduledJob {
            label,
            interval,
            next_due,
            runs: 0,
            failures: 0,
            callback: Box::new(callback),
        });
        JobId(self.jobs.len() - 1)
    }

    /// Run every job whose due time has passed.
    pub fn run_pending(&mut self, ctx: &mut C) -> PollReport {
        let mut report = PollReport::default();

        for job in &mut self.jobs {
            let now = self.clock.now();
            if now < job.next_due {
                continue;
            }

            job.next_due = now + job.interval.as_delta();
            job.runs += 1;
            report.fired.push(job.label.clone());

            let callback = &mut job.callback;
            let message = match panic::catch_unwind(AssertUnwindSafe(|| callback(&mut *ctx))) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };
            job.failures += 1;
            warn!(job = %job.label, error = %message, "Scheduled job failed");
            report.failures.push(Error::JobFailed {
                job: job.label.clone(),
                message,
            });
        }

        report
    }

    /// Number of registered jobs.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Next due instant of a job.
    #[must_use]
    pub fn next_due(&self, id: JobId) -> Option<DateTime<Local>> {
        self.jobs.get(id.0).map(|job| job.next_due)
    }

    /// Times a job has run, and how many of those runs failed.
    #[must_use]
    pub fn run_stats(&self, id: JobId) -> Option<(u64, u64)> {
        self.jobs.get(id.0).map(|job| (job.runs, job.failures))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload")
}

impl<C> std::fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field(
                "jobs",
                &self
                    .jobs
                    .iter()
                    .map(|j| (&j.label, j.interval, j.next_due))
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
