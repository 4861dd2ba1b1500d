// Booking scheduler loop

use anyhow::Result;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{error, info, warn};

use super::clock::{wait_until, Clock};
use super::runner::AttemptRunner;
use super::triggers::ScheduleConfig;
use crate::config::constants::{DEFAULT_INTER_TASK_DELAY_SECS, DEFAULT_RETRY_DELAY_SECS};
use crate::journal::{AttemptRecord, OutcomeJournal};
use crate::matrix::Task;

/// Attempts per task per trigger
pub const ATTEMPTS_PER_TASK: u32 = 2;

/// Delays applied while firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiringPolicy {
    /// Pause before the second attempt of a task
    pub retry_delay: Duration,
    /// Pause between consecutive tasks
    pub inter_task_delay: Duration,
    /// Skip the second attempt once the first has booked
    pub stop_after_success: bool,
}

impl Default for FiringPolicy {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            inter_task_delay: Duration::from_secs(DEFAULT_INTER_TASK_DELAY_SECS),
            stop_after_success: false,
        }
    }
}

/// Per-trigger success count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunTally {
    pub succeeded: usize,
    pub failed: usize,
}

impl RunTally {
    pub fn record(&mut self, success: bool) {
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Waits for each trigger and runs the task list against it
pub struct BookingScheduler<R: AttemptRunner, C: Clock> {
    runner: R,
    clock: C,
    schedule: ScheduleConfig,
    policy: FiringPolicy,
    journal: Option<OutcomeJournal>,
}

impl<R: AttemptRunner, C: Clock> BookingScheduler<R, C> {
    pub fn new(runner: R, clock: C, schedule: ScheduleConfig) -> Self {
        Self {
            runner,
            clock,
            schedule,
            policy: FiringPolicy::default(),
            journal: None,
        }
    }

    pub fn with_policy(mut self, policy: FiringPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_journal(mut self, journal: OutcomeJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    /// Wait for triggers and fire forever; only process termination stops it
    pub async fn run(&self, tasks: &[Task]) -> Result<()> {
        info!(
            "Scheduler started: {} task(s), triggers {}",
            tasks.len(),
            self.schedule
        );

        let mut cumulative = RunTally::default();
        loop {
            let next = self.schedule.next_trigger(self.clock.now());
            info!("Next trigger: {}", next);
            wait_until(&self.clock, next).await;

            let tally = self.fire(tasks).await;
            cumulative.succeeded += tally.succeeded;
            cumulative.failed += tally.failed;
            info!(
                "Trigger {} done: {}/{} task(s) booked (all runs: {}/{})",
                next,
                tally.succeeded,
                tally.total(),
                cumulative.succeeded,
                cumulative.total()
            );
        }
    }

    /// Run every task once, in order, with two attempts each
    pub async fn fire(&self, tasks: &[Task]) -> RunTally {
        let mut tally = RunTally::default();

        for (i, task) in tasks.iter().enumerate() {
            if i > 0 && !self.policy.inter_task_delay.is_zero() {
                self.clock.sleep(self.policy.inter_task_delay).await;
            }
            info!("Booking {}", task);
            let success = self.run_task(task).await;
            tally.record(success);
        }

        tally
    }

    /// A task counts as booked when either attempt succeeded
    async fn run_task(&self, task: &Task) -> bool {
        let mut booked = false;

        for attempt in 1..=ATTEMPTS_PER_TASK {
            if booked && self.policy.stop_after_success {
                break;
            }
            if attempt > 1 {
                info!(
                    task = %task.label(),
                    "Second attempt in {:?}",
                    self.policy.retry_delay
                );
                self.clock.sleep(self.policy.retry_delay).await;
            }

            let record = self.guarded_attempt(task, attempt).await;
            let success = record.success;
            self.journal_record(&record);

            if success {
                info!(task = %task.label(), attempt, "Booked");
                booked = true;
            }
        }

        if !booked {
            warn!(task = %task.label(), "No booking after {} attempts", ATTEMPTS_PER_TASK);
        }
        booked
    }

    /// One attempt with every failure, panics included, turned into a record
    async fn guarded_attempt(&self, task: &Task, attempt: u32) -> AttemptRecord {
        let outcome = AssertUnwindSafe(self.runner.attempt(task, attempt))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => {
                if let Some(kind) = result.error {
                    warn!(
                        task = %task.label(),
                        attempt,
                        step = %result.step_reached,
                        error = %kind,
                        "Attempt failed"
                    );
                }
                AttemptRecord::from_result(task, attempt, &result)
            }
            Ok(Err(e)) => {
                error!(task = %task.label(), attempt, "Attempt aborted: {:#}", e);
                AttemptRecord::aborted(task, attempt, format!("{:#}", e))
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(task = %task.label(), attempt, "Attempt panicked: {}", message);
                AttemptRecord::aborted(task, attempt, format!("panic: {}", message))
            }
        }
    }

    fn journal_record(&self, record: &AttemptRecord) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.log(record) {
                warn!("Failed to write outcome journal: {:#}", e);
            }
        }
    }
}
