// Per-attempt state threaded through the pipeline

use tracing::warn;

use super::types::StepId;
use super::wait::WaitPolicy;
use crate::driver::{DriverError, SessionDriver};
use crate::errors::ErrorKind;
use crate::matrix::Task;

/// Outcome of a single step
pub type StepResult = Result<(), ErrorKind>;

/// Everything one pass through the pipeline needs, scoped to that pass.
///
/// The driver session belongs to the caller; the context only borrows it.
pub struct RunContext<'a, D: SessionDriver> {
    pub driver: &'a D,
    pub task: &'a Task,
    pub attempt: u32,
    wait: WaitPolicy,
    step: StepId,
    claimed_column: Option<usize>,
    settles: usize,
}

impl<'a, D: SessionDriver> RunContext<'a, D> {
    pub fn new(driver: &'a D, task: &'a Task, attempt: u32, wait: WaitPolicy) -> Self {
        Self {
            driver,
            task,
            attempt,
            wait,
            step: StepId::Authenticate,
            claimed_column: None,
            settles: 0,
        }
    }

    pub fn step(&self) -> StepId {
        self.step
    }

    pub(crate) fn enter(&mut self, step: StepId) {
        self.step = step;
    }

    /// Column touched by the claim phase (fully or partially)
    pub fn claimed_column(&self) -> Option<usize> {
        self.claimed_column
    }

    pub(crate) fn record_claim(&mut self, column: usize) {
        self.claimed_column = Some(column);
    }

    /// Number of page settles performed so far
    pub fn settles(&self) -> usize {
        self.settles
    }

    /// Convert a driver failure into the current step's error kind
    pub fn fail(&self, error: DriverError) -> ErrorKind {
        warn!(
            task = %self.task.label(),
            attempt = self.attempt,
            step = %self.step,
            "{}",
            error
        );
        error.kind()
    }

    pub async fn click(&self, selector: &str) -> StepResult {
        self.driver.click(selector).await.map_err(|e| self.fail(e))
    }

    pub async fn fill(&self, selector: &str, value: &str) -> StepResult {
        self.driver
            .fill(selector, value)
            .await
            .map_err(|e| self.fail(e))
    }

    /// Wait for the page to settle before acting on `next`
    pub async fn settle(&mut self, next: Option<&str>) -> StepResult {
        self.settles += 1;
        self.wait
            .settle(self.driver, next)
            .await
            .map_err(|e| self.fail(e))
    }
}
