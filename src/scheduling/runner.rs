// Attempt execution seam between the scheduler and the workflow

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::driver::{SessionDriver, SessionFactory};
use crate::matrix::Task;
use crate::workflow::{ReservationWorkflow, WorkflowResult};

/// Runs one reservation attempt for one task.
///
/// `Err` means no pipeline result could be produced at all (for instance the
/// session never opened); pipeline failures are an `Ok` unsuccessful result.
#[async_trait]
pub trait AttemptRunner: Send + Sync {
    async fn attempt(&self, task: &Task, attempt: u32) -> Result<WorkflowResult>;
}

/// Opens a fresh session per attempt, runs the workflow, closes the session
pub struct SessionRunner<F: SessionFactory> {
    factory: F,
    workflow: ReservationWorkflow,
}

impl<F: SessionFactory> SessionRunner<F> {
    pub fn new(factory: F, workflow: ReservationWorkflow) -> Self {
        Self { factory, workflow }
    }

    pub fn workflow(&self) -> &ReservationWorkflow {
        &self.workflow
    }
}

#[async_trait]
impl<F: SessionFactory> AttemptRunner for SessionRunner<F> {
    async fn attempt(&self, task: &Task, attempt: u32) -> Result<WorkflowResult> {
        let driver = self
            .factory
            .open()
            .await
            .context("Failed to open browser session")?;
        debug!(task = %task.label(), attempt, "Session opened");

        let result = self.workflow.run(&driver, task, attempt).await;

        if let Err(e) = driver.close().await {
            warn!(task = %task.label(), attempt, "Failed to close session: {}", e);
        }
        Ok(result)
    }
}
