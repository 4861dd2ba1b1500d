// Journal record types

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::errors::ErrorKind;
use crate::matrix::Task;
use crate::workflow::{StepId, WorkflowResult};

/// One reservation attempt, as written to the daily JSONL file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub timestamp: DateTime<Local>,
    pub task: String,
    pub column: usize,
    pub rows: Vec<usize>,
    pub attempt: u32,
    pub success: bool,
    pub step_reached: Option<StepId>,
    pub error: Option<ErrorKind>,
    /// Grid column touched by the claim phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_column: Option<usize>,
    /// Failures outside the pipeline (session open, panic)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AttemptRecord {
    fn base(task: &Task, attempt: u32) -> Self {
        Self {
            timestamp: Local::now(),
            task: task.label().to_string(),
            column: task.resource_column(),
            rows: task.desired_rows().iter().copied().collect(),
            attempt,
            success: false,
            step_reached: None,
            error: None,
            claimed_column: None,
            detail: None,
        }
    }

    pub fn from_result(task: &Task, attempt: u32, result: &WorkflowResult) -> Self {
        Self {
            success: result.success,
            step_reached: Some(result.step_reached),
            error: result.error,
            claimed_column: result.column,
            ..Self::base(task, attempt)
        }
    }

    /// An attempt that never produced a pipeline result
    pub fn aborted(task: &Task, attempt: u32, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::base(task, attempt)
        }
    }
}

/// Best outcome for one task over a day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSummary {
    pub task: String,
    pub attempts: usize,
    pub succeeded: bool,
    /// Furthest step reached by any failed attempt
    pub furthest_step: Option<StepId>,
    pub last_error: Option<ErrorKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DaySummary {
    pub attempts: usize,
    pub successes: usize,
    pub tasks: Vec<TaskSummary>,
}
