// Workflow step identifiers and outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ErrorKind;

/// Booking pipeline steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepId {
    Authenticate,
    SelectResourceCategory,
    SelectBranchAndResourceType,
    SelectDateAndMode,
    ClaimSlots,
    AcceptTermsAndReserve,
    FillCompanionInfo,
    CompletePayment,
}

impl StepId {
    pub const ALL: [StepId; 8] = [
        StepId::Authenticate,
        StepId::SelectResourceCategory,
        StepId::SelectBranchAndResourceType,
        StepId::SelectDateAndMode,
        StepId::ClaimSlots,
        StepId::AcceptTermsAndReserve,
        StepId::FillCompanionInfo,
        StepId::CompletePayment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Authenticate => "authenticate",
            StepId::SelectResourceCategory => "select_resource_category",
            StepId::SelectBranchAndResourceType => "select_branch_and_resource_type",
            StepId::SelectDateAndMode => "select_date_and_mode",
            StepId::ClaimSlots => "claim_slots",
            StepId::AcceptTermsAndReserve => "accept_terms_and_reserve",
            StepId::FillCompanionInfo => "fill_companion_info",
            StepId::CompletePayment => "complete_payment",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one pass through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub success: bool,
    /// Last step attempted: the failing step, or `CompletePayment` on success
    pub step_reached: StepId,
    pub error: Option<ErrorKind>,
    /// Court column the slots were claimed on, once `ClaimSlots` has run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl WorkflowResult {
    pub fn completed(column: Option<usize>) -> Self {
        Self {
            success: true,
            step_reached: StepId::CompletePayment,
            error: None,
            column,
        }
    }

    pub fn failed(step: StepId, error: ErrorKind, column: Option<usize>) -> Self {
        Self {
            success: false,
            step_reached: step,
            error: Some(error),
            column,
        }
    }
}
