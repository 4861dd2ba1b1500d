// Booking workflow
//
// One configurable pipeline drives the site from login to payment. Page
// waits are a `WaitPolicy` choice rather than separate code paths.

mod context;
mod pipeline;
mod selectors;
mod types;
mod wait;

pub use context::{RunContext, StepResult};
pub use pipeline::{ReservationWorkflow, WorkflowSettings};
pub use selectors::PageSelectors;
pub use types::{StepId, WorkflowResult};
pub use wait::{WaitConfig, WaitPolicy};
