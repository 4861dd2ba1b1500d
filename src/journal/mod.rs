// Outcome journal
// One JSON line per reservation attempt, one file per day

mod logger;
mod types;

pub use logger::{summarize, OutcomeJournal};
pub use types::{AttemptRecord, DaySummary, TaskSummary};
