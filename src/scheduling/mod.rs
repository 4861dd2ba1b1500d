// Scheduling
//
// Waits for the next configured daily trigger, then books every task in
// order: one fresh session per attempt, two attempts per task at most.

mod clock;
mod runner;
mod scheduler;
mod triggers;

pub use clock::{format_remaining, poll_interval, wait_until, Clock, SystemClock};
pub use runner::{AttemptRunner, SessionRunner};
pub use scheduler::{BookingScheduler, FiringPolicy, RunTally, ATTEMPTS_PER_TASK};
pub use triggers::{ScheduleConfig, TriggerTime, DEFAULT_TRIGGER};
