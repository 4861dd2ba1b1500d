// Process lifecycle for the long-running scheduler

mod lifecycle;

pub use lifecycle::{read_pid, RunLock};
