// courtbook - venue court booking automator
// Library exports

pub mod cli;
pub mod config;
pub mod daemon;
pub mod driver;
pub mod errors;
pub mod journal;
pub mod matrix;
pub mod scheduling;
pub mod selection;
pub mod workflow;
