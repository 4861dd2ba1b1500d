// Reservation matrix
//
// The user declares wanted (court, time slot) pairs in a CSV grid: row 0
// names the courts, column 0 names the time slots, and a "1" flags a cell.
// This module compiles that grid into one `Task` per flagged court.

mod parser;
mod rows;
mod template;

pub use parser::{parse, read_matrix, MatrixRows, Task, FLAG};
pub use rows::RowMapping;
pub use template::{default_courts, write_template, DEFAULT_COURTS, DEFAULT_TIME_SLOTS, TIME_AXIS_LABEL};

use std::path::Path;

use crate::errors::ReservationError;

/// Read, compile and remap a matrix file in one go
pub fn load_tasks(path: &Path, mapping: &RowMapping) -> Result<Vec<Task>, ReservationError> {
    let rows = read_matrix(path)?;
    let tasks = parse(&rows)?;
    mapping.apply(&rows, tasks)
}
