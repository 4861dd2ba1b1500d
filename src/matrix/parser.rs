// Matrix → task compiler

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::ReservationError;

/// Cell value marking a wanted slot
pub const FLAG: &str = "1";

/// Raw matrix cells, row-major, as read from disk
pub type MatrixRows = Vec<Vec<String>>;

/// One unit of booking work: a court column plus the time-slot rows wanted on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    resource_column: usize,
    desired_rows: BTreeSet<usize>,
    label: String,
}

impl Task {
    /// Build a task; `None` when no rows are given
    pub fn new(
        resource_column: usize,
        desired_rows: impl IntoIterator<Item = usize>,
        label: impl Into<String>,
    ) -> Option<Self> {
        let desired_rows: BTreeSet<usize> = desired_rows.into_iter().collect();
        if desired_rows.is_empty() {
            return None;
        }
        Some(Self {
            resource_column,
            desired_rows,
            label: label.into(),
        })
    }

    /// Matrix column (1-based, column 0 is the time axis)
    pub fn resource_column(&self) -> usize {
        self.resource_column
    }

    /// Wanted rows, ascending and unique
    pub fn desired_rows(&self) -> &BTreeSet<usize> {
        &self.desired_rows
    }

    /// Court label from the matrix header
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn with_rows(&self, desired_rows: BTreeSet<usize>) -> Self {
        Self {
            resource_column: self.resource_column,
            desired_rows,
            label: self.label.clone(),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<String> = self.desired_rows.iter().map(|r| r.to_string()).collect();
        write!(
            f,
            "{} (column {}, rows {})",
            self.label,
            self.resource_column,
            rows.join(",")
        )
    }
}

/// Compile matrix rows into tasks, one per court column with at least one flag.
///
/// Row indices are the matrix's own (header is row 0); they are not renumbered
/// here. See `RowMapping` for translation to live grid rows.
pub fn parse(rows: &[Vec<String>]) -> Result<Vec<Task>, ReservationError> {
    if rows.len() < 2 {
        return Err(ReservationError::Format(format!(
            "need a header row and at least one data row, found {} row(s)",
            rows.len()
        )));
    }

    let header = &rows[0];
    let mut tasks = Vec::new();

    for column in 1..header.len() {
        let flagged = rows
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, row)| row.get(column).map(|cell| cell.trim()) == Some(FLAG))
            .map(|(index, _)| index);

        if let Some(task) = Task::new(column, flagged, header[column].trim()) {
            debug!(task = %task, "Compiled reservation task");
            tasks.push(task);
        }
    }

    info!("Compiled {} reservation task(s) from matrix", tasks.len());
    Ok(tasks)
}

/// Read a matrix CSV file without header handling
pub fn read_matrix(path: &Path) -> Result<MatrixRows, ReservationError> {
    let format_error =
        |e: csv::Error| ReservationError::Format(format!("{}: {}", path.display(), e));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(format_error)?;

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(format_error)
        })
        .collect()
}
