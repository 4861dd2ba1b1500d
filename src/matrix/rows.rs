// Matrix row → live grid row translation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::parser::Task;
use crate::errors::ReservationError;

/// Explicit table from a matrix row label (the time-slot text in column 0)
/// to the row index of that slot in the live availability grid.
///
/// An empty table means the two numberings coincide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowMapping {
    by_label: BTreeMap<String, usize>,
}

impl RowMapping {
    pub fn new(by_label: BTreeMap<String, usize>) -> Self {
        Self { by_label }
    }

    pub fn is_identity(&self) -> bool {
        self.by_label.is_empty()
    }

    /// Grid row for a matrix row label
    pub fn grid_row(&self, label: &str) -> Option<usize> {
        self.by_label.get(label.trim()).copied()
    }

    /// Translate every task's rows to grid rows.
    ///
    /// Any flagged row whose label is missing from the table fails the whole
    /// batch, so inconsistencies surface before the scheduler starts waiting.
    pub fn apply(
        &self,
        rows: &[Vec<String>],
        tasks: Vec<Task>,
    ) -> Result<Vec<Task>, ReservationError> {
        if self.is_identity() {
            return Ok(tasks);
        }

        tasks
            .into_iter()
            .map(|task| {
                let mapped = task
                    .desired_rows()
                    .iter()
                    .map(|&row| {
                        let label = rows
                            .get(row)
                            .and_then(|cells| cells.first())
                            .map(String::as_str)
                            .unwrap_or_default();
                        self.grid_row(label).ok_or_else(|| {
                            ReservationError::Config(format!(
                                "matrix row {} ('{}') of {} has no entry in [grid.rows]",
                                row,
                                label,
                                task.label()
                            ))
                        })
                    })
                    .collect::<Result<BTreeSet<usize>, _>>()?;
                Ok(task.with_rows(mapped))
            })
            .collect()
    }
}
