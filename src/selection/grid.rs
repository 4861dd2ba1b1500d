// Availability grid model

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Availability of one (column, row) cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Available,
    Booked,
    /// Cell could not be located; never treated as bookable
    Unknown,
}

impl CellState {
    pub fn is_available(&self) -> bool {
        matches!(self, CellState::Available)
    }
}

/// Read/claim access to a grid of courts (columns) × time slots (rows).
///
/// Columns and rows are 1-based, in document order.
#[async_trait]
pub trait GridProbe: Send {
    /// Number of columns actually present, if the source can tell
    async fn column_count(&mut self) -> Option<usize> {
        None
    }

    async fn cell(&mut self, column: usize, row: usize) -> CellState;

    /// Reserve one cell; `true` when the claim went through
    async fn claim(&mut self, column: usize, row: usize) -> bool;
}

/// In-memory grid, used for dry runs and tests
#[derive(Debug, Clone, Default)]
pub struct GridSnapshot {
    columns: Vec<Vec<CellState>>,
    claimed: BTreeSet<(usize, usize)>,
    probes: usize,
}

impl GridSnapshot {
    /// Build from column-major states (`columns[0]` is column 1)
    pub fn new(columns: Vec<Vec<CellState>>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    /// A `columns` × `rows` grid with every cell in `state`
    pub fn filled(columns: usize, rows: usize, state: CellState) -> Self {
        Self::new(vec![vec![state; rows]; columns])
    }

    pub fn set(&mut self, column: usize, row: usize, state: CellState) {
        if let Some(cell) = self
            .columns
            .get_mut(column.wrapping_sub(1))
            .and_then(|c| c.get_mut(row.wrapping_sub(1)))
        {
            *cell = state;
        }
    }

    pub fn state(&self, column: usize, row: usize) -> CellState {
        self.columns
            .get(column.wrapping_sub(1))
            .and_then(|c| c.get(row.wrapping_sub(1)))
            .copied()
            .unwrap_or(CellState::Unknown)
    }

    /// Cells claimed so far, as (column, row)
    pub fn claimed(&self) -> &BTreeSet<(usize, usize)> {
        &self.claimed
    }

    /// How many cell reads have been made
    pub fn probes(&self) -> usize {
        self.probes
    }
}

#[async_trait]
impl GridProbe for GridSnapshot {
    async fn column_count(&mut self) -> Option<usize> {
        Some(self.columns.len())
    }

    async fn cell(&mut self, column: usize, row: usize) -> CellState {
        self.probes += 1;
        if self.claimed.contains(&(column, row)) {
            return CellState::Booked;
        }
        self.state(column, row)
    }

    async fn claim(&mut self, column: usize, row: usize) -> bool {
        if !self.state(column, row).is_available() {
            return false;
        }
        self.claimed.insert((column, row))
    }
}
