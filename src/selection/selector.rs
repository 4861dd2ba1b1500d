// First-fit column selection and claim

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::grid::GridProbe;

/// Result of one select-and-claim call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Every desired row was claimed on `column`
    Claimed { column: usize, rows: BTreeSet<usize> },
    /// No column in range had all desired rows available
    NotFound,
    /// `column` was selected but only `claimed` of `wanted` rows went through
    PartialClaim {
        column: usize,
        claimed: usize,
        wanted: usize,
    },
}

impl ClaimOutcome {
    pub fn is_claimed(&self) -> bool {
        matches!(self, ClaimOutcome::Claimed { .. })
    }
}

/// Scan bounds and pacing for the selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// First column considered (1-based)
    pub start_column: usize,
    /// Last column considered
    pub max_columns: usize,
    /// Pause between individual cell claims
    pub claim_pause_ms: u64,
    /// Scan from the task's own matrix column rather than `start_column`
    pub start_at_task_column: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            start_column: 1,
            max_columns: 21,
            claim_pause_ms: 200,
            start_at_task_column: false,
        }
    }
}

/// Finds the lowest column whose desired rows are all available, then claims them
#[derive(Debug, Clone)]
pub struct SlotSelector {
    config: SelectionConfig,
}

impl SlotSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// Feasibility scan only; never claims anything.
    ///
    /// A column is rejected at its first desired row that is not `Available`.
    pub async fn select<G: GridProbe>(
        &self,
        grid: &mut G,
        desired_rows: &BTreeSet<usize>,
    ) -> Option<usize> {
        if desired_rows.is_empty() {
            return None;
        }

        let mut last = self.config.max_columns;
        if let Some(present) = grid.column_count().await {
            last = last.min(present);
        }

        for column in self.config.start_column.max(1)..=last {
            let mut feasible = true;
            for &row in desired_rows {
                let state = grid.cell(column, row).await;
                if !state.is_available() {
                    debug!(column, row, ?state, "Column rejected");
                    feasible = false;
                    break;
                }
            }
            if feasible {
                debug!(column, "Column has every desired row free");
                return Some(column);
            }
        }

        None
    }

    /// Select a column and claim every desired row on it.
    ///
    /// Takes the grid by value: a snapshot serves exactly one call.
    pub async fn select_and_claim<G: GridProbe>(
        &self,
        mut grid: G,
        desired_rows: &BTreeSet<usize>,
    ) -> ClaimOutcome {
        let Some(column) = self.select(&mut grid, desired_rows).await else {
            info!("No column has all {} desired row(s) free", desired_rows.len());
            return ClaimOutcome::NotFound;
        };

        let pause = Duration::from_millis(self.config.claim_pause_ms);
        let mut claimed = 0;
        for &row in desired_rows {
            if grid.claim(column, row).await {
                claimed += 1;
                debug!(column, row, "Claimed slot");
            } else {
                warn!(column, row, "Failed to claim slot");
            }
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        if claimed == desired_rows.len() {
            info!(column, rows = claimed, "Claimed every desired slot");
            ClaimOutcome::Claimed {
                column,
                rows: desired_rows.clone(),
            }
        } else {
            warn!(
                column,
                claimed,
                wanted = desired_rows.len(),
                "Partial claim; remote state may hold a half-booked court"
            );
            ClaimOutcome::PartialClaim {
                column,
                claimed,
                wanted: desired_rows.len(),
            }
        }
    }
}

impl Default for SlotSelector {
    fn default() -> Self {
        Self::new(SelectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::grid::{CellState, GridSnapshot};
    use async_trait::async_trait;

    fn rows(rows: &[usize]) -> BTreeSet<usize> {
        rows.iter().copied().collect()
    }

    fn selector() -> SlotSelector {
        SlotSelector::new(SelectionConfig {
            claim_pause_ms: 0,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_skips_column_with_booked_row() {
        let mut grid = GridSnapshot::filled(3, 3, CellState::Available);
        grid.set(1, 2, CellState::Booked);

        let column = selector().select(&mut grid, &rows(&[1, 2, 3])).await;
        assert_eq!(column, Some(2));
    }

    #[tokio::test]
    async fn test_lowest_feasible_column_from_start() {
        let mut grid = GridSnapshot::filled(5, 2, CellState::Available);
        let selector = SlotSelector::new(SelectionConfig {
            start_column: 3,
            max_columns: 5,
            claim_pause_ms: 0,
            ..Default::default()
        });
        assert_eq!(selector.select(&mut grid, &rows(&[1, 2])).await, Some(3));
    }

    #[tokio::test]
    async fn test_unknown_cells_are_not_feasible() {
        let mut grid = GridSnapshot::filled(2, 2, CellState::Available);
        grid.set(1, 1, CellState::Unknown);
        grid.set(2, 2, CellState::Booked);

        assert_eq!(selector().select(&mut grid, &rows(&[1, 2])).await, None);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_unavailable_row() {
        let mut grid = GridSnapshot::filled(1, 4, CellState::Available);
        grid.set(1, 1, CellState::Booked);

        assert_eq!(selector().select(&mut grid, &rows(&[1, 2, 3, 4])).await, None);
        assert_eq!(grid.probes(), 1);
    }

    #[tokio::test]
    async fn test_scan_respects_max_columns() {
        let mut grid = GridSnapshot::filled(4, 1, CellState::Booked);
        grid.set(4, 1, CellState::Available);
        let selector = SlotSelector::new(SelectionConfig {
            start_column: 1,
            max_columns: 3,
            claim_pause_ms: 0,
            ..Default::default()
        });
        assert_eq!(selector.select(&mut grid, &rows(&[1])).await, None);
    }

    #[tokio::test]
    async fn test_not_found_leaves_grid_untouched() {
        let mut grid = GridSnapshot::filled(3, 2, CellState::Available);
        for column in 1..=3 {
            grid.set(column, 2, CellState::Booked);
        }
        let before: Vec<CellState> = (1..=3).map(|c| grid.state(c, 1)).collect();

        assert_eq!(selector().select(&mut grid, &rows(&[1, 2])).await, None);
        let after: Vec<CellState> = (1..=3).map(|c| grid.state(c, 1)).collect();
        assert_eq!(before, after);
        assert!(grid.claimed().is_empty());

        let outcome = selector().select_and_claim(grid, &rows(&[1, 2])).await;
        assert_eq!(outcome, ClaimOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_claims_all_desired_rows() {
        let grid = GridSnapshot::filled(2, 14, CellState::Available);
        let outcome = selector()
            .select_and_claim(grid, &rows(&[10, 11, 12, 13]))
            .await;

        assert_eq!(
            outcome,
            ClaimOutcome::Claimed {
                column: 1,
                rows: rows(&[10, 11, 12, 13])
            }
        );
        assert!(outcome.is_claimed());
    }

    /// Reports every cell free but refuses claims on one row
    struct FlakyGrid {
        refuse_row: usize,
    }

    #[async_trait]
    impl GridProbe for FlakyGrid {
        async fn cell(&mut self, _column: usize, _row: usize) -> CellState {
            CellState::Available
        }

        async fn claim(&mut self, _column: usize, row: usize) -> bool {
            row != self.refuse_row
        }
    }

    #[tokio::test]
    async fn test_partial_claim_is_reported() {
        let outcome = selector()
            .select_and_claim(FlakyGrid { refuse_row: 2 }, &rows(&[1, 2, 3]))
            .await;

        assert_eq!(
            outcome,
            ClaimOutcome::PartialClaim {
                column: 1,
                claimed: 2,
                wanted: 3
            }
        );
        assert!(!outcome.is_claimed());
    }

    #[tokio::test]
    async fn test_empty_rows_select_nothing() {
        let mut grid = GridSnapshot::filled(2, 2, CellState::Available);
        assert_eq!(selector().select(&mut grid, &BTreeSet::new()).await, None);
    }
}
