// Availability grid read straight from the booking page

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::grid::{CellState, GridProbe};
use crate::driver::{ElementHandle, SessionDriver};

/// Selectors locating grid cells on the page.
///
/// `cell` is a template: `{column}` and `{row}` are replaced with 1-based
/// indices before the string is handed to the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSelectors {
    /// Matches every court column
    pub columns: String,
    pub cell: String,
    /// Present inside a cell that is already reserved
    pub booked_marker: String,
    /// Clickable element inside a free cell
    pub free_marker: String,
}

impl Default for GridSelectors {
    fn default() -> Self {
        Self {
            columns: ".site".to_string(),
            cell: ".site:nth-child({column}) .site_content .site_item:nth-child({row})".to_string(),
            booked_marker: ".yyys".to_string(),
            free_marker: ".kxzs".to_string(),
        }
    }
}

impl GridSelectors {
    pub fn cell_selector(&self, column: usize, row: usize) -> String {
        self.cell
            .replace("{column}", &column.to_string())
            .replace("{row}", &row.to_string())
    }
}

/// Grid probe backed by a live session
pub struct DriverGrid<'a, D: SessionDriver> {
    driver: &'a D,
    selectors: &'a GridSelectors,
}

impl<'a, D: SessionDriver> DriverGrid<'a, D> {
    pub fn new(driver: &'a D, selectors: &'a GridSelectors) -> Self {
        Self { driver, selectors }
    }
}

#[async_trait]
impl<'a, D: SessionDriver> GridProbe for DriverGrid<'a, D> {
    async fn column_count(&mut self) -> Option<usize> {
        match self.driver.query_all(&self.selectors.columns).await {
            Ok(columns) if !columns.is_empty() => Some(columns.len()),
            Ok(_) => None,
            Err(e) => {
                debug!("Could not count grid columns: {}", e);
                None
            }
        }
    }

    async fn cell(&mut self, column: usize, row: usize) -> CellState {
        let selector = self.selectors.cell_selector(column, row);
        let element = match self.driver.query(&selector).await {
            Ok(Some(element)) => element,
            Ok(None) => return CellState::Unknown,
            Err(e) => {
                debug!(column, row, "Cell lookup failed: {}", e);
                return CellState::Unknown;
            }
        };

        match element.query(&self.selectors.booked_marker).await {
            Ok(Some(_)) => CellState::Booked,
            Ok(None) => CellState::Available,
            Err(e) => {
                debug!(column, row, "Booked marker lookup failed: {}", e);
                CellState::Unknown
            }
        }
    }

    async fn claim(&mut self, column: usize, row: usize) -> bool {
        let selector = self.selectors.cell_selector(column, row);
        let Ok(Some(cell)) = self.driver.query(&selector).await else {
            return false;
        };
        let Ok(Some(free)) = cell.query(&self.selectors.free_marker).await else {
            return false;
        };
        match free.click().await {
            Ok(()) => true,
            Err(e) => {
                debug!(column, row, "Claim click failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_selector_substitution() {
        let selectors = GridSelectors::default();
        assert_eq!(
            selectors.cell_selector(3, 10),
            ".site:nth-child(3) .site_content .site_item:nth-child(10)"
        );
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let selectors: GridSelectors = toml::from_str("booked_marker = \".taken\"").unwrap();
        assert_eq!(selectors.booked_marker, ".taken");
        assert_eq!(selectors.free_marker, ".kxzs");
    }
}
