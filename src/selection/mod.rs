// Slot selection
//
// Scans an availability grid for the first court column where every wanted
// time slot is free, then claims those slots. A column is all-or-nothing:
// it is only chosen when every desired row is available, and the task only
// counts as claimed when every desired row was claimed.

mod grid;
mod live;
mod selector;

pub use grid::{CellState, GridProbe, GridSnapshot};
pub use live::{DriverGrid, GridSelectors};
pub use selector::{ClaimOutcome, SelectionConfig, SlotSelector};
