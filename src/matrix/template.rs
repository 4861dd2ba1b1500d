// Blank matrix template in the layout the booking form produces

use anyhow::{Context, Result};
use std::path::Path;

/// Column 0 header
pub const TIME_AXIS_LABEL: &str = "时间段";

/// Hourly slots offered by the venue, in grid order
pub const DEFAULT_TIME_SLOTS: [&str; 14] = [
    "08:00-09:00",
    "09:00-10:00",
    "10:00-11:00",
    "11:00-12:00",
    "12:00-13:00",
    "13:00-14:00",
    "14:00-15:00",
    "15:00-16:00",
    "16:00-17:00",
    "17:00-18:00",
    "18:00-19:00",
    "19:00-20:00",
    "20:00-21:00",
    "21:00-22:00",
];

/// Half-court labels `1-1` through `11-2`
pub fn default_courts() -> Vec<String> {
    (1..=11)
        .flat_map(|court| [format!("{}-1", court), format!("{}-2", court)])
        .collect()
}

/// Number of half courts in the default layout
pub const DEFAULT_COURTS: usize = 22;

/// Write an all-zero matrix to `path`
pub fn write_template(path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create matrix file: {}", path.display()))?;

    let courts = default_courts();
    let mut header = vec![TIME_AXIS_LABEL.to_string()];
    header.extend(courts.iter().cloned());
    writer.write_record(&header)?;

    for slot in DEFAULT_TIME_SLOTS {
        let mut row = vec![slot.to_string()];
        row.extend(std::iter::repeat("0".to_string()).take(courts.len()));
        writer.write_record(&row)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write matrix file: {}", path.display()))?;
    Ok(())
}
