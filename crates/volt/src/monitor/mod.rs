//! Typed views of the monitoring dashboards' data sources
//!
//! Each parser reads a [`crate::ResultTable`] by column name, so extra or
//! reordered columns from newer servers are tolerated.

mod dashboard;
mod memory;
mod overview;
mod procedures;

pub use dashboard::{DashboardSnapshot, refresh_dashboard};
pub use memory::{HostMemory, MemoryStats};
pub use overview::SystemOverview;
pub use procedures::{ProcedureProfile, ProcedureStat};

use anyhow::{Result, bail};

use crate::models::ResultTable;

/// Fail unless every named column is present
fn require_columns(table: &ResultTable, columns: &[&str]) -> Result<()> {
    for column in columns {
        if table.column_index(column).is_none() {
            bail!("Result table is missing column {}", column);
        }
    }
    Ok(())
}
