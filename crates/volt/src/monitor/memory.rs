//! Memory usage from `@Statistics MEMORY`

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};

use super::require_columns;
use crate::models::ResultTable;

/// Memory figures for one host (sizes in KB)
#[derive(Debug, Clone, PartialEq)]
pub struct HostMemory {
    pub host_id: i64,
    pub hostname: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub rss_kb: i64,
    pub java_used_kb: i64,
    pub tuple_count: i64,
    pub physical_kb: i64,
}

impl HostMemory {
    /// Resident set size as a fraction of physical memory
    pub fn rss_ratio(&self) -> Option<f64> {
        (self.physical_kb > 0).then(|| self.rss_kb as f64 / self.physical_kb as f64)
    }
}

/// Memory statistics for every host that reported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStats {
    pub hosts: Vec<HostMemory>,
}

impl MemoryStats {
    pub fn from_table(table: &ResultTable) -> Result<Self> {
        require_columns(table, &["HOST_ID", "RSS"])?;

        let mut hosts: Vec<HostMemory> = (0..table.len())
            .filter_map(|row| {
                let host_id = table.i64_value(row, "HOST_ID")?;
                Some(HostMemory {
                    host_id,
                    hostname: table.str_value(row, "HOSTNAME").unwrap_or_default(),
                    timestamp: table
                        .i64_value(row, "TIMESTAMP")
                        .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
                    rss_kb: table.i64_value(row, "RSS").unwrap_or(0),
                    java_used_kb: table.i64_value(row, "JAVAUSED").unwrap_or(0),
                    tuple_count: table.i64_value(row, "TUPLECOUNT").unwrap_or(0),
                    physical_kb: table.i64_value(row, "PHYSICALMEMORY").unwrap_or(0),
                })
            })
            .collect();
        hosts.sort_by_key(|h| h.host_id);

        Ok(Self { hosts })
    }

    pub fn total_rss_kb(&self) -> i64 {
        self.hosts.iter().map(|h| h.rss_kb).sum()
    }

    pub fn total_tuples(&self) -> i64 {
        self.hosts.iter().map(|h| h.tuple_count).sum()
    }
}
