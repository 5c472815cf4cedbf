//! Cluster overview from `@SystemInformation OVERVIEW`

use anyhow::Result;
use std::collections::BTreeMap;

use super::require_columns;
use crate::models::ResultTable;

/// Per-host key/value properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemOverview {
    hosts: BTreeMap<i64, BTreeMap<String, String>>,
}

impl SystemOverview {
    /// Parse rows of `HOST_ID`, `KEY`, `VALUE`
    pub fn from_table(table: &ResultTable) -> Result<Self> {
        require_columns(table, &["HOST_ID", "KEY", "VALUE"])?;

        let mut hosts: BTreeMap<i64, BTreeMap<String, String>> = BTreeMap::new();
        for row in 0..table.len() {
            let (Some(host_id), Some(key)) =
                (table.i64_value(row, "HOST_ID"), table.str_value(row, "KEY"))
            else {
                continue;
            };
            let value = table.str_value(row, "VALUE").unwrap_or_default();
            hosts.entry(host_id).or_default().insert(key, value);
        }

        Ok(Self { hosts })
    }

    pub fn host_ids(&self) -> Vec<i64> {
        self.hosts.keys().copied().collect()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn property(&self, host_id: i64, key: &str) -> Option<&str> {
        self.hosts.get(&host_id)?.get(key).map(String::as_str)
    }

    pub fn hostname(&self, host_id: i64) -> Option<&str> {
        self.property(host_id, "HOSTNAME")
    }

    /// Server version, taken from the lowest host id reporting one
    pub fn version(&self) -> Option<&str> {
        self.hosts
            .values()
            .find_map(|props| props.get("VERSION").map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnType};
    use serde_json::json;

    fn overview_table(rows: Vec<Vec<serde_json::Value>>) -> ResultTable {
        let column = |name: &str, column_type| Column {
            name: name.to_string(),
            column_type,
        };
        ResultTable::new(
            vec![
                column("HOST_ID", ColumnType::Integer),
                column("KEY", ColumnType::String),
                column("VALUE", ColumnType::String),
            ],
            rows,
        )
    }

    #[test]
    fn test_parse_overview() {
        let table = overview_table(vec![
            vec![json!(0), json!("HOSTNAME"), json!("node-a")],
            vec![json!(0), json!("VERSION"), json!("9.1")],
            vec![json!(1), json!("HOSTNAME"), json!("node-b")],
            vec![json!(1), json!("CLUSTERSTATE"), json!("RUNNING")],
        ]);

        let overview = SystemOverview::from_table(&table).unwrap();
        assert_eq!(overview.host_ids(), vec![0, 1]);
        assert_eq!(overview.hostname(1), Some("node-b"));
        assert_eq!(overview.version(), Some("9.1"));
        assert_eq!(overview.property(1, "CLUSTERSTATE"), Some("RUNNING"));
        assert_eq!(overview.property(2, "HOSTNAME"), None);
    }

    #[test]
    fn test_missing_column() {
        let table = ResultTable::new(Vec::new(), Vec::new());
        let err = SystemOverview::from_table(&table).unwrap_err();
        assert!(err.to_string().contains("HOST_ID"));
    }
}
