//! Procedure latency profile from `@Statistics PROCEDUREPROFILE`

use anyhow::Result;

use super::require_columns;
use crate::models::ResultTable;

/// Aggregated statistics for one procedure (latencies in nanoseconds)
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureStat {
    pub procedure: String,
    pub invocations: i64,
    pub avg_ns: i64,
    pub min_ns: i64,
    pub max_ns: i64,
    pub aborts: i64,
    pub failures: i64,
}

impl ProcedureStat {
    /// Share of invocations that aborted or failed
    pub fn error_rate(&self) -> f64 {
        if self.invocations == 0 {
            return 0.0;
        }
        (self.aborts + self.failures) as f64 / self.invocations as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcedureProfile {
    pub procedures: Vec<ProcedureStat>,
}

impl ProcedureProfile {
    pub fn from_table(table: &ResultTable) -> Result<Self> {
        require_columns(table, &["PROCEDURE", "INVOCATIONS"])?;

        let procedures = (0..table.len())
            .filter_map(|row| {
                let int = |column: &str| table.i64_value(row, column).unwrap_or(0);
                Some(ProcedureStat {
                    procedure: table.str_value(row, "PROCEDURE")?,
                    invocations: int("INVOCATIONS"),
                    avg_ns: int("AVG"),
                    min_ns: int("MIN"),
                    max_ns: int("MAX"),
                    aborts: int("ABORTS"),
                    failures: int("FAILURES"),
                })
            })
            .collect();

        Ok(Self { procedures })
    }

    /// The `n` most invoked procedures, busiest first
    pub fn top_by_invocations(&self, n: usize) -> Vec<&ProcedureStat> {
        let mut sorted: Vec<&ProcedureStat> = self.procedures.iter().collect();
        sorted.sort_by(|a, b| {
            b.invocations
                .cmp(&a.invocations)
                .then_with(|| a.procedure.cmp(&b.procedure))
        });
        sorted.truncate(n);
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnType};
    use serde_json::{Value, json};

    fn row(procedure: &str, values: [i64; 6]) -> Vec<Value> {
        let mut row = vec![json!(procedure)];
        row.extend(values.into_iter().map(Value::from));
        row
    }

    fn profile_table() -> ResultTable {
        let columns = ["PROCEDURE", "INVOCATIONS", "AVG", "MIN", "MAX", "ABORTS", "FAILURES"]
            .into_iter()
            .map(|name| Column {
                name: name.to_string(),
                column_type: if name == "PROCEDURE" {
                    ColumnType::String
                } else {
                    ColumnType::BigInt
                },
            })
            .collect();

        ResultTable::new(
            columns,
            vec![
                row("Vote", [1000, 120, 80, 900, 10, 0]),
                row("Results", [50, 300, 200, 800, 0, 0]),
                row("Initialize", [1000, 5000, 5000, 5000, 0, 0]),
            ],
        )
    }

    #[test]
    fn test_parse_profile() {
        let profile = ProcedureProfile::from_table(&profile_table()).unwrap();
        assert_eq!(profile.procedures.len(), 3);
        assert_eq!(profile.procedures[0].avg_ns, 120);
        assert!((profile.procedures[0].error_rate() - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn test_top_by_invocations() {
        let profile = ProcedureProfile::from_table(&profile_table()).unwrap();
        let top: Vec<&str> = profile
            .top_by_invocations(2)
            .iter()
            .map(|p| p.procedure.as_str())
            .collect();
        assert_eq!(top, vec!["Initialize", "Vote"]);
    }
}
