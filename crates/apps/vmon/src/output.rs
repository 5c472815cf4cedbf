//! Plain-text rendering of procedure results

use serde_json::Value;
use volt::{Response, ResultTable};

/// Print a response: its tables on success, the status and message otherwise
pub fn print_response(response: &Response) {
    if response.is_success() {
        for table in &response.tables {
            println!("{}", format_table(table));
        }
    } else {
        eprintln!(
            "ERROR ({}, {:?}): {}",
            response.status.code(),
            response.origin,
            response.message
        );
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a table with aligned columns; numeric columns are right-aligned
pub fn format_table(table: &ResultTable) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(column.name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(cells.len() + 3);

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:<width$}", column.name, width = width))
        .collect();
    lines.push(header.join("  ").trim_end().to_string());

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    lines.push(rule.join("  "));

    for row in &cells {
        let line: Vec<String> = table
            .columns
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (column, width))| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                if column.column_type.is_numeric() {
                    format!("{:>width$}", cell, width = width)
                } else {
                    format!("{:<width$}", cell, width = width)
                }
            })
            .collect();
        lines.push(line.join("  ").trim_end().to_string());
    }

    lines.push(format!("({} row(s))", table.len()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use volt::{Column, ColumnType};

    #[test]
    fn test_format_table() {
        let table = ResultTable::new(
            vec![
                Column {
                    name: "NAME".to_string(),
                    column_type: ColumnType::String,
                },
                Column {
                    name: "N".to_string(),
                    column_type: ColumnType::BigInt,
                },
            ],
            vec![
                vec![json!("votes"), json!(1200)],
                vec![json!("x"), Value::Null],
            ],
        );

        let text = format_table(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "NAME   N");
        assert_eq!(lines[1], "-----  ----");
        assert_eq!(lines[2], "votes  1200");
        assert_eq!(lines[3], "x      NULL");
        assert_eq!(lines[4], "(2 row(s))");
    }

    #[test]
    fn test_format_empty_table() {
        let table = ResultTable::new(
            vec![Column {
                name: "A".to_string(),
                column_type: ColumnType::String,
            }],
            Vec::new(),
        );
        assert_eq!(format_table(&table), "A\n-\n(0 row(s))");
    }
}
