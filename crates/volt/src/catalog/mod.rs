//! Procedure signature catalog
//!
//! Every call is checked against a known signature before it is sent:
//! the procedure must be known and the parameter count must match. The
//! catalog also turns parameters into the JSON `Parameters` array.

mod signature;

pub use signature::{ParamType, Signature};

use log::debug;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::models::{Param, ResultTable};

/// Error raised when a call does not match its procedure's signature
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignatureError {
    #[error("Unknown procedure '{0}'")]
    UnknownProcedure(String),
    #[error("Procedure '{procedure}' expects {expected} parameter(s), got {actual}")]
    ArityMismatch {
        procedure: String,
        expected: usize,
        actual: usize,
    },
    #[error("Parameter {index} of '{procedure}' is not a valid {expected}: {value}")]
    InvalidParameter {
        procedure: String,
        index: usize,
        expected: ParamType,
        value: String,
    },
}

/// A validated call, ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    /// Canonical procedure name
    pub procedure: String,
    /// JSON array text for the `Parameters` field
    pub parameters: String,
    /// Whether the long-running timeout applies
    pub long_running: bool,
}

/// Known procedures and their signatures
#[derive(Debug, Clone, Default)]
pub struct ProcedureCatalog {
    procedures: HashMap<String, Signature>,
}

impl ProcedureCatalog {
    /// An empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the server's built-in system procedures
    pub fn system() -> Self {
        use ParamType::{Bit, Varchar};

        let mut catalog = Self::new();
        let entries = [
            ("@AdHoc", Signature::new(vec![Varchar]).long_running()),
            ("@Explain", Signature::new(vec![Varchar]).long_running()),
            ("@ExplainProc", Signature::new(vec![Varchar]).long_running()),
            ("@GetPartitionKeys", Signature::new(vec![Varchar])),
            ("@Pause", Signature::empty()),
            ("@Ping", Signature::empty()),
            ("@Promote", Signature::empty()),
            ("@Quiesce", Signature::empty()),
            ("@Resume", Signature::empty()),
            ("@Shutdown", Signature::empty()),
            ("@SnapshotDelete", Signature::new(vec![Varchar, Varchar])),
            (
                "@SnapshotRestore",
                Signature::new(vec![Varchar, Varchar]).long_running(),
            ),
            (
                "@SnapshotSave",
                Signature::new(vec![Varchar, Varchar, Bit]).long_running(),
            ),
            ("@SnapshotScan", Signature::new(vec![Varchar])),
            ("@SnapshotStatus", Signature::empty()),
            ("@Statistics", Signature::new(vec![Varchar, Bit])),
            ("@SystemCatalog", Signature::new(vec![Varchar])),
            ("@SystemInformation", Signature::new(vec![Varchar])),
            (
                "@UpdateApplicationCatalog",
                Signature::new(vec![Varchar, Varchar]).long_running(),
            ),
            ("@UpdateLogging", Signature::new(vec![Varchar])),
        ];
        for (name, signature) in entries {
            catalog.register(name, signature);
        }
        catalog
    }

    /// Add or replace a procedure
    pub fn register(&mut self, name: impl Into<String>, signature: Signature) {
        self.procedures.insert(name.into(), signature);
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// Procedure names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.procedures.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Find a procedure by name
    ///
    /// Exact names win; otherwise `Statistics` resolves to `@Statistics`.
    /// Returns the canonical name and its signature.
    pub fn lookup(&self, name: &str) -> Option<(&str, &Signature)> {
        if let Some((key, sig)) = self.procedures.get_key_value(name) {
            return Some((key.as_str(), sig));
        }
        if name.starts_with('@') {
            return None;
        }
        self.procedures
            .get_key_value(&format!("@{}", name))
            .map(|(key, sig)| (key.as_str(), sig))
    }

    /// Register user procedures from `@SystemCatalog PROCEDURECOLUMNS` rows
    ///
    /// Rows are grouped by `PROCEDURE_NAME` and ordered by
    /// `ORDINAL_POSITION`. Rows with an unrecognized `TYPE_NAME` make the
    /// whole procedure unusable, so it is skipped. Returns the number of
    /// procedures registered.
    pub fn register_procedure_columns(&mut self, table: &ResultTable) -> usize {
        let mut grouped: BTreeMap<String, Vec<(i64, Option<ParamType>)>> = BTreeMap::new();

        for row in 0..table.len() {
            let Some(name) = table.str_value(row, "PROCEDURE_NAME") else {
                continue;
            };
            let ordinal = table.i64_value(row, "ORDINAL_POSITION").unwrap_or(0);
            let param_type = table
                .str_value(row, "TYPE_NAME")
                .and_then(|t| t.parse::<ParamType>().ok());
            grouped.entry(name).or_default().push((ordinal, param_type));
        }

        let mut registered = 0;
        for (name, mut columns) in grouped {
            columns.sort_by_key(|(ordinal, _)| *ordinal);
            let params: Option<Vec<ParamType>> = columns.into_iter().map(|(_, t)| t).collect();
            match params {
                Some(params) => {
                    self.register(name, Signature::new(params));
                    registered += 1;
                }
                None => debug!("Skipping procedure {} with unsupported parameter types", name),
            }
        }
        registered
    }

    /// Validate a call and encode its parameters
    pub fn prepare(&self, name: &str, params: &[Param]) -> Result<PreparedCall, SignatureError> {
        let (procedure, signature) = self
            .lookup(name)
            .ok_or_else(|| SignatureError::UnknownProcedure(name.to_string()))?;

        if signature.arity() != params.len() {
            return Err(SignatureError::ArityMismatch {
                procedure: procedure.to_string(),
                expected: signature.arity(),
                actual: params.len(),
            });
        }

        let encoded = signature
            .params()
            .iter()
            .zip(params)
            .enumerate()
            .map(|(index, (param_type, param))| {
                param_type
                    .encode(param)
                    .ok_or_else(|| SignatureError::InvalidParameter {
                        procedure: procedure.to_string(),
                        index,
                        expected: *param_type,
                        value: param.to_string(),
                    })
            })
            .collect::<Result<Vec<Value>, _>>()?;

        Ok(PreparedCall {
            procedure: procedure.to_string(),
            parameters: Value::Array(encoded).to_string(),
            long_running: signature.is_long_running(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnType};
    use serde_json::json;

    fn string_column(name: &str) -> Column {
        Column {
            name: name.to_string(),
            column_type: ColumnType::String,
        }
    }

    #[test]
    fn test_lookup_with_and_without_prefix() {
        let catalog = ProcedureCatalog::system();
        assert_eq!(catalog.lookup("@Statistics").unwrap().0, "@Statistics");
        assert_eq!(catalog.lookup("Statistics").unwrap().0, "@Statistics");
        assert!(catalog.lookup("@Nope").is_none());
        assert!(catalog.lookup("Nope").is_none());
    }

    #[test]
    fn test_prepare_statistics() {
        let catalog = ProcedureCatalog::system();
        let call = catalog
            .prepare("Statistics", &["TABLE".into(), "0".into()])
            .unwrap();
        assert_eq!(call.procedure, "@Statistics");
        assert_eq!(call.parameters, r#"["TABLE",0]"#);
        assert!(!call.long_running);
    }

    #[test]
    fn test_prepare_no_params() {
        let catalog = ProcedureCatalog::system();
        let call = catalog.prepare("@Ping", &[]).unwrap();
        assert_eq!(call.parameters, "[]");
    }

    #[test]
    fn test_prepare_unknown() {
        let catalog = ProcedureCatalog::system();
        let err = catalog.prepare("Bogus", &[]).unwrap_err();
        assert_eq!(err, SignatureError::UnknownProcedure("Bogus".to_string()));
    }

    #[test]
    fn test_prepare_arity_mismatch() {
        let catalog = ProcedureCatalog::system();
        let err = catalog.prepare("@Statistics", &["TABLE".into()]).unwrap_err();
        assert!(matches!(
            err,
            SignatureError::ArityMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_prepare_invalid_parameter() {
        let catalog = ProcedureCatalog::system();
        let err = catalog
            .prepare("@Statistics", &["TABLE".into(), "perhaps".into()])
            .unwrap_err();
        assert!(matches!(
            err,
            SignatureError::InvalidParameter {
                index: 1,
                expected: ParamType::Bit,
                ..
            }
        ));
    }

    #[test]
    fn test_prepare_rejects_out_of_range_integers() {
        let mut catalog = ProcedureCatalog::new();
        catalog.register("Seat", Signature::new(vec![ParamType::TinyInt]));
        catalog.register("Account", Signature::new(vec![ParamType::BigInt]));

        let err = catalog.prepare("Seat", &[Param::Int(1000)]).unwrap_err();
        assert!(matches!(
            err,
            SignatureError::InvalidParameter {
                index: 0,
                expected: ParamType::TinyInt,
                ..
            }
        ));
        assert!(catalog.prepare("Account", &[Param::Float(1e20)]).is_err());
        assert_eq!(
            catalog.prepare("Seat", &[Param::Int(12)]).unwrap().parameters,
            "[12]"
        );
    }

    #[test]
    fn test_adhoc_is_long_running() {
        let catalog = ProcedureCatalog::system();
        let call = catalog.prepare("@AdHoc", &["SELECT 1;".into()]).unwrap();
        assert!(call.long_running);
        assert_eq!(call.parameters, r#"["SELECT 1;"]"#);
    }

    #[test]
    fn test_register_procedure_columns() {
        let table = ResultTable::new(
            vec![
                string_column("PROCEDURE_NAME"),
                string_column("COLUMN_NAME"),
                string_column("TYPE_NAME"),
                Column {
                    name: "ORDINAL_POSITION".to_string(),
                    column_type: ColumnType::Integer,
                },
            ],
            vec![
                vec![json!("Vote"), json!("contestant"), json!("INTEGER"), json!(2)],
                vec![json!("Vote"), json!("phone"), json!("BIGINT"), json!(1)],
                vec![json!("Vote"), json!("max"), json!("BIGINT"), json!(3)],
                vec![json!("Geo"), json!("shape"), json!("GEOGRAPHY"), json!(1)],
            ],
        );

        let mut catalog = ProcedureCatalog::new();
        assert_eq!(catalog.register_procedure_columns(&table), 1);

        let (_, sig) = catalog.lookup("Vote").unwrap();
        assert_eq!(
            sig.params(),
            &[ParamType::BigInt, ParamType::Integer, ParamType::BigInt]
        );
        assert!(catalog.lookup("Geo").is_none());

        let call = catalog
            .prepare("Vote", &[Param::Int(5551234), "3".into(), Param::Int(2)])
            .unwrap();
        assert_eq!(call.parameters, "[5551234,3,2]");
    }

    #[test]
    fn test_names_sorted() {
        let catalog = ProcedureCatalog::system();
        let names = catalog.names();
        assert_eq!(names.first(), Some(&"@AdHoc"));
        assert_eq!(names.len(), catalog.len());
    }
}
