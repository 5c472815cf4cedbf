//! Response model for procedure calls

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Status code reported for a procedure call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Status {
    Success,
    UserAbort,
    GracefulFailure,
    UnexpectedFailure,
    ConnectionLost,
    ServerUnavailable,
    ConnectionTimeout,
    ResponseUnknown,
    TxnRestart,
    OperationalFailure,
    Other(i32),
}

impl Status {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Status::Success,
            -1 => Status::UserAbort,
            -2 => Status::GracefulFailure,
            -3 => Status::UnexpectedFailure,
            -4 => Status::ConnectionLost,
            -5 => Status::ServerUnavailable,
            -6 => Status::ConnectionTimeout,
            -7 => Status::ResponseUnknown,
            -8 => Status::TxnRestart,
            -9 => Status::OperationalFailure,
            other => Status::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Status::Success => 1,
            Status::UserAbort => -1,
            Status::GracefulFailure => -2,
            Status::UnexpectedFailure => -3,
            Status::ConnectionLost => -4,
            Status::ServerUnavailable => -5,
            Status::ConnectionTimeout => -6,
            Status::ResponseUnknown => -7,
            Status::TxnRestart => -8,
            Status::OperationalFailure => -9,
            Status::Other(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Status::from_code(code)
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Decoded from the server's reply
    Server,
    /// Synthesized locally: unknown procedure or invalid parameters
    Rejected,
    /// Synthesized locally: no reply within the timeout
    TimedOut,
    /// Synthesized locally: the request could not be completed
    Transport,
}

/// Server column type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ColumnType {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    String,
    Timestamp,
    Decimal,
    Varbinary,
    Unknown(i64),
}

impl ColumnType {
    pub fn from_code(code: i64) -> Self {
        match code {
            3 => ColumnType::TinyInt,
            4 => ColumnType::SmallInt,
            5 => ColumnType::Integer,
            6 => ColumnType::BigInt,
            8 => ColumnType::Float,
            9 => ColumnType::String,
            11 => ColumnType::Timestamp,
            22 => ColumnType::Decimal,
            25 => ColumnType::Varbinary,
            other => ColumnType::Unknown(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ColumnType::TinyInt => 3,
            ColumnType::SmallInt => 4,
            ColumnType::Integer => 5,
            ColumnType::BigInt => 6,
            ColumnType::Float => 8,
            ColumnType::String => 9,
            ColumnType::Timestamp => 11,
            ColumnType::Decimal => 22,
            ColumnType::Varbinary => 25,
            ColumnType::Unknown(code) => code,
        }
    }

    /// Whether values of this type should be right-aligned when printed
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnType::TinyInt
                | ColumnType::SmallInt
                | ColumnType::Integer
                | ColumnType::BigInt
                | ColumnType::Float
                | ColumnType::Decimal
        )
    }
}

impl From<i64> for ColumnType {
    fn from(code: i64) -> Self {
        ColumnType::from_code(code)
    }
}

impl From<ColumnType> for i64 {
    fn from(column_type: ColumnType) -> Self {
        column_type.code()
    }
}

/// A result table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// One table of a procedure result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultTable {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Value of a named column in a row
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// String value of a named column; numbers are rendered as text
    pub fn str_value(&self, row: usize, column: &str) -> Option<String> {
        match self.value(row, column)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Integer value of a named column; numeric strings are accepted
    pub fn i64_value(&self, row: usize, column: &str) -> Option<i64> {
        match self.value(row, column)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Float value of a named column; numeric strings are accepted
    pub fn f64_value(&self, row: usize, column: &str) -> Option<f64> {
        match self.value(row, column)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Result of a procedure call, from the server or synthesized locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub message: String,
    pub tables: Vec<ResultTable>,
    pub origin: Origin,
}

impl Response {
    /// Message used for responses that did not arrive in time
    pub const TIMEOUT_MESSAGE: &'static str = "Query timeout";

    /// A successful server response
    pub fn success(tables: Vec<ResultTable>) -> Self {
        Self {
            status: Status::Success,
            message: String::new(),
            tables,
            origin: Origin::Server,
        }
    }

    /// A failed server response
    pub fn failure(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            tables: Vec::new(),
            origin: Origin::Server,
        }
    }

    /// A call that never left the client (unknown procedure, bad parameters)
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::synthetic(Origin::Rejected, message.into())
    }

    /// A call whose response did not arrive within `timeout`
    pub fn timed_out(timeout: Duration) -> Self {
        Self::synthetic(
            Origin::TimedOut,
            format!("{} after {}s", Self::TIMEOUT_MESSAGE, timeout.as_secs_f64()),
        )
    }

    /// A call that failed below the procedure level
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self::synthetic(Origin::Transport, message.into())
    }

    fn synthetic(origin: Origin, message: String) -> Self {
        Self {
            status: Status::UserAbort,
            message,
            tables: Vec::new(),
            origin,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_timeout(&self) -> bool {
        self.origin == Origin::TimedOut
    }

    /// The first result table, if any
    pub fn first_table(&self) -> Option<&ResultTable> {
        self.tables.first()
    }
}
