//! Transport for the JSON procedure API
//!
//! This module provides:
//! - The [`Transport`] trait the client sends prepared calls through
//! - An HTTP implementation on top of ureq
//! - Wire types for the server's JSON response

mod http;

pub use http::HttpTransport;

use std::time::Duration;

use crate::catalog::PreparedCall;
use crate::models::{Endpoint, Response};

/// Error raised when a request could not produce a procedure response
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
    #[error("Server returned HTTP {0}")]
    Http(u16),
    #[error("Request failed: {0}")]
    Io(String),
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => TransportError::Http(code),
            other => TransportError::Io(other.to_string()),
        }
    }
}

/// Sends one prepared call and waits for its response
///
/// Implementations block; the client runs them on a worker thread under a
/// timeout guard. `timeout` is the guard's deadline for this call; a
/// transport should give up soon after it so abandoned workers exit.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        endpoint: &Endpoint,
        call: &PreparedCall,
        timeout: Duration,
    ) -> Result<Response, TransportError>;
}

/// Server response wire types
pub mod wire {
    use serde::Deserialize;
    use serde_json::Value;

    use crate::models::{Column, ColumnType, Origin, Response, ResultTable, Status};

    /// Response body of `/api/1.0/`
    #[derive(Debug, Deserialize)]
    pub struct WireResponse {
        pub status: i32,
        #[serde(default)]
        pub statusstring: Option<String>,
        #[serde(default)]
        pub appstatus: Option<i32>,
        #[serde(default)]
        pub appstatusstring: Option<String>,
        #[serde(default)]
        pub results: Option<Vec<WireTable>>,
    }

    /// One result table
    #[derive(Debug, Deserialize)]
    pub struct WireTable {
        #[serde(default)]
        pub schema: Option<Vec<WireColumn>>,
        #[serde(default)]
        pub data: Option<Vec<Vec<Value>>>,
    }

    /// Column name and type code
    #[derive(Debug, Deserialize)]
    pub struct WireColumn {
        pub name: String,
        #[serde(rename = "type")]
        pub type_code: i64,
    }

    impl From<WireTable> for ResultTable {
        fn from(table: WireTable) -> Self {
            let columns = table
                .schema
                .unwrap_or_default()
                .into_iter()
                .map(|c| Column {
                    name: c.name,
                    column_type: ColumnType::from_code(c.type_code),
                })
                .collect();
            ResultTable::new(columns, table.data.unwrap_or_default())
        }
    }

    impl From<WireResponse> for Response {
        fn from(wire: WireResponse) -> Self {
            let message = wire
                .statusstring
                .filter(|s| !s.is_empty())
                .or(wire.appstatusstring)
                .unwrap_or_default();

            Response {
                status: Status::from_code(wire.status),
                message,
                tables: wire
                    .results
                    .unwrap_or_default()
                    .into_iter()
                    .map(ResultTable::from)
                    .collect(),
                origin: Origin::Server,
            }
        }
    }

    /// Decode a response body
    pub fn decode(body: &str) -> Result<Response, serde_json::Error> {
        serde_json::from_str::<WireResponse>(body).map(Response::from)
    }
}
