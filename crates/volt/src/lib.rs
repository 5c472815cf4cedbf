//! Volt crate - Client for the database server's JSON procedure API
//!
//! This crate provides:
//! - Endpoint and response models (Endpoint, Response, ResultTable)
//! - A procedure signature catalog with per-type parameter encoding
//! - An HTTP transport over the `/api/1.0/` endpoint
//! - A client with timeout-guarded, exactly-once result delivery
//! - Call queues: ordered, strictly sequential batches with one completion
//! - A connection registry keyed by explicit connection keys
//! - Typed parsers for the monitoring dashboards' statistics
//! - A SQL script runner for the query studio
//!
//! Nothing here renders anything; callers consume [`Response`] values.

pub mod catalog;
pub mod client;
pub mod config;
pub mod guard;
pub mod models;
pub mod monitor;
pub mod queue;
pub mod registry;
pub mod studio;
pub mod transport;

pub use catalog::{ParamType, PreparedCall, ProcedureCatalog, Signature, SignatureError};
pub use client::{CallHandle, Client, TimeoutPolicy};
pub use crate::config::ConnectionSettings;
pub use guard::TimeoutGuard;
pub use models::{
    Column, ColumnType, ConnectionKey, Credentials, Endpoint, HttpMethod, Origin, Param,
    Response, ResultTable, Secret, Status,
};
pub use monitor::{
    DashboardSnapshot, HostMemory, MemoryStats, ProcedureProfile, ProcedureStat, SystemOverview,
    refresh_dashboard,
};
pub use queue::{CallQueue, QueueHandle, QueueReport};
pub use registry::ConnectionRegistry;
pub use studio::{ScriptReport, StatementOutcome, run_script, split_statements};
pub use transport::{HttpTransport, Transport, TransportError};
