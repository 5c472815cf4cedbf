//! Dashboard refresh
//!
//! One refresh is one call queue: overview, memory, then procedure profile.
//! Each per-call callback parses its result into the shared snapshot.

use log::warn;
use std::sync::{Arc, Mutex};

use super::{MemoryStats, ProcedureProfile, SystemOverview};
use crate::client::Client;
use crate::models::{Param, Response};
use crate::queue::QueueReport;

/// Data collected by one dashboard refresh
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub overview: Option<SystemOverview>,
    pub memory: Option<MemoryStats>,
    pub procedures: Option<ProcedureProfile>,
    /// One message per failed or unparseable call
    pub errors: Vec<String>,
}

/// Store a parsed section, or record why it is missing
fn collect<T>(
    snapshot: &Mutex<DashboardSnapshot>,
    label: &str,
    response: Response,
    parse: impl FnOnce(&Response) -> anyhow::Result<T>,
    store: impl FnOnce(&mut DashboardSnapshot, T),
) {
    let mut snapshot = snapshot.lock().unwrap_or_else(|e| e.into_inner());

    if !response.is_success() {
        warn!("{} refresh failed: {}", label, response.message);
        snapshot
            .errors
            .push(format!("{}: {}", label, response.message));
        return;
    }

    match parse(&response) {
        Ok(value) => store(&mut snapshot, value),
        Err(e) => snapshot.errors.push(format!("{}: {}", label, e)),
    }
}

fn first_table(response: &Response) -> anyhow::Result<&crate::models::ResultTable> {
    response
        .first_table()
        .ok_or_else(|| anyhow::anyhow!("response has no result table"))
}

/// Run one dashboard refresh on `client`, blocking until it completes
///
/// Returns `None` if another queue is draining on the client.
pub fn refresh_dashboard(
    client: &Client,
    continue_on_failure: bool,
) -> Option<(DashboardSnapshot, QueueReport)> {
    let snapshot = Arc::new(Mutex::new(DashboardSnapshot::default()));
    let (overview, memory, procedures) = (snapshot.clone(), snapshot.clone(), snapshot.clone());

    let report = client
        .start(continue_on_failure)?
        .enqueue("@SystemInformation", ["OVERVIEW"], move |r| {
            collect(
                &overview,
                "overview",
                r,
                |r| SystemOverview::from_table(first_table(r)?),
                |s, v| s.overview = Some(v),
            )
        })
        .enqueue(
            "@Statistics",
            [Param::from("MEMORY"), Param::Int(0)],
            move |r| {
                collect(
                    &memory,
                    "memory",
                    r,
                    |r| MemoryStats::from_table(first_table(r)?),
                    |s, v| s.memory = Some(v),
                )
            },
        )
        .enqueue(
            "@Statistics",
            [Param::from("PROCEDUREPROFILE"), Param::Int(0)],
            move |r| {
                collect(
                    &procedures,
                    "procedures",
                    r,
                    |r| ProcedureProfile::from_table(first_table(r)?),
                    |s, v| s.procedures = Some(v),
                )
            },
        )
        .run();

    let snapshot = std::mem::take(&mut *snapshot.lock().unwrap_or_else(|e| e.into_inner()));
    Some((snapshot, report))
}
