//! Running SQL scripts as a call queue

use std::sync::{Arc, Mutex};

use super::split_statements;
use crate::client::Client;
use crate::models::Response;

/// What happened to one statement of a script
#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutcome {
    Succeeded(Response),
    Failed(Response),
    /// Never sent because an earlier statement failed
    Skipped,
}

impl StatementOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            StatementOutcome::Succeeded(r) | StatementOutcome::Failed(r) => Some(r),
            StatementOutcome::Skipped => None,
        }
    }
}

/// Per-statement results of a script, in script order
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptReport {
    pub statements: Vec<(String, StatementOutcome)>,
    pub success: bool,
}

impl ScriptReport {
    pub fn failed_count(&self) -> usize {
        self.statements
            .iter()
            .filter(|(_, o)| matches!(o, StatementOutcome::Failed(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.statements
            .iter()
            .filter(|(_, o)| matches!(o, StatementOutcome::Skipped))
            .count()
    }
}

/// Run every statement of `script` as `@AdHoc`, in order
///
/// Returns `None` if another queue is draining on the client.
pub fn run_script(
    client: &Client,
    script: &str,
    continue_on_failure: bool,
) -> Option<ScriptReport> {
    let statements = split_statements(script);
    let responses: Arc<Mutex<Vec<Option<Response>>>> =
        Arc::new(Mutex::new(vec![None; statements.len()]));

    let mut queue = client.start(continue_on_failure)?;
    for (index, sql) in statements.iter().enumerate() {
        let slot = responses.clone();
        queue = queue.enqueue("@AdHoc", [sql.as_str()], move |response| {
            let mut responses = slot.lock().unwrap_or_else(|e| e.into_inner());
            responses[index] = Some(response);
        });
    }
    let report = queue.run();

    let responses = std::mem::take(&mut *responses.lock().unwrap_or_else(|e| e.into_inner()));
    let statements = statements
        .into_iter()
        .zip(responses)
        .map(|(sql, response)| {
            let outcome = match response {
                Some(r) if r.is_success() => StatementOutcome::Succeeded(r),
                Some(r) => StatementOutcome::Failed(r),
                None => StatementOutcome::Skipped,
            };
            (sql, outcome)
        })
        .collect();

    Some(ScriptReport {
        statements,
        success: report.success,
    })
}
