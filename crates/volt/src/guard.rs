//! Timeout guard for in-flight requests
//!
//! The request runs on its own thread and reports over a one-shot channel.
//! Whichever comes first, the reply or the deadline, decides the single
//! response handed back; a reply that arrives after the deadline finds the
//! receiver gone and is dropped.

use log::{debug, warn};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::models::Response;

/// Races a blocking request against a deadline
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    timeout: Duration,
}

impl TimeoutGuard {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `request` and return exactly one response
    ///
    /// Returns a synthetic timeout response if `request` has not finished
    /// within the timeout, and a transport failure if it panics.
    pub fn run<F>(&self, label: &str, request: F) -> Response
    where
        F: FnOnce() -> Response + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel::<Response>(1);
        let worker_label = label.to_string();

        let spawned = thread::Builder::new()
            .name(format!("volt-call {}", label))
            .spawn(move || {
                let response = request();
                if tx.send(response).is_err() {
                    debug!("Discarding late response for {}", worker_label);
                }
            });

        if let Err(e) = spawned {
            warn!("Failed to start request thread for {}: {}", label, e);
            return Response::transport_failure(format!("Failed to start request: {}", e));
        }

        match rx.recv_timeout(self.timeout) {
            Ok(response) => response,
            Err(RecvTimeoutError::Timeout) => {
                warn!("{} timed out after {:?}", label, self.timeout);
                Response::timed_out(self.timeout)
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Request thread for {} exited without a response", label);
                Response::transport_failure("Request aborted without a response")
            }
        }
    }
}
