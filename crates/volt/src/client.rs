//! Procedure-call client
//!
//! A [`Client`] issues named procedure calls against one [`Endpoint`],
//! singly or in ordered batches ([`CallQueue`]). Every call ends in exactly
//! one [`Response`]: validation failures, timeouts and transport errors are
//! all reported as responses, never as errors or panics.

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::catalog::{PreparedCall, ProcedureCatalog, Signature, SignatureError};
use crate::guard::TimeoutGuard;
use crate::models::{Endpoint, Param, Response};
use crate::queue::CallQueue;
use crate::transport::{HttpTransport, Transport};

/// Timeouts applied by the guard, chosen per procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Monitoring and administrative calls
    pub standard: Duration,
    /// Procedures marked long-running (ad hoc SQL, snapshots, catalog updates)
    pub long_running: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            standard: Duration::from_secs(20),
            long_running: Duration::from_secs(6000),
        }
    }
}

impl TimeoutPolicy {
    pub fn for_call(&self, call: &PreparedCall) -> Duration {
        if call.long_running {
            self.long_running
        } else {
            self.standard
        }
    }
}

struct ClientInner {
    endpoint: Arc<Endpoint>,
    transport: Arc<dyn Transport>,
    catalog: RwLock<ProcedureCatalog>,
    timeouts: TimeoutPolicy,
    /// Set while a queue is open or draining
    queue_claimed: AtomicBool,
}

/// Client bound to one endpoint
///
/// Cloning is cheap; clones share the endpoint, transport, catalog and
/// queue state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Create a client that talks HTTP to `endpoint`
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_timeouts(endpoint, TimeoutPolicy::default())
    }

    /// Create an HTTP client with a custom timeout policy
    pub fn with_timeouts(endpoint: Endpoint, timeouts: TimeoutPolicy) -> Self {
        Self::build(endpoint, Arc::new(HttpTransport::new()), timeouts)
    }

    /// Create a client over an arbitrary transport
    pub fn with_transport(
        endpoint: Endpoint,
        transport: Arc<dyn Transport>,
        timeouts: TimeoutPolicy,
    ) -> Self {
        Self::build(endpoint, transport, timeouts)
    }

    fn build(endpoint: Endpoint, transport: Arc<dyn Transport>, timeouts: TimeoutPolicy) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                endpoint: Arc::new(endpoint),
                transport,
                catalog: RwLock::new(ProcedureCatalog::system()),
                timeouts,
                queue_claimed: AtomicBool::new(false),
            }),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    pub fn timeouts(&self) -> TimeoutPolicy {
        self.inner.timeouts
    }

    /// Add or replace a procedure signature
    pub fn register_procedure(&self, name: impl Into<String>, signature: Signature) {
        if let Ok(mut catalog) = self.inner.catalog.write() {
            catalog.register(name, signature);
        }
    }

    /// Run `f` against the current catalog
    pub fn with_catalog<R>(&self, f: impl FnOnce(&ProcedureCatalog) -> R) -> R {
        let catalog = self
            .inner
            .catalog
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&catalog)
    }

    /// Fetch user procedure signatures from the server's catalog
    ///
    /// Calls `@SystemCatalog PROCEDURECOLUMNS` and registers every procedure
    /// it describes. Returns the number registered, or the failed response.
    pub fn load_user_procedures(&self) -> Result<usize, Response> {
        let response = self.execute("@SystemCatalog", &[Param::from("PROCEDURECOLUMNS")]);
        if !response.is_success() {
            return Err(response);
        }

        let Some(table) = response.first_table() else {
            return Ok(0);
        };
        let mut catalog = self
            .inner
            .catalog
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let count = catalog.register_procedure_columns(table);
        debug!("Registered {} user procedure(s)", count);
        Ok(count)
    }

    /// Make sure `name` is in the catalog, loading user procedures on a miss
    ///
    /// Returns whether the procedure is known afterwards. The server is
    /// contacted only when the name is not already cataloged.
    pub fn ensure_procedure(&self, name: &str) -> bool {
        if self.with_catalog(|catalog| catalog.lookup(name).is_some()) {
            return true;
        }

        match self.load_user_procedures() {
            Ok(_) => self.with_catalog(|catalog| catalog.lookup(name).is_some()),
            Err(response) => {
                warn!("Could not load user procedures: {}", response.message);
                false
            }
        }
    }

    /// Validate a call against the catalog and encode its parameters
    pub fn prepare(&self, name: &str, params: &[Param]) -> Result<PreparedCall, SignatureError> {
        self.with_catalog(|catalog| catalog.prepare(name, params))
    }

    /// Execute a call and block until its single response is available
    ///
    /// Invalid calls are answered immediately without touching the network.
    pub fn execute(&self, name: &str, params: &[Param]) -> Response {
        match self.prepare(name, params) {
            Ok(call) => self.dispatch(call),
            Err(e) => {
                debug!("Rejected call to {}: {}", name, e);
                Response::rejected(e.to_string())
            }
        }
    }

    /// Send a prepared call under the timeout guard
    pub fn dispatch(&self, call: PreparedCall) -> Response {
        let timeout = self.inner.timeouts.for_call(&call);
        let guard = TimeoutGuard::new(timeout);
        let transport = self.inner.transport.clone();
        let endpoint = self.inner.endpoint.clone();
        let label = call.procedure.clone();

        guard.run(&label, move || match transport.send(&endpoint, &call, timeout) {
            Ok(response) => response,
            Err(e) => {
                warn!("{} failed: {}", call.procedure, e);
                Response::transport_failure(e.to_string())
            }
        })
    }

    /// Issue a call without blocking
    ///
    /// `callback` receives exactly one response. If the call is invalid the
    /// callback runs on the caller's thread before `call` returns and no
    /// request is sent; otherwise it runs on a worker thread.
    pub fn call<I, P, F>(&self, name: &str, params: I, callback: F) -> CallHandle
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
        F: FnOnce(Response) + Send + 'static,
    {
        let params: Vec<Param> = params.into_iter().map(Into::into).collect();

        match self.prepare(name, &params) {
            Ok(call) => {
                let client = self.clone();
                let worker = thread::spawn(move || callback(client.dispatch(call)));
                CallHandle {
                    worker: Some(worker),
                }
            }
            Err(e) => {
                debug!("Rejected call to {}: {}", name, e);
                callback(Response::rejected(e.to_string()));
                CallHandle { worker: None }
            }
        }
    }

    /// Start a new call queue
    ///
    /// The queue holds the client until it has drained, or until it is
    /// dropped without being ended. Returns `None` while another queue
    /// holds it.
    pub fn start(&self, continue_on_failure: bool) -> Option<CallQueue> {
        let claimed = self
            .inner
            .queue_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !claimed {
            warn!(
                "Queue already executing on {}; start rejected",
                self.inner.endpoint.key()
            );
            return None;
        }
        Some(CallQueue::new(self.clone(), continue_on_failure))
    }

    /// Whether a queue on this client is open or draining
    pub fn is_draining(&self) -> bool {
        self.inner.queue_claimed.load(Ordering::Acquire)
    }

    pub(crate) fn release_queue(&self) {
        self.inner.queue_claimed.store(false, Ordering::Release);
    }
}

/// Handle to a call issued with [`Client::call`]
#[derive(Debug)]
pub struct CallHandle {
    worker: Option<JoinHandle<()>>,
}

impl CallHandle {
    /// Whether the callback has already run
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Block until the callback has run
    pub fn wait(self) {
        if let Some(worker) = self.worker
            && worker.join().is_err()
        {
            warn!("Call callback panicked");
        }
    }
}
