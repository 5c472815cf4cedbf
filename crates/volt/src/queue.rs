//! Call queues
//!
//! A [`CallQueue`] batches procedure calls against one client and runs
//! them strictly in submission order, one at a time, with a single
//! completion handler:
//!
//! ```no_run
//! use volt::{Client, Endpoint};
//!
//! let client = Client::new(Endpoint::new("localhost", 8080));
//! if let Some(queue) = client.start(false) {
//!     queue
//!         .enqueue("Statistics", ["TABLE", "0"], |r| println!("tables: {}", r.status.code()))
//!         .enqueue("Statistics", ["INDEX", "0"], |r| println!("indexes: {}", r.status.code()))
//!         .end(|_state, success| println!("done: {}", success), ())
//!         .wait();
//! }
//! ```
//!
//! Unless the queue continues on failure, the first failed call stops
//! dispatch and the remaining calls are skipped.

use log::{debug, info, warn};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crate::client::Client;
use crate::models::{Param, Response};

type ItemCallback = Box<dyn FnOnce(Response) + Send>;

struct PendingCall {
    procedure: String,
    params: Vec<Param>,
    callback: Option<ItemCallback>,
}

/// Outcome of a drained queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueReport {
    /// AND of every dispatched call's outcome
    pub success: bool,
    /// Calls that were sent (or rejected locally)
    pub dispatched: usize,
    /// Calls never sent because an earlier call failed
    pub skipped: usize,
}

/// An ordered batch of calls, accumulated until [`CallQueue::end`]
pub struct CallQueue {
    client: Client,
    continue_on_failure: bool,
    pending: VecDeque<PendingCall>,
}

impl CallQueue {
    pub(crate) fn new(client: Client, continue_on_failure: bool) -> Self {
        Self {
            client,
            continue_on_failure,
            pending: VecDeque::new(),
        }
    }

    /// Append a call whose response goes to `callback`
    pub fn enqueue<I, P, F>(mut self, name: &str, params: I, callback: F) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
        F: FnOnce(Response) + Send + 'static,
    {
        self.push(name, params, Some(Box::new(callback)));
        self
    }

    /// Append a call that only contributes to the overall outcome
    pub fn enqueue_silent<I, P>(mut self, name: &str, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.push(name, params, None);
        self
    }

    fn push<I, P>(&mut self, name: &str, params: I, callback: Option<ItemCallback>)
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        self.pending.push_back(PendingCall {
            procedure: name.to_string(),
            params: params.into_iter().map(Into::into).collect(),
            callback,
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn continue_on_failure(&self) -> bool {
        self.continue_on_failure
    }

    /// Start draining on a dispatcher thread
    ///
    /// `done(state, success)` fires exactly once after the last call,
    /// including when nothing was enqueued. The client is released before
    /// `done` runs, so `done` may start the next queue.
    pub fn end<S, D>(self, done: D, state: S) -> QueueHandle
    where
        S: Send + 'static,
        D: FnOnce(S, bool) + Send + 'static,
    {
        let worker = thread::spawn(move || {
            let report = self.drain();
            if panic::catch_unwind(AssertUnwindSafe(|| done(state, report.success))).is_err() {
                warn!("Queue completion handler panicked");
            }
            report
        });
        QueueHandle { worker }
    }

    /// Drain on the calling thread and return the report
    pub fn run(self) -> QueueReport {
        self.drain()
    }

    /// Dispatch every pending call in order; dropping `self` releases the client
    fn drain(mut self) -> QueueReport {
        let mut report = QueueReport {
            success: true,
            dispatched: 0,
            skipped: 0,
        };

        while let Some(call) = self.pending.pop_front() {
            if !report.success && !self.continue_on_failure {
                debug!("Skipping {} after earlier failure", call.procedure);
                report.skipped += 1;
                continue;
            }

            let response = self.client.execute(&call.procedure, &call.params);
            report.dispatched += 1;
            let mut succeeded = response.is_success();

            if let Some(callback) = call.callback
                && let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(response)))
            {
                warn!(
                    "Callback for {} panicked: {}",
                    call.procedure,
                    panic_message(payload.as_ref())
                );
                succeeded = false;
            }

            report.success &= succeeded;
        }

        if report.skipped > 0 {
            warn!("Queue stopped early; {} call(s) skipped", report.skipped);
        }
        info!(
            "Queue on {} finished: success={} dispatched={}",
            self.client.endpoint().key(),
            report.success,
            report.dispatched
        );

        report
    }
}

impl Drop for CallQueue {
    fn drop(&mut self) {
        self.client.release_queue();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handle to a draining queue
#[derive(Debug)]
pub struct QueueHandle {
    worker: JoinHandle<QueueReport>,
}

impl QueueHandle {
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Block until the completion handler has fired
    pub fn wait(self) -> QueueReport {
        self.worker.join().unwrap_or(QueueReport {
            success: false,
            dispatched: 0,
            skipped: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PreparedCall;
    use crate::client::TimeoutPolicy;
    use crate::models::Endpoint;
    use crate::transport::{Transport, TransportError};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Succeeds for every call
    struct AlwaysOk;

    impl Transport for AlwaysOk {
        fn send(
            &self,
            _: &Endpoint,
            _: &PreparedCall,
            _: Duration,
        ) -> Result<Response, TransportError> {
            Ok(Response::success(Vec::new()))
        }
    }

    fn client() -> Client {
        Client::with_transport(
            Endpoint::new("localhost", 8080),
            Arc::new(AlwaysOk),
            TimeoutPolicy::default(),
        )
    }

    #[test]
    fn test_empty_queue_completes_once() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();

        let report = client()
            .start(false)
            .unwrap()
            .end(
                move |state: &'static str, success| sink.lock().unwrap().push((state, success)),
                "empty",
            )
            .wait();

        assert_eq!(*fired.lock().unwrap(), vec![("empty", true)]);
        assert_eq!(report.dispatched, 0);
    }

    #[test]
    fn test_chaining_and_len() {
        let queue = client()
            .start(true)
            .unwrap()
            .enqueue_silent("@Ping", Vec::<Param>::new())
            .enqueue("@Statistics", ["CPU", "0"], |_| {});
        assert_eq!(queue.len(), 2);
        assert!(queue.continue_on_failure());
        assert!(queue.run().success);
    }

    #[test]
    fn test_callback_panic_counts_as_failure() {
        let reached = Arc::new(Mutex::new(false));
        let flag = reached.clone();

        let report = client()
            .start(true)
            .unwrap()
            .enqueue("@Ping", Vec::<Param>::new(), |_| panic!("renderer failed"))
            .enqueue("@Ping", Vec::<Param>::new(), move |_| *flag.lock().unwrap() = true)
            .run();

        assert!(!report.success);
        assert_eq!(report.dispatched, 2);
        assert!(*reached.lock().unwrap());
    }

    #[test]
    fn test_rejected_call_stops_queue() {
        let report = client()
            .start(false)
            .unwrap()
            .enqueue_silent("@Statistics", ["TABLE"])
            .enqueue_silent("@Ping", Vec::<Param>::new())
            .run();

        assert!(!report.success);
        assert_eq!(report.dispatched, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_client_released_after_run() {
        let client = client();
        client.start(false).unwrap().run();
        assert!(!client.is_draining());
        assert!(client.start(false).is_some());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
