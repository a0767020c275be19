//! Shared monitors of the airlift.
//!
//! Each monitor is a single task that owns its state and serves requests
//! from an mpsc mailbox, so its operations are strictly serialized. An
//! operation that must block is parked together with its reply channel.
//! After every message the monitor re-tests the predicate of every parked
//! request until none can proceed, which is the broadcast-and-recheck
//! discipline of a condition-variable monitor:
//!
//! ```text
//! request ──▶ mailbox ──▶ apply entry effects ──▶ park
//!                                                  │
//!              reply ◀── exit effects ◀── predicate holds? (re-tested after every message)
//! ```
//!
//! # Modules
//!
//! - [`departure`] - check-in counter: boarding queue and document check
//! - [`plane`] - boarding, flight and deboarding hand-offs
//! - [`destination`] - per-flight disembark count, elects the last passenger
//! - [`messages`] - request types for the three monitors

pub mod departure;
pub mod destination;
pub mod messages;
pub mod plane;

pub use departure::{DepartureMonitor, DepartureMonitorHandle};
pub use destination::{DestinationMonitor, DestinationMonitorHandle};
pub use messages::{Arrival, Transition};
pub use plane::{PlaneMonitor, PlaneMonitorHandle};

use crate::errors::AirliftError;
use std::fmt;
use tokio::sync::{mpsc, oneshot};

/// Number of client groups (passengers, hostess, pilot) that must request
/// shutdown before a monitor stops serving.
pub const SHUTDOWN_QUORUM: usize = 3;

/// Reply channel of a monitor request.
pub type Responder<T> = oneshot::Sender<Result<T, AirliftError>>;

/// Monitor identity for logs, metrics and transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorKind {
    Departure,
    Plane,
    Destination,
}

impl MonitorKind {
    /// Returns the monitor kind as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MonitorKind::Departure => "departure",
            MonitorKind::Plane => "plane",
            MonitorKind::Destination => "destination",
        }
    }
}

impl fmt::Display for MonitorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Send one request to a monitor and wait for its reply.
///
/// A closed mailbox or a dropped reply channel is a transport failure.
pub(crate) async fn request<M, T>(
    sender: &mpsc::Sender<M>,
    monitor: MonitorKind,
    operation: &'static str,
    build: impl FnOnce(Responder<T>) -> M,
) -> Result<T, AirliftError> {
    let (tx, rx) = oneshot::channel();
    sender
        .send(build(tx))
        .await
        .map_err(|e| AirliftError::Transport {
            monitor,
            operation,
            reason: format!("channel send failed: {e}"),
        })?;

    rx.await.map_err(|e| AirliftError::Transport {
        monitor,
        operation,
        reason: format!("response receive failed: {e}"),
    })?
}

/// Counts shutdown requests from client groups.
#[derive(Debug)]
pub(crate) struct ShutdownQuorum {
    requests: usize,
    quorum: usize,
}

impl ShutdownQuorum {
    pub(crate) fn new(quorum: usize) -> Self {
        Self {
            requests: 0,
            quorum,
        }
    }

    /// Register one request; returns true once the quorum is reached.
    pub(crate) fn register(&mut self) -> bool {
        self.requests += 1;
        self.requests >= self.quorum
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests
    }
}
