//! State reporting sink shared by all monitors.
//!
//! Monitors call the reporter synchronously from inside their critical
//! section, so implementations must be quick and must never block on another
//! monitor. Calls are fire-and-forget: a failing sink records the failure
//! internally instead of returning it to the monitor.
//!
//! # Implementations
//!
//! - [`GeneralRepository`] - audit log writer (state table + flight events)
//! - [`MemoryReporter`] - in-memory event recorder used to verify runs

pub mod general;
pub mod memory;

pub use general::GeneralRepository;
pub use memory::{MemoryReporter, ReportedEvent};

use crate::entities::{HostessState, PassengerId, PassengerState, PilotState};

/// Reporter interface consumed by the monitors.
pub trait Reporter: Send + Sync {
    /// A passenger changed state.
    fn report_passenger_state(&self, passenger_id: PassengerId, state: PassengerState);

    /// The hostess changed state.
    fn report_hostess_state(&self, state: HostessState);

    /// The pilot changed state.
    fn report_pilot_state(&self, state: PilotState);

    /// All flights are done; emit the terminal summary.
    fn report_final_summary(&self);
}
