//! In-memory reporter.
//!
//! Records every reported transition in the order the reporter received it.

use super::Reporter;
use crate::entities::{HostessState, PassengerId, PassengerState, PilotState};
use std::sync::{Mutex, PoisonError};

/// One reported transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedEvent {
    Passenger {
        passenger_id: PassengerId,
        state: PassengerState,
    },
    Hostess(HostessState),
    Pilot(PilotState),
    FinalSummary,
}

/// Reporter keeping the full event history in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportedEvent>>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ReportedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: ReportedEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Reporter for MemoryReporter {
    fn report_passenger_state(&self, passenger_id: PassengerId, state: PassengerState) {
        self.record(ReportedEvent::Passenger {
            passenger_id,
            state,
        });
    }

    fn report_hostess_state(&self, state: HostessState) {
        self.record(ReportedEvent::Hostess(state));
    }

    fn report_pilot_state(&self, state: PilotState) {
        self.record(ReportedEvent::Pilot(state));
    }

    fn report_final_summary(&self) {
        self.record(ReportedEvent::FinalSummary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_kept_in_report_order() {
        let reporter = MemoryReporter::new();

        reporter.report_pilot_state(PilotState::AtTransferGate);
        reporter.report_passenger_state(4, PassengerState::InQueue);
        reporter.report_hostess_state(HostessState::CheckPassenger);
        reporter.report_final_summary();

        assert_eq!(
            reporter.events(),
            vec![
                ReportedEvent::Pilot(PilotState::AtTransferGate),
                ReportedEvent::Passenger {
                    passenger_id: 4,
                    state: PassengerState::InQueue
                },
                ReportedEvent::Hostess(HostessState::CheckPassenger),
                ReportedEvent::FinalSummary,
            ]
        );
    }
}
