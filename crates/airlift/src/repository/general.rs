//! General repository: the audit log of a run.
//!
//! Keeps the visible state of every actor and appends one status line per
//! reported transition, plus flight events derived from specific
//! transitions:
//!
//! | Transition | Event |
//! |------------|-------|
//! | pilot ATRG -> RDFB | `Flight k: boarding started.` |
//! | hostess WTPS -> CKPS | `Flight k: passenger p checked.` |
//! | hostess WTPS -> RDTF | `Flight k: departed with n passengers.` |
//! | pilot FLFW -> DRPP | `Flight k: arrived.` |
//! | pilot DRPP -> FLBK | `Flight k: returning.` |

use super::Reporter;
use crate::entities::{HostessState, PassengerId, PassengerState, PilotState};
use crate::errors::AirliftError;

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::{Mutex, PoisonError};
use tracing::{error, info};

/// Audit log writer implementing [`Reporter`].
pub struct GeneralRepository {
    log: Mutex<AuditLog>,
}

struct AuditLog {
    sink: Box<dyn Write + Send>,
    passengers: Vec<PassengerState>,
    hostess: HostessState,
    pilot: PilotState,
    /// Passengers queued at the departure counter.
    in_q: usize,
    /// Passengers on board.
    in_f: usize,
    /// Passengers arrived at the destination (cumulative).
    ptal: usize,
    /// Current flight number, starting at 1.
    flight: usize,
    /// Mirror of the boarding queue, used to name the checked passenger.
    waiting: VecDeque<PassengerId>,
    /// Headcount of each departed flight.
    departures: Vec<usize>,
    /// First write failure, surfaced by `finish`.
    failure: Option<String>,
}

impl GeneralRepository {
    /// Create the audit log file at `path` and write its header.
    pub fn create(path: &str, passengers: usize, run_id: &str) -> Result<Self, AirliftError> {
        let file = File::create(path).map_err(|e| {
            AirliftError::Repository(format!("creating log file {path} failed: {e}"))
        })?;

        info!(
            target: "airlift.repository",
            path = %path,
            "Audit log created"
        );

        Ok(Self::new(Box::new(BufWriter::new(file)), passengers, run_id))
    }

    /// Build a repository over an arbitrary sink and write its header.
    #[must_use]
    pub fn new(sink: Box<dyn Write + Send>, passengers: usize, run_id: &str) -> Self {
        let mut log = AuditLog {
            sink,
            passengers: vec![PassengerState::GoingToAirport; passengers],
            hostess: HostessState::WaitForFlight,
            pilot: PilotState::AtTransferGate,
            in_q: 0,
            in_f: 0,
            ptal: 0,
            flight: 1,
            waiting: VecDeque::with_capacity(passengers),
            departures: Vec::new(),
            failure: None,
        };
        log.write_header(run_id);
        log.write_status();

        Self {
            log: Mutex::new(log),
        }
    }

    /// Flush the sink and report the first write failure, if any.
    pub fn finish(&self) -> Result<(), AirliftError> {
        let mut log = self.lock();
        if let Err(e) = log.sink.flush() {
            log.record_failure(&e);
        }
        match &log.failure {
            Some(reason) => Err(AirliftError::Repository(reason.clone())),
            None => Ok(()),
        }
    }

    /// Headcounts of the flights that departed so far.
    #[must_use]
    pub fn departures(&self) -> Vec<usize> {
        self.lock().departures.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AuditLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Reporter for GeneralRepository {
    fn report_passenger_state(&self, passenger_id: PassengerId, state: PassengerState) {
        self.lock().set_passenger_state(passenger_id, state);
    }

    fn report_hostess_state(&self, state: HostessState) {
        self.lock().set_hostess_state(state);
    }

    fn report_pilot_state(&self, state: PilotState) {
        self.lock().set_pilot_state(state);
    }

    fn report_final_summary(&self) {
        self.lock().write_final_summary();
    }
}

impl AuditLog {
    fn set_passenger_state(&mut self, passenger_id: PassengerId, state: PassengerState) {
        let Some(slot) = self.passengers.get_mut(passenger_id) else {
            error!(
                target: "airlift.repository",
                passenger_id,
                "State reported for unknown passenger"
            );
            self.failure
                .get_or_insert_with(|| format!("state reported for unknown passenger {passenger_id}"));
            return;
        };
        let previous = std::mem::replace(slot, state);

        match (previous, state) {
            (PassengerState::GoingToAirport, PassengerState::InQueue) => {
                self.in_q += 1;
                self.waiting.push_back(passenger_id);
            }
            (PassengerState::InQueue, PassengerState::InFlight) => {
                self.in_q = self.in_q.saturating_sub(1);
                self.in_f += 1;
            }
            (PassengerState::InFlight, PassengerState::AtDestination) => {
                self.in_f = self.in_f.saturating_sub(1);
                self.ptal += 1;
            }
            _ => {}
        }

        self.write_status();
    }

    fn set_hostess_state(&mut self, state: HostessState) {
        let previous = std::mem::replace(&mut self.hostess, state);

        match (previous, state) {
            (HostessState::WaitForPassenger, HostessState::CheckPassenger) => {
                if let Some(passenger_id) = self.waiting.pop_front() {
                    self.write_event(&format!("passenger {passenger_id} checked."));
                }
            }
            (HostessState::WaitForPassenger, HostessState::ReadyToFly) => {
                self.departures.push(self.in_f);
                self.write_event(&format!("departed with {} passengers.", self.in_f));
            }
            _ => {}
        }

        self.write_status();
    }

    fn set_pilot_state(&mut self, state: PilotState) {
        let previous = std::mem::replace(&mut self.pilot, state);

        match (previous, state) {
            (PilotState::AtTransferGate, PilotState::ReadyForBoarding) => {
                self.write_event("boarding started.");
            }
            (PilotState::FlyingForward, PilotState::Deboarding) => {
                self.write_event("arrived.");
            }
            (PilotState::Deboarding, PilotState::FlyingBack) => {
                self.write_event("returning.");
                self.flight += 1;
            }
            _ => {}
        }

        self.write_status();
    }

    fn write_header(&mut self, run_id: &str) {
        let mut columns = String::from(" PT   HT  ");
        for passenger_id in 0..self.passengers.len() {
            columns.push_str(&format!(" P{passenger_id:02} "));
        }
        columns.push_str("InQ InF PTAL");

        let started_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let header = format!(
            "{:>40}Airlift - Description of the internal state\n\nRun {run_id} started at {started_at}\n\n{columns}",
            ""
        );
        self.write_line(&header);
    }

    fn write_event(&mut self, event: &str) {
        let line = format!("\nFlight {}: {event}", self.flight);
        self.write_line(&line);
    }

    fn write_status(&mut self) {
        let line = self.status_line();
        self.write_line(&line);
    }

    fn status_line(&self) -> String {
        let mut line = String::with_capacity(10 + 5 * self.passengers.len() + 12);
        line.push_str(self.pilot.abbreviation());
        line.push(' ');
        line.push_str(self.hostess.abbreviation());
        line.push(' ');
        for state in &self.passengers {
            line.push_str(state.abbreviation());
            line.push(' ');
        }
        line.push_str(&format!("{:>3} {:>3} {:>4}", self.in_q, self.in_f, self.ptal));
        line
    }

    fn write_final_summary(&mut self) {
        let mut summary = String::from("\nAirlift sum up:");
        for (index, headcount) in self.departures.iter().enumerate() {
            summary.push_str(&format!(
                "\nFlight {} transported {headcount} passengers",
                index + 1
            ));
        }
        summary.push('.');
        self.write_line(&summary);
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.sink, "{line}") {
            self.record_failure(&e);
        }
    }

    fn record_failure(&mut self, e: &io::Error) {
        if self.failure.is_none() {
            error!(
                target: "airlift.repository",
                error = %e,
                "Writing the audit log failed"
            );
            self.failure = Some(format!("writing the audit log failed: {e}"));
        }
    }
}
