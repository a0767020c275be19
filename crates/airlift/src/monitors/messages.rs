//! Request types for monitor communication.
//!
//! Every request carries a `respond_to` channel; a blocking operation holds
//! on to it while parked and answers once its wake predicate holds.

use super::Responder;
use crate::entities::{HostessState, PassengerId, PassengerState, PilotState};

/// Outcome of a monitor call that moves its caller to a new life-cycle state.
///
/// The caller's state travels explicitly through the call instead of being
/// looked up by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S, T = ()> {
    /// New state of the calling actor.
    pub state: S,
    /// Value returned by the operation.
    pub value: T,
}

impl<S> Transition<S> {
    pub(crate) fn to(state: S) -> Self {
        Self { state, value: () }
    }
}

impl<S, T> Transition<S, T> {
    pub(crate) fn with(state: S, value: T) -> Self {
        Self { state, value }
    }
}

/// Reply to the pilot once a flight has been fully deboarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    /// Cumulative number of transported passengers, this flight included.
    pub transported_passengers: usize,
    /// Passenger elected last out of this flight.
    pub last_passenger: PassengerId,
}

/// Requests served by the departure monitor.
#[derive(Debug)]
pub enum DepartureMessage {
    /// Hostess: reset the per-flight boarding count and wait for a queued passenger.
    PrepareForPassBoarding {
        respond_to: Responder<Transition<HostessState>>,
    },

    /// Passenger: join the boarding queue and wait to be called.
    WaitInQueue {
        passenger_id: PassengerId,
        respond_to: Responder<Transition<PassengerState>>,
    },

    /// Hostess: call the head of the queue and wait for the documents.
    /// Replies whether the queue is still non-empty.
    CheckDocuments {
        respond_to: Responder<Transition<HostessState, bool>>,
    },

    /// Passenger: hand over the documents and wait for clearance to board.
    ShowDocuments { respond_to: Responder<()> },

    /// Hostess: clear the served passenger and wait until the next step is possible.
    /// Replies whether the queue is non-empty.
    WaitForNextPassenger {
        /// Passengers served this flight, including the one just cleared.
        hostess_count: usize,
        /// Passengers of previous flights.
        checked_passengers: usize,
        respond_to: Responder<Transition<HostessState, bool>>,
    },

    /// Passenger: board the plane.
    BoardThePlane {
        passenger_id: PassengerId,
        respond_to: Responder<Transition<PassengerState>>,
    },

    /// Whether no passenger is queued.
    QueueEmpty { respond_to: Responder<bool> },

    /// Number of queued passengers.
    PassengersInQueue { respond_to: Responder<usize> },

    /// A client group finished and requests shutdown.
    Shutdown { respond_to: Responder<()> },
}

impl DepartureMessage {
    /// Operation name for logs and metrics.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            DepartureMessage::PrepareForPassBoarding { .. } => "prepare_for_pass_boarding",
            DepartureMessage::WaitInQueue { .. } => "wait_in_queue",
            DepartureMessage::CheckDocuments { .. } => "check_documents",
            DepartureMessage::ShowDocuments { .. } => "show_documents",
            DepartureMessage::WaitForNextPassenger { .. } => "wait_for_next_passenger",
            DepartureMessage::BoardThePlane { .. } => "board_the_plane",
            DepartureMessage::QueueEmpty { .. } => "queue_empty",
            DepartureMessage::PassengersInQueue { .. } => "passengers_in_queue",
            DepartureMessage::Shutdown { .. } => "shutdown",
        }
    }
}

/// Requests served by the plane monitor.
#[derive(Debug)]
pub enum PlaneMessage {
    /// Passengers currently on board.
    GetInF { respond_to: Responder<usize> },

    /// Pilot: park at the transfer gate.
    ParkAtTransferGate {
        respond_to: Responder<Transition<PilotState>>,
    },

    /// Pilot: tell the hostess boarding may start.
    InformPlaneReadyForBoarding {
        respond_to: Responder<Transition<PilotState>>,
    },

    /// Hostess: wait until the plane is ready for the next boarding.
    /// Replies the cumulative number of passengers of completed boardings.
    WaitForNextFlight {
        first: bool,
        checked_passengers: usize,
        respond_to: Responder<Transition<HostessState, usize>>,
    },

    /// Pilot: wait until boarding is complete.
    WaitForAllInBoarding {
        respond_to: Responder<Transition<PilotState>>,
    },

    /// Hostess: boarding is complete with `headcount` passengers.
    InformPlaneReadyToTakeOff {
        headcount: usize,
        respond_to: Responder<Transition<HostessState>>,
    },

    /// Passenger: take a seat and wait for the end of the flight.
    WaitForEndOfFlight { respond_to: Responder<()> },

    /// Pilot: start deboarding and wait for the plane to empty.
    AnnounceArrival {
        transported_passengers: usize,
        respond_to: Responder<Transition<PilotState, Arrival>>,
    },

    /// Last passenger out: the plane is empty.
    NotifyPilot {
        passenger_id: PassengerId,
        respond_to: Responder<()>,
    },

    /// Pilot: emit the terminal summary.
    ReportFinalReport { respond_to: Responder<()> },

    /// A client group finished and requests shutdown.
    Shutdown { respond_to: Responder<()> },
}

impl PlaneMessage {
    /// Operation name for logs and metrics.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            PlaneMessage::GetInF { .. } => "get_in_f",
            PlaneMessage::ParkAtTransferGate { .. } => "park_at_transfer_gate",
            PlaneMessage::InformPlaneReadyForBoarding { .. } => "inform_plane_ready_for_boarding",
            PlaneMessage::WaitForNextFlight { .. } => "wait_for_next_flight",
            PlaneMessage::WaitForAllInBoarding { .. } => "wait_for_all_in_boarding",
            PlaneMessage::InformPlaneReadyToTakeOff { .. } => "inform_plane_ready_to_take_off",
            PlaneMessage::WaitForEndOfFlight { .. } => "wait_for_end_of_flight",
            PlaneMessage::AnnounceArrival { .. } => "announce_arrival",
            PlaneMessage::NotifyPilot { .. } => "notify_pilot",
            PlaneMessage::ReportFinalReport { .. } => "report_final_report",
            PlaneMessage::Shutdown { .. } => "shutdown",
        }
    }
}

/// Requests served by the destination monitor.
#[derive(Debug)]
pub enum DestinationMessage {
    /// Passenger: leave the plane. Replies true for the last passenger of the flight.
    LeaveThePlane {
        passenger_id: PassengerId,
        flight_headcount: usize,
        respond_to: Responder<Transition<PassengerState, bool>>,
    },

    /// A client group finished and requests shutdown.
    Shutdown { respond_to: Responder<()> },
}

impl DestinationMessage {
    /// Operation name for logs and metrics.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            DestinationMessage::LeaveThePlane { .. } => "leave_the_plane",
            DestinationMessage::Shutdown { .. } => "shutdown",
        }
    }
}
