//! Verification helpers over the events recorded by a `MemoryReporter`.

use airlift::config::SimulationParams;
use airlift::entities::{HostessState, PassengerId, PassengerState, PilotState};
use airlift::repository::ReportedEvent;

/// States reported for one passenger, in report order.
pub fn passenger_timeline(events: &[ReportedEvent], passenger_id: PassengerId) -> Vec<PassengerState> {
    events
        .iter()
        .filter_map(|event| match event {
            ReportedEvent::Passenger {
                passenger_id: id,
                state,
            } if *id == passenger_id => Some(*state),
            _ => None,
        })
        .collect()
}

/// Passenger ids in the order they reported `state`.
pub fn passengers_in_order(events: &[ReportedEvent], state: PassengerState) -> Vec<PassengerId> {
    events
        .iter()
        .filter_map(|event| match event {
            ReportedEvent::Passenger {
                passenger_id,
                state: reported,
            } if *reported == state => Some(*passenger_id),
            _ => None,
        })
        .collect()
}

/// Passengers boarded per flight, split at every hostess READY_TO_FLY.
pub fn boarded_per_flight(events: &[ReportedEvent]) -> Vec<usize> {
    let mut flights = Vec::new();
    let mut boarded = 0;
    for event in events {
        match event {
            ReportedEvent::Passenger {
                state: PassengerState::InFlight,
                ..
            } => boarded += 1,
            ReportedEvent::Hostess(HostessState::ReadyToFly) => {
                flights.push(boarded);
                boarded = 0;
            }
            _ => {}
        }
    }
    flights
}

/// Every passenger reports IN_QUEUE, IN_FLIGHT, AT_DESTINATION exactly once, in order.
pub fn assert_passenger_lifecycles(events: &[ReportedEvent], passengers: usize) {
    for passenger_id in 0..passengers {
        assert_eq!(
            passenger_timeline(events, passenger_id),
            vec![
                PassengerState::InQueue,
                PassengerState::InFlight,
                PassengerState::AtDestination
            ],
            "unexpected timeline for passenger {passenger_id}"
        );
    }
}

/// Passengers board in the order they queued.
pub fn assert_fifo_boarding(events: &[ReportedEvent]) {
    assert_eq!(
        passengers_in_order(events, PassengerState::InQueue),
        passengers_in_order(events, PassengerState::InFlight),
        "boarding order differs from queue order"
    );
}

/// Every flight carries between MIN and MAX passengers; the last one may carry fewer than MIN.
pub fn assert_flight_bounds(flights: &[usize], params: &SimulationParams) {
    assert!(!flights.is_empty(), "no flight departed");
    assert_eq!(
        flights.iter().sum::<usize>(),
        params.passengers,
        "flights {flights:?} do not add up to every passenger"
    );

    let (last, rest) = flights.split_last().expect("no flight departed");
    for (index, headcount) in rest.iter().enumerate() {
        assert!(
            (params.min_boarding..=params.max_seats).contains(headcount),
            "flight {} carried {headcount} passengers",
            index + 1
        );
    }
    assert!(
        (1..=params.max_seats).contains(last),
        "last flight carried {last} passengers"
    );
}

/// The final summary is reported once, right after the pilot's last AT_TRANSFER_GATE.
pub fn assert_final_summary_after_last_park(events: &[ReportedEvent]) {
    let summaries: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, event)| **event == ReportedEvent::FinalSummary)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(summaries.len(), 1, "final summary reported {} times", summaries.len());

    let last_pilot_event = events
        .iter()
        .rposition(|event| matches!(event, ReportedEvent::Pilot(_)))
        .expect("pilot never reported");
    assert_eq!(
        events.get(last_pilot_event),
        Some(&ReportedEvent::Pilot(PilotState::AtTransferGate))
    );
    assert!(
        summaries[0] > last_pilot_event,
        "final summary reported before the pilot parked"
    );
}
