//! Integration tests for whole simulation runs.
//!
//! Runs the monitors and every actor together and verifies the properties
//! that must hold for any interleaving, plus the deterministic flight plan
//! of a run where everybody is queued before boarding starts.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::time::Duration;

use airlift::entities::{HostessState, PassengerState, PilotState};
use airlift::errors::AirliftError;
use airlift::repository::ReportedEvent;
use airlift::simulation::run_simulation;
use airlift_test_utils::*;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Reference run: every passenger queued before boarding
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_queue_flies_ten_ten_one() {
    let params = default_params();
    let run = run_with_full_queue(params).await;

    assert_eq!(run.pilot.flights, vec![10, 10, 1]);
    assert_eq!(run.hostess.boardings, vec![10, 10, 1]);
    assert_eq!(boarded_per_flight(&run.events), vec![10, 10, 1]);
    assert_eq!(run.pilot.transported_passengers, 21);
    assert_eq!(run.hostess.checked_passengers, 21);

    assert_passenger_lifecycles(&run.events, 21);
    assert_fifo_boarding(&run.events);
    assert_final_summary_after_last_park(&run.events);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_queue_final_states() {
    let run = run_with_full_queue(test_params(8, 3, 4)).await;

    assert_eq!(run.pilot.flights, vec![4, 4]);
    assert_eq!(run.pilot.final_state, PilotState::AtTransferGate);
    assert_eq!(run.hostess.final_state, HostessState::WaitForFlight);
    assert!(run
        .passengers
        .iter()
        .all(|p| p.final_state == PassengerState::AtDestination));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_passenger_of_each_flight_notifies_pilot() {
    let run = run_with_full_queue(default_params()).await;

    // One notifier per flight, in flight order.
    assert_eq!(run.pilot.last_passengers.len(), 3);
    let boarding_order = passengers_in_order(&run.events, PassengerState::InFlight);
    let mut boarded = boarding_order.as_slice();
    for (flight, (&headcount, &last)) in run
        .pilot
        .flights
        .iter()
        .zip(&run.pilot.last_passengers)
        .enumerate()
    {
        let (on_board, rest) = boarded.split_at(headcount);
        assert!(
            on_board.contains(&last),
            "passenger {last} did not fly on flight {}",
            flight + 1
        );
        let summary = &run.passengers[last];
        assert!(summary.notified_pilot);
        assert_eq!(summary.flight_headcount, headcount);
        boarded = rest;
    }

    let notifiers = run.passengers.iter().filter(|p| p.notified_pilot).count();
    assert_eq!(notifiers, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hostess_waits_for_min_before_take_off() {
    let params = test_params(6, 3, 4);
    let run = run_with_queued(params, 2).await;

    // Two passengers boarded, fewer than MIN: nobody takes off.
    let mut boarded = passengers_in_order(&run.held_back, PassengerState::InFlight);
    boarded.sort_unstable();
    assert_eq!(boarded, vec![0, 1]);
    assert!(!run
        .held_back
        .contains(&ReportedEvent::Hostess(HostessState::ReadyToFly)));
    assert!(!run
        .held_back
        .contains(&ReportedEvent::Pilot(PilotState::FlyingForward)));

    assert!(run.pilot.flights[0] >= params.min_boarding);
    assert_flight_bounds(&run.pilot.flights, &params);
    assert_eq!(boarded_per_flight(&run.events), run.pilot.flights);
    assert_passenger_lifecycles(&run.events, 6);
    assert_fifo_boarding(&run.events);
    assert_final_summary_after_last_park(&run.events);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_final_flight_may_carry_fewer_than_min() {
    // 7 passengers, MIN=5, MAX=5: 5 then 2.
    let run = run_with_full_queue(test_params(7, 5, 5)).await;

    assert_eq!(run.pilot.flights, vec![5, 2]);
    assert_passenger_lifecycles(&run.events, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_passenger() {
    let run = run_with_full_queue(test_params(1, 1, 1)).await;

    assert_eq!(run.pilot.flights, vec![1]);
    assert_final_summary_after_last_park(&run.events);
}

// ============================================================================
// Free-running simulations
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_simulation_properties_hold_under_jitter() {
    for params in [default_params(), test_params(13, 2, 3), test_params(4, 1, 10)] {
        let config = jittered_config(params);
        let (recorder, reporter) = memory_reporter();

        let report = timeout(
            SCENARIO_TIMEOUT,
            run_simulation(&config, reporter, CancellationToken::new()),
        )
        .await
        .expect("simulation timed out")
        .unwrap();

        let events = recorder.events();
        assert_eq!(report.transported_passengers, params.passengers);
        assert_eq!(report.last_passengers.len(), report.flights.len());
        assert_flight_bounds(&report.flights, &params);
        assert_eq!(boarded_per_flight(&events), report.flights);
        assert_passenger_lifecycles(&events, params.passengers);
        assert_fifo_boarding(&events);
        assert_final_summary_after_last_park(&events);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_report_serializes_to_json() {
    let config = test_config(test_params(5, 2, 3));
    let (_recorder, reporter) = memory_reporter();

    let report = timeout(
        SCENARIO_TIMEOUT,
        run_simulation(&config, reporter, CancellationToken::new()),
    )
    .await
    .unwrap()
    .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["run_id"], "airlift-test");
    assert_eq!(json["params"]["passengers"], 5);
    assert_eq!(json["transported_passengers"], 5);
    assert_eq!(
        json["last_passengers"].as_array().unwrap().len(),
        report.flights.len()
    );
    assert_eq!(json["pilot"]["final_state"], "AT_TRANSFER_GATE");
    assert_eq!(json["passengers"][0]["final_state"], "AT_DESTINATION");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_run_reports_interrupted() {
    let mut config = test_config(test_params(3, 1, 3));
    config.delays.travel_max = Duration::from_secs(120);
    let cancel_token = CancellationToken::new();
    let (recorder, reporter) = memory_reporter();

    let canceller = cancel_token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result = timeout(
        SCENARIO_TIMEOUT,
        run_simulation(&config, reporter, cancel_token),
    )
    .await
    .expect("cancelled simulation did not stop");

    assert!(matches!(result, Err(AirliftError::Interrupted(_))));
    assert!(!recorder.events().contains(&ReportedEvent::FinalSummary));
}
