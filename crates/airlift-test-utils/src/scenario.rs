//! Scenario drivers.
//!
//! `run_simulation` lets passengers, hostess and pilot start together, so the
//! flight sizes depend on arrival timing. The drivers here hold the hostess
//! and the pilot back until a chosen number of passengers is queued, which
//! makes the flight sizes deterministic. Passengers beyond that number stay
//! at home until the early ones have boarded.

use crate::assertions::passengers_in_order;
use crate::fixtures::memory_reporter;
use airlift::config::{Delays, SimulationParams};
use airlift::entities::{
    Hostess, HostessSummary, Passenger, PassengerId, PassengerState, PassengerSummary, Pilot,
    PilotSummary,
};
use airlift::errors::AirliftError;
use airlift::monitors::DepartureMonitorHandle;
use airlift::repository::{MemoryReporter, ReportedEvent};
use airlift::simulation::Monitors;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Upper bound for any scenario to finish.
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll the departure monitor until `expected` passengers are queued.
pub async fn wait_until_queued(departure: &DepartureMonitorHandle, expected: usize) {
    timeout(SCENARIO_TIMEOUT, async {
        loop {
            let queued = departure
                .passengers_in_queue()
                .await
                .expect("departure monitor unavailable");
            if queued >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("passengers never reached the queue");
}

/// Poll the recorded events until `expected` passengers have boarded.
pub async fn wait_until_boarded(recorder: &MemoryReporter, expected: usize) {
    timeout(SCENARIO_TIMEOUT, async {
        while passengers_in_order(&recorder.events(), PassengerState::InFlight).len() < expected {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("passengers never boarded");
}

type PassengerTasks = JoinSet<Result<PassengerSummary, AirliftError>>;

/// Time given to the hostess and the pilot to act on the early passengers.
const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Outcome of a driven run.
#[derive(Debug)]
pub struct ScenarioRun {
    pub events: Vec<ReportedEvent>,
    /// Events recorded before the held-back passengers left home; empty when
    /// nobody was held back.
    pub held_back: Vec<ReportedEvent>,
    pub passengers: Vec<PassengerSummary>,
    pub hostess: HostessSummary,
    pub pilot: PilotSummary,
}

/// Queue every passenger before the hostess and the pilot start.
pub async fn run_with_full_queue(params: SimulationParams) -> ScenarioRun {
    run_with_queued(params, params.passengers).await
}

/// Start the hostess and the pilot once `queued_before_start` passengers are queued.
///
/// The remaining passengers leave home once the early ones have boarded and
/// the hostess and the pilot had time to act on them.
pub async fn run_with_queued(params: SimulationParams, queued_before_start: usize) -> ScenarioRun {
    let early = queued_before_start.min(params.passengers);
    let (recorder, reporter) = memory_reporter();
    let cancel_token = CancellationToken::new();
    let monitors = Monitors::spawn(params, &reporter, &cancel_token);
    let (release, released) = oneshot::channel::<()>();

    let passenger_handles = monitors.handles();
    let passengers_group = tokio::spawn(async move {
        let mut passengers = JoinSet::new();
        let spawn_passenger = |passengers: &mut PassengerTasks, passenger_id: PassengerId| {
            let passenger = Passenger::new(
                passenger_id,
                Duration::ZERO,
                passenger_handles.departure.clone(),
                passenger_handles.plane.clone(),
                passenger_handles.destination.clone(),
            );
            passengers.spawn(passenger.run());
        };

        for passenger_id in 0..early {
            spawn_passenger(&mut passengers, passenger_id);
        }
        released.await.expect("held-back passengers never released");
        for passenger_id in early..params.passengers {
            spawn_passenger(&mut passengers, passenger_id);
        }

        let mut summaries = Vec::new();
        while let Some(joined) = passengers.join_next().await {
            summaries.push(
                joined
                    .expect("passenger task panicked")
                    .expect("passenger failed"),
            );
        }
        summaries.sort_by_key(|summary| summary.passenger_id);
        passenger_handles
            .shutdown_all()
            .await
            .expect("passengers shutdown failed");
        summaries
    });

    wait_until_queued(&monitors.departure, early).await;

    let hostess_handles = monitors.handles();
    let hostess_group = tokio::spawn(async move {
        let hostess = Hostess::new(
            params,
            hostess_handles.departure.clone(),
            hostess_handles.plane.clone(),
        );
        let summary = hostess.run().await.expect("hostess failed");
        hostess_handles
            .shutdown_all()
            .await
            .expect("hostess shutdown failed");
        summary
    });

    let pilot_handles = monitors.handles();
    let pilot_group = tokio::spawn(async move {
        let pilot = Pilot::new(params, Delays::none(), pilot_handles.plane.clone());
        let summary = pilot.run().await.expect("pilot failed");
        pilot_handles
            .shutdown_all()
            .await
            .expect("pilot shutdown failed");
        summary
    });

    let held_back = if early < params.passengers {
        wait_until_boarded(&recorder, early).await;
        tokio::time::sleep(SETTLE_DELAY).await;
        recorder.events()
    } else {
        Vec::new()
    };
    release.send(()).expect("passenger group stopped early");

    let (passengers, hostess, pilot) = timeout(SCENARIO_TIMEOUT, async {
        tokio::join!(passengers_group, hostess_group, pilot_group)
    })
    .await
    .expect("scenario timed out");

    timeout(SCENARIO_TIMEOUT, monitors.join())
        .await
        .expect("monitors did not stop")
        .expect("monitor task failed");

    ScenarioRun {
        events: recorder.events(),
        held_back,
        passengers: passengers.expect("passenger group panicked"),
        hostess: hostess.expect("hostess group panicked"),
        pilot: pilot.expect("pilot group panicked"),
    }
}
