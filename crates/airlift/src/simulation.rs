//! Simulation runner.
//!
//! Wires the three monitors to the three client groups (the passengers, the
//! hostess, the pilot) and runs them to completion:
//!
//! 1. Spawn the monitors under a child of the caller's cancellation token
//! 2. Spawn the client groups
//! 3. Each group requests shutdown of every monitor once its actors finished
//! 4. Wait for the monitors to reach their shutdown quorum and stop
//!
//! The first failure of any actor cancels the monitors, aborts the remaining
//! groups and is returned.

use crate::config::{Config, Delays, SimulationParams};
use crate::entities::{
    Hostess, HostessSummary, Passenger, PassengerId, PassengerSummary, Pilot, PilotSummary,
};
use crate::errors::AirliftError;
use crate::monitors::{
    DepartureMonitor, DepartureMonitorHandle, DestinationMonitor, DestinationMonitorHandle,
    PlaneMonitor, PlaneMonitorHandle,
};
use crate::observability::metrics;
use crate::repository::Reporter;

use serde::Serialize;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// The three monitors of one run.
pub struct Monitors {
    pub departure: DepartureMonitorHandle,
    pub plane: PlaneMonitorHandle,
    pub destination: DestinationMonitorHandle,
    tasks: Vec<JoinHandle<()>>,
}

impl Monitors {
    /// Spawn the departure, plane and destination monitors.
    pub fn spawn(
        params: SimulationParams,
        reporter: &Arc<dyn Reporter>,
        cancel_token: &CancellationToken,
    ) -> Self {
        let (departure, departure_task) =
            DepartureMonitor::spawn(params, Arc::clone(reporter), cancel_token.child_token());
        let (plane, plane_task) =
            PlaneMonitor::spawn(params, Arc::clone(reporter), cancel_token.child_token());
        let (destination, destination_task) =
            DestinationMonitor::spawn(params, Arc::clone(reporter), cancel_token.child_token());

        Self {
            departure,
            plane,
            destination,
            tasks: vec![departure_task, plane_task, destination_task],
        }
    }

    /// Handles for one client group.
    #[must_use]
    pub fn handles(&self) -> MonitorHandles {
        MonitorHandles {
            departure: self.departure.clone(),
            plane: self.plane.clone(),
            destination: self.destination.clone(),
        }
    }

    /// Wait for every monitor task to stop.
    pub async fn join(self) -> Result<(), AirliftError> {
        for task in self.tasks {
            task.await
                .map_err(|e| AirliftError::Interrupted(format!("monitor task failed: {e}")))?;
        }
        Ok(())
    }
}

/// Cloned monitor handles owned by one client group.
#[derive(Clone)]
pub struct MonitorHandles {
    pub departure: DepartureMonitorHandle,
    pub plane: PlaneMonitorHandle,
    pub destination: DestinationMonitorHandle,
}

impl MonitorHandles {
    /// Request shutdown of every monitor on behalf of one client group.
    pub async fn shutdown_all(&self) -> Result<(), AirliftError> {
        self.departure.shutdown().await?;
        self.plane.shutdown().await?;
        self.destination.shutdown().await?;
        Ok(())
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub run_id: String,
    pub params: ReportParams,
    /// Headcount of each flight, in arrival order.
    pub flights: Vec<usize>,
    /// Passenger elected last out of each flight, in arrival order.
    pub last_passengers: Vec<PassengerId>,
    pub transported_passengers: usize,
    pub hostess: HostessSummary,
    pub pilot: PilotSummary,
    /// Ordered by passenger id.
    pub passengers: Vec<PassengerSummary>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReportParams {
    pub passengers: usize,
    pub min_boarding: usize,
    pub max_seats: usize,
}

impl From<SimulationParams> for ReportParams {
    fn from(params: SimulationParams) -> Self {
        Self {
            passengers: params.passengers,
            min_boarding: params.min_boarding,
            max_seats: params.max_seats,
        }
    }
}

/// Client groups, each made of actors of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientGroup {
    Passengers,
    Hostess,
    Pilot,
}

impl ClientGroup {
    /// Returns the group as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ClientGroup::Passengers => "passenger",
            ClientGroup::Hostess => "hostess",
            ClientGroup::Pilot => "pilot",
        }
    }
}

/// Failure label for a client group task that panicked or was aborted.
const RUNTIME_FAILURE_LABEL: &str = "runtime";

enum GroupOutcome {
    Passengers(Vec<PassengerSummary>),
    Hostess(HostessSummary),
    Pilot(PilotSummary),
}

/// Run one complete simulation.
///
/// Cancelling `cancel_token` stops the monitors; the run then fails with
/// [`AirliftError::Interrupted`].
#[instrument(skip_all, name = "airlift.simulation", fields(run_id = %config.run_id))]
pub async fn run_simulation(
    config: &Config,
    reporter: Arc<dyn Reporter>,
    cancel_token: CancellationToken,
) -> Result<SimulationReport, AirliftError> {
    let params = config.params;
    let monitor_token = cancel_token.child_token();
    let monitors = Monitors::spawn(params, &reporter, &monitor_token);

    info!(
        target: "airlift.simulation",
        passengers = params.passengers,
        min_boarding = params.min_boarding,
        max_seats = params.max_seats,
        "Simulation started"
    );

    let mut groups = JoinSet::new();
    groups.spawn(run_passengers(params, config.delays, monitors.handles()));
    groups.spawn(run_hostess(params, monitors.handles()));
    groups.spawn(run_pilot(params, config.delays, monitors.handles()));

    let mut passengers = None;
    let mut hostess = None;
    let mut pilot = None;

    while let Some(joined) = groups.join_next().await {
        let (group, outcome) = match joined {
            Ok((group, outcome)) => (group.as_str(), outcome),
            Err(e) => (
                RUNTIME_FAILURE_LABEL,
                Err(AirliftError::Interrupted(format!("client group task failed: {e}"))),
            ),
        };

        match outcome {
            Ok(GroupOutcome::Passengers(summaries)) => passengers = Some(summaries),
            Ok(GroupOutcome::Hostess(summary)) => hostess = Some(summary),
            Ok(GroupOutcome::Pilot(summary)) => pilot = Some(summary),
            Err(e) => {
                metrics::record_actor_failure(group, e.error_type());
                error!(
                    target: "airlift.simulation",
                    group,
                    error = %e,
                    "Client group failed, aborting simulation"
                );

                monitor_token.cancel();
                groups.abort_all();
                // Monitor tasks only exit their loop; nothing to report here.
                let _ = monitors.join().await;

                if cancel_token.is_cancelled() {
                    return Err(AirliftError::Interrupted(format!(
                        "simulation cancelled: {e}"
                    )));
                }
                return Err(e);
            }
        }
    }

    monitors.join().await?;

    let (Some(passengers), Some(hostess), Some(pilot)) = (passengers, hostess, pilot) else {
        return Err(AirliftError::InvariantViolation(
            "a client group finished without an outcome".to_string(),
        ));
    };

    info!(
        target: "airlift.simulation",
        flights = pilot.flights.len(),
        transported = pilot.transported_passengers,
        "Simulation completed"
    );

    Ok(SimulationReport {
        run_id: config.run_id.clone(),
        params: params.into(),
        flights: pilot.flights.clone(),
        last_passengers: pilot.last_passengers.clone(),
        transported_passengers: pilot.transported_passengers,
        hostess,
        pilot,
        passengers,
    })
}

async fn run_passengers(
    params: SimulationParams,
    delays: Delays,
    handles: MonitorHandles,
) -> (ClientGroup, Result<GroupOutcome, AirliftError>) {
    let outcome = async {
        let mut passengers = JoinSet::new();
        for passenger_id in 0..params.passengers {
            let passenger = Passenger::new(
                passenger_id,
                delays.travel_max,
                handles.departure.clone(),
                handles.plane.clone(),
                handles.destination.clone(),
            );
            passengers.spawn(passenger.run());
        }

        let mut summaries = Vec::with_capacity(params.passengers);
        while let Some(joined) = passengers.join_next().await {
            let summary = joined.map_err(|e| {
                AirliftError::Interrupted(format!("passenger task failed: {e}"))
            })??;
            summaries.push(summary);
        }
        summaries.sort_by_key(|summary| summary.passenger_id);

        handles.shutdown_all().await?;
        Ok(GroupOutcome::Passengers(summaries))
    }
    .await;

    (ClientGroup::Passengers, outcome)
}

async fn run_hostess(
    params: SimulationParams,
    handles: MonitorHandles,
) -> (ClientGroup, Result<GroupOutcome, AirliftError>) {
    let outcome = async {
        let hostess = Hostess::new(params, handles.departure.clone(), handles.plane.clone());
        let summary = hostess.run().await?;
        handles.shutdown_all().await?;
        Ok(GroupOutcome::Hostess(summary))
    }
    .await;

    (ClientGroup::Hostess, outcome)
}

async fn run_pilot(
    params: SimulationParams,
    delays: Delays,
    handles: MonitorHandles,
) -> (ClientGroup, Result<GroupOutcome, AirliftError>) {
    let outcome = async {
        let pilot = Pilot::new(params, delays, handles.plane.clone());
        let summary = pilot.run().await?;
        handles.shutdown_all().await?;
        Ok(GroupOutcome::Pilot(summary))
    }
    .await;

    (ClientGroup::Pilot, outcome)
}
