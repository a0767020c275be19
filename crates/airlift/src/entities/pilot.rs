//! Pilot life cycle.

use super::{random_pause, PassengerId, PilotState};
use crate::config::{Delays, SimulationParams};
use crate::errors::AirliftError;
use crate::monitors::PlaneMonitorHandle;

use serde::Serialize;
use tracing::{info, instrument};

/// Outcome of the pilot's shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PilotSummary {
    pub transported_passengers: usize,
    /// Headcount of each flight, in arrival order.
    pub flights: Vec<usize>,
    /// Passenger that emptied the plane, per flight in arrival order.
    pub last_passengers: Vec<PassengerId>,
    pub final_state: PilotState,
}

pub struct Pilot {
    params: SimulationParams,
    delays: Delays,
    state: PilotState,
    plane: PlaneMonitorHandle,
    transported_passengers: usize,
    flights: Vec<usize>,
    last_passengers: Vec<PassengerId>,
}

impl Pilot {
    pub fn new(params: SimulationParams, delays: Delays, plane: PlaneMonitorHandle) -> Self {
        Self {
            params,
            delays,
            state: PilotState::AtTransferGate,
            plane,
            transported_passengers: 0,
            flights: Vec::new(),
            last_passengers: Vec::new(),
        }
    }

    /// Fly until every passenger is at the destination, then emit the final report.
    #[instrument(skip_all, name = "airlift.entity.pilot")]
    pub async fn run(mut self) -> Result<PilotSummary, AirliftError> {
        self.shift().await.map_err(|e| e.in_actor("pilot"))
    }

    async fn shift(&mut self) -> Result<PilotSummary, AirliftError> {
        self.state = self.plane.park_at_transfer_gate().await?.state;

        loop {
            self.state = self.plane.inform_plane_ready_for_boarding().await?.state;
            self.state = self.plane.wait_for_all_in_boarding().await?.state;

            random_pause(self.delays.flight_forward_max).await;

            let arrival = self
                .plane
                .announce_arrival(self.transported_passengers)
                .await?;
            self.state = arrival.state;
            let transported = arrival.value.transported_passengers;
            let headcount = transported.saturating_sub(self.transported_passengers);
            self.transported_passengers = transported;
            self.flights.push(headcount);
            self.last_passengers.push(arrival.value.last_passenger);
            info!(
                target: "airlift.entity.pilot",
                flight = self.flights.len(),
                headcount,
                last_passenger = arrival.value.last_passenger,
                transported = self.transported_passengers,
                "Flight completed"
            );

            random_pause(self.delays.flight_back_max).await;

            self.state = self.plane.park_at_transfer_gate().await?.state;
            if self.transported_passengers == self.params.passengers {
                self.plane.report_final_report().await?;
                break;
            }
        }

        Ok(PilotSummary {
            transported_passengers: self.transported_passengers,
            flights: self.flights.clone(),
            last_passengers: self.last_passengers.clone(),
            final_state: self.state,
        })
    }
}
