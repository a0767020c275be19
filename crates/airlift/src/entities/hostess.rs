//! Hostess life cycle.
//!
//! Per flight the hostess serves at least MIN passengers, then keeps serving
//! while someone is queued and the plane has a free seat. Serving stops early
//! once every passenger has been checked, so the final flight may carry fewer
//! than MIN.

use super::HostessState;
use crate::config::SimulationParams;
use crate::errors::AirliftError;
use crate::monitors::{DepartureMonitorHandle, PlaneMonitorHandle};

use serde::Serialize;
use tracing::{info, instrument};

/// Outcome of the hostess' shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostessSummary {
    pub checked_passengers: usize,
    /// Passengers cleared per flight, in departure order.
    pub boardings: Vec<usize>,
    pub final_state: HostessState,
}

pub struct Hostess {
    params: SimulationParams,
    state: HostessState,
    departure: DepartureMonitorHandle,
    plane: PlaneMonitorHandle,
    /// Passengers served for the flight being boarded.
    hostess_count: usize,
    /// Passengers of departed flights.
    checked_passengers: usize,
    passengers_in_queue: bool,
    boardings: Vec<usize>,
}

impl Hostess {
    pub fn new(
        params: SimulationParams,
        departure: DepartureMonitorHandle,
        plane: PlaneMonitorHandle,
    ) -> Self {
        Self {
            params,
            state: HostessState::WaitForFlight,
            departure,
            plane,
            hostess_count: 0,
            checked_passengers: 0,
            passengers_in_queue: false,
            boardings: Vec::new(),
        }
    }

    /// Run the hostess until every passenger has been checked.
    #[instrument(skip_all, name = "airlift.entity.hostess")]
    pub async fn run(mut self) -> Result<HostessSummary, AirliftError> {
        self.shift().await.map_err(|e| e.in_actor("hostess"))
    }

    async fn shift(&mut self) -> Result<HostessSummary, AirliftError> {
        self.wait_for_next_flight(true).await?;

        loop {
            self.state = self.departure.prepare_for_pass_boarding().await?.state;
            self.hostess_count = 0;

            let mut all_checked = false;
            while !all_checked && self.hostess_count < self.params.min_boarding {
                all_checked = self.serve_passenger().await?;
            }
            while !all_checked
                && self.passengers_in_queue
                && self.hostess_count < self.params.max_seats
            {
                all_checked = self.serve_passenger().await?;
            }

            self.state = self
                .plane
                .inform_plane_ready_to_take_off(self.hostess_count)
                .await?
                .state;
            self.boardings.push(self.hostess_count);
            info!(
                target: "airlift.entity.hostess",
                flight = self.boardings.len(),
                headcount = self.hostess_count,
                "Boarding complete"
            );

            self.wait_for_next_flight(false).await?;
            if all_checked {
                break;
            }
        }

        if self.checked_passengers != self.params.passengers {
            return Err(AirliftError::InvariantViolation(format!(
                "hostess finished with {} of {} passengers checked",
                self.checked_passengers, self.params.passengers
            )));
        }

        Ok(HostessSummary {
            checked_passengers: self.checked_passengers,
            boardings: self.boardings.clone(),
            final_state: self.state,
        })
    }

    async fn wait_for_next_flight(&mut self, first: bool) -> Result<(), AirliftError> {
        let next = self
            .plane
            .wait_for_next_flight(first, self.checked_passengers)
            .await?;
        self.state = next.state;
        self.checked_passengers = next.value;
        Ok(())
    }

    /// Check one passenger's documents and clear them to board.
    ///
    /// Returns true once every passenger of the simulation has been checked.
    async fn serve_passenger(&mut self) -> Result<bool, AirliftError> {
        self.state = self.departure.check_documents().await?.state;
        self.hostess_count += 1;

        let next = self
            .departure
            .wait_for_next_passenger(self.hostess_count, self.checked_passengers)
            .await?;
        self.state = next.state;
        self.passengers_in_queue = next.value;

        Ok(self.hostess_count + self.checked_passengers == self.params.passengers)
    }
}
