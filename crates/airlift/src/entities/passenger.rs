//! Passenger life cycle.
//!
//! GOING_TO_AIRPORT -> IN_QUEUE -> IN_FLIGHT -> AT_DESTINATION. The last
//! passenger out of each flight notifies the pilot.

use super::{random_pause, PassengerId, PassengerState};
use crate::errors::AirliftError;
use crate::monitors::{DepartureMonitorHandle, DestinationMonitorHandle, PlaneMonitorHandle};

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Outcome of one passenger's trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassengerSummary {
    pub passenger_id: PassengerId,
    pub final_state: PassengerState,
    /// Size of the flight the passenger took.
    pub flight_headcount: usize,
    /// This passenger was the last out and released the pilot.
    pub notified_pilot: bool,
}

pub struct Passenger {
    id: PassengerId,
    state: PassengerState,
    travel_max: Duration,
    departure: DepartureMonitorHandle,
    plane: PlaneMonitorHandle,
    destination: DestinationMonitorHandle,
}

impl Passenger {
    pub fn new(
        id: PassengerId,
        travel_max: Duration,
        departure: DepartureMonitorHandle,
        plane: PlaneMonitorHandle,
        destination: DestinationMonitorHandle,
    ) -> Self {
        Self {
            id,
            state: PassengerState::GoingToAirport,
            travel_max,
            departure,
            plane,
            destination,
        }
    }

    /// Run the passenger to completion.
    #[instrument(skip_all, name = "airlift.entity.passenger", fields(passenger_id = self.id))]
    pub async fn run(mut self) -> Result<PassengerSummary, AirliftError> {
        let id = self.id;
        self.trip()
            .await
            .map_err(|e| e.in_actor(format!("passenger {id}")))
    }

    async fn trip(&mut self) -> Result<PassengerSummary, AirliftError> {
        random_pause(self.travel_max).await;

        self.state = self.departure.wait_in_queue(self.id).await?.state;
        self.departure.show_documents().await?;
        self.state = self.departure.board_the_plane(self.id).await?.state;

        self.plane.wait_for_end_of_flight().await?;
        let flight_headcount = self.plane.get_in_f().await?;

        let left = self
            .destination
            .leave_the_plane(self.id, flight_headcount)
            .await?;
        self.state = left.state;

        if left.value {
            debug!(
                target: "airlift.entity.passenger",
                passenger_id = self.id,
                flight_headcount,
                "Last passenger out, notifying pilot"
            );
            self.plane.notify_pilot(self.id).await?;
        }

        Ok(PassengerSummary {
            passenger_id: self.id,
            final_state: self.state,
            flight_headcount,
            notified_pilot: left.value,
        })
    }
}
