//! Life-cycle states of the simulation actors.
//!
//! Each state has the four-letter abbreviation used by the audit log.

use serde::Serialize;
use std::fmt;

/// Passenger life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassengerState {
    GoingToAirport,
    InQueue,
    InFlight,
    AtDestination,
}

impl PassengerState {
    #[must_use]
    pub const fn abbreviation(&self) -> &'static str {
        match self {
            PassengerState::GoingToAirport => "GTAP",
            PassengerState::InQueue => "INQE",
            PassengerState::InFlight => "INFL",
            PassengerState::AtDestination => "ATDS",
        }
    }
}

/// Hostess life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostessState {
    WaitForFlight,
    WaitForPassenger,
    CheckPassenger,
    ReadyToFly,
}

impl HostessState {
    #[must_use]
    pub const fn abbreviation(&self) -> &'static str {
        match self {
            HostessState::WaitForFlight => "WTFL",
            HostessState::WaitForPassenger => "WTPS",
            HostessState::CheckPassenger => "CKPS",
            HostessState::ReadyToFly => "RDTF",
        }
    }
}

/// Pilot life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PilotState {
    AtTransferGate,
    ReadyForBoarding,
    WaitingForBoarding,
    FlyingForward,
    Deboarding,
    FlyingBack,
}

impl PilotState {
    #[must_use]
    pub const fn abbreviation(&self) -> &'static str {
        match self {
            PilotState::AtTransferGate => "ATRG",
            PilotState::ReadyForBoarding => "RDFB",
            PilotState::WaitingForBoarding => "WTFB",
            PilotState::FlyingForward => "FLFW",
            PilotState::Deboarding => "DRPP",
            PilotState::FlyingBack => "FLBK",
        }
    }
}

impl fmt::Display for PassengerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl fmt::Display for HostessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl fmt::Display for PilotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviations_are_four_letters() {
        let all: Vec<String> = [
            PassengerState::GoingToAirport.to_string(),
            PassengerState::InQueue.to_string(),
            PassengerState::InFlight.to_string(),
            PassengerState::AtDestination.to_string(),
            HostessState::WaitForFlight.to_string(),
            HostessState::WaitForPassenger.to_string(),
            HostessState::CheckPassenger.to_string(),
            HostessState::ReadyToFly.to_string(),
            PilotState::AtTransferGate.to_string(),
            PilotState::ReadyForBoarding.to_string(),
            PilotState::WaitingForBoarding.to_string(),
            PilotState::FlyingForward.to_string(),
            PilotState::Deboarding.to_string(),
            PilotState::FlyingBack.to_string(),
        ]
        .into();

        assert!(all.iter().all(|abbr| abbr.len() == 4));
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(
            serde_json::to_string(&PilotState::FlyingBack).ok().as_deref(),
            Some("\"FLYING_BACK\"")
        );
        assert_eq!(
            serde_json::to_string(&PassengerState::AtDestination).ok().as_deref(),
            Some("\"AT_DESTINATION\"")
        );
    }
}
