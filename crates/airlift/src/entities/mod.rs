//! Active entities of the airlift.
//!
//! Each entity is a tokio task that drives its own life cycle by calling the
//! monitors. An entity keeps its current state locally and replaces it with
//! the state every monitor call hands back.
//!
//! # Modules
//!
//! - [`passenger`] - travels, boards one flight, disembarks
//! - [`hostess`] - checks documents and decides when a flight departs
//! - [`pilot`] - flies the plane until every passenger is transported
//! - [`states`] - life-cycle states and their audit log abbreviations

pub mod hostess;
pub mod passenger;
pub mod pilot;
pub mod states;

pub use hostess::{Hostess, HostessSummary};
pub use passenger::{Passenger, PassengerSummary};
pub use pilot::{Pilot, PilotSummary};
pub use states::{HostessState, PassengerState, PilotState};

use rand::Rng;
use std::time::Duration;

/// Passenger identifier, in `[0, N)`.
pub type PassengerId = usize;

/// Sleep for a random duration in `[1ms, max]`. A zero bound only yields.
pub(crate) async fn random_pause(max: Duration) {
    if max.is_zero() {
        tokio::task::yield_now().await;
        return;
    }

    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX).max(1);
    let millis = rand::thread_rng().gen_range(1..=max_ms);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
