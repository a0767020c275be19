//! Test fixtures.

use airlift::config::{Config, Delays, SimulationParams};
use airlift::repository::{MemoryReporter, Reporter};
use std::sync::Arc;

/// Parameters of the reference run: N=21, MIN=5, MAX=10.
pub fn default_params() -> SimulationParams {
    SimulationParams::default()
}

/// Validated parameters; panics on invalid input.
pub fn test_params(passengers: usize, min_boarding: usize, max_seats: usize) -> SimulationParams {
    SimulationParams::new(passengers, min_boarding, max_seats).expect("invalid test parameters")
}

/// Config without simulated delays.
pub fn test_config(params: SimulationParams) -> Config {
    Config {
        params,
        delays: Delays::none(),
        log_file: "airlift-test.log".to_string(),
        run_id: "airlift-test".to_string(),
    }
}

/// Config with short real delays, enough to shuffle arrivals between runs.
pub fn jittered_config(params: SimulationParams) -> Config {
    Config {
        delays: Delays {
            travel_max: std::time::Duration::from_millis(20),
            flight_forward_max: std::time::Duration::from_millis(5),
            flight_back_max: std::time::Duration::from_millis(5),
        },
        ..test_config(params)
    }
}

/// A recording reporter and the same reporter as a trait object.
pub fn memory_reporter() -> (Arc<MemoryReporter>, Arc<dyn Reporter>) {
    let reporter = Arc::new(MemoryReporter::new());
    let as_dyn: Arc<dyn Reporter> = reporter.clone();
    (reporter, as_dyn)
}
