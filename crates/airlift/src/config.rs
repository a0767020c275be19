//! Airlift configuration.
//!
//! Configuration is loaded once from environment variables and is immutable
//! for the rest of the run.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default number of passengers to transport (N).
pub const DEFAULT_PASSENGERS: usize = 21;

/// Default minimum boarding group for a flight to depart (MIN).
pub const DEFAULT_MIN_BOARDING: usize = 5;

/// Default plane capacity (MAX).
pub const DEFAULT_MAX_SEATS: usize = 10;

/// Default audit log path.
pub const DEFAULT_LOG_FILE: &str = "logger";

/// Default upper bound for a passenger's trip to the airport.
pub const DEFAULT_TRAVEL_MAX_MS: u64 = 400;

/// Default upper bound for the outbound flight.
pub const DEFAULT_FLIGHT_FORWARD_MAX_MS: u64 = 160;

/// Default upper bound for the return flight.
pub const DEFAULT_FLIGHT_BACK_MAX_MS: u64 = 149;

/// Default run id prefix.
pub const DEFAULT_RUN_ID_PREFIX: &str = "airlift";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Fixed simulation parameters shared by every monitor and actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationParams {
    /// Total passengers (N).
    pub passengers: usize,
    /// Minimum boarding group (MIN).
    pub min_boarding: usize,
    /// Plane capacity (MAX).
    pub max_seats: usize,
}

impl SimulationParams {
    /// Validate and build the parameters.
    pub fn new(passengers: usize, min_boarding: usize, max_seats: usize) -> Result<Self, ConfigError> {
        if passengers == 0 {
            return Err(ConfigError::InvalidValue(
                "passenger count must be at least 1".to_string(),
            ));
        }
        if min_boarding == 0 || min_boarding > max_seats {
            return Err(ConfigError::InvalidValue(format!(
                "boarding bounds must satisfy 1 <= MIN <= MAX, got MIN={min_boarding} MAX={max_seats}"
            )));
        }

        Ok(Self {
            passengers,
            min_boarding,
            max_seats,
        })
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            passengers: DEFAULT_PASSENGERS,
            min_boarding: DEFAULT_MIN_BOARDING,
            max_seats: DEFAULT_MAX_SEATS,
        }
    }
}

/// Upper bounds of the simulated random delays.
///
/// A zero bound disables the delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    pub travel_max: Duration,
    pub flight_forward_max: Duration,
    pub flight_back_max: Duration,
}

impl Delays {
    /// No simulated delays at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            travel_max: Duration::ZERO,
            flight_forward_max: Duration::ZERO,
            flight_back_max: Duration::ZERO,
        }
    }
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            travel_max: Duration::from_millis(DEFAULT_TRAVEL_MAX_MS),
            flight_forward_max: Duration::from_millis(DEFAULT_FLIGHT_FORWARD_MAX_MS),
            flight_back_max: Duration::from_millis(DEFAULT_FLIGHT_BACK_MAX_MS),
        }
    }
}

/// Airlift configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Simulation parameters (N, MIN, MAX).
    pub params: SimulationParams,

    /// Random delay bounds.
    pub delays: Delays,

    /// Audit log path (default: "logger").
    pub log_file: String,

    /// Identifier of this run, written to the audit log header.
    pub run_id: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let passengers = parse_or(vars, "AIRLIFT_PASSENGERS", DEFAULT_PASSENGERS)?;
        let min_boarding = parse_or(vars, "AIRLIFT_MIN_BOARDING", DEFAULT_MIN_BOARDING)?;
        let max_seats = parse_or(vars, "AIRLIFT_MAX_SEATS", DEFAULT_MAX_SEATS)?;
        let params = SimulationParams::new(passengers, min_boarding, max_seats)?;

        let delays = Delays {
            travel_max: Duration::from_millis(parse_or(
                vars,
                "AIRLIFT_TRAVEL_MAX_MS",
                DEFAULT_TRAVEL_MAX_MS,
            )?),
            flight_forward_max: Duration::from_millis(parse_or(
                vars,
                "AIRLIFT_FLIGHT_FORWARD_MAX_MS",
                DEFAULT_FLIGHT_FORWARD_MAX_MS,
            )?),
            flight_back_max: Duration::from_millis(parse_or(
                vars,
                "AIRLIFT_FLIGHT_BACK_MAX_MS",
                DEFAULT_FLIGHT_BACK_MAX_MS,
            )?),
        };

        let log_file = vars
            .get("AIRLIFT_LOG_FILE")
            .filter(|path| !path.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

        let run_id = vars.get("AIRLIFT_RUN_ID").cloned().unwrap_or_else(|| {
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_RUN_ID_PREFIX}-{short_suffix}")
        });

        Ok(Config {
            params,
            delays,
            log_file,
            run_id,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{key}={raw}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("Config should load successfully");

        assert_eq!(config.params.passengers, DEFAULT_PASSENGERS);
        assert_eq!(config.params.min_boarding, DEFAULT_MIN_BOARDING);
        assert_eq!(config.params.max_seats, DEFAULT_MAX_SEATS);
        assert_eq!(config.delays, Delays::default());
        assert_eq!(config.log_file, DEFAULT_LOG_FILE);
        // Run ID should be auto-generated
        assert!(config.run_id.starts_with("airlift-"));
        assert_eq!(config.run_id.len(), "airlift-".len() + 8);
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            ("AIRLIFT_PASSENGERS".to_string(), "40".to_string()),
            ("AIRLIFT_MIN_BOARDING".to_string(), "3".to_string()),
            ("AIRLIFT_MAX_SEATS".to_string(), "8".to_string()),
            ("AIRLIFT_LOG_FILE".to_string(), "/tmp/airlift.log".to_string()),
            ("AIRLIFT_TRAVEL_MAX_MS".to_string(), "0".to_string()),
            ("AIRLIFT_FLIGHT_FORWARD_MAX_MS".to_string(), "20".to_string()),
            ("AIRLIFT_FLIGHT_BACK_MAX_MS".to_string(), "30".to_string()),
            ("AIRLIFT_RUN_ID".to_string(), "run-001".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.params, SimulationParams::new(40, 3, 8).unwrap());
        assert_eq!(config.log_file, "/tmp/airlift.log");
        assert_eq!(config.delays.travel_max, Duration::ZERO);
        assert_eq!(config.delays.flight_forward_max, Duration::from_millis(20));
        assert_eq!(config.delays.flight_back_max, Duration::from_millis(30));
        assert_eq!(config.run_id, "run-001");
    }

    #[test]
    fn test_empty_log_file_falls_back_to_default() {
        let vars = HashMap::from([("AIRLIFT_LOG_FILE".to_string(), String::new())]);

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.log_file, DEFAULT_LOG_FILE);
    }

    #[test]
    fn test_from_vars_rejects_unparsable_number() {
        let vars = HashMap::from([("AIRLIFT_PASSENGERS".to_string(), "many".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue(v)) if v == "AIRLIFT_PASSENGERS=many")
        );
    }

    #[test]
    fn test_params_reject_min_above_max() {
        let result = SimulationParams::new(21, 11, 10);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_params_reject_empty_simulation() {
        assert!(SimulationParams::new(0, 5, 10).is_err());
        assert!(SimulationParams::new(21, 0, 10).is_err());
    }

    #[test]
    fn test_params_allow_fewer_passengers_than_min() {
        // The single flight carries the exact remainder.
        let params = SimulationParams::new(3, 5, 10).unwrap();
        assert_eq!(params.passengers, 3);
    }
}
