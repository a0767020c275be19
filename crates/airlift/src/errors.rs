//! Airlift error types.
//!
//! Every error in the simulation is fatal: there is no partial-success state
//! to recover into. Errors carry enough context (actor, monitor, operation)
//! for the abort diagnostic.

use crate::config::ConfigError;
use crate::entities::PassengerId;
use crate::monitors::MonitorKind;
use thiserror::Error;

/// Airlift error type.
#[derive(Debug, Error)]
pub enum AirliftError {
    /// A monitor request could not be delivered or its reply never arrived.
    #[error("Transport error calling {monitor}.{operation}: {reason}")]
    Transport {
        monitor: MonitorKind,
        operation: &'static str,
        reason: String,
    },

    /// A passenger id outside `[0, N)` reached a monitor.
    #[error("Invalid passenger id {id} (simulation has {passengers} passengers)")]
    InvalidPassenger { id: PassengerId, passengers: usize },

    /// A monitor or actor detected a broken internal invariant.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The run was cancelled or an actor task was aborted.
    #[error("Interrupted: {0}")]
    Interrupted(String),

    /// The audit log could not be written.
    #[error("Repository error: {0}")]
    Repository(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failure attributed to a specific actor.
    #[error("{actor}: {source}")]
    Actor {
        actor: String,
        #[source]
        source: Box<AirliftError>,
    },
}

impl AirliftError {
    /// Attribute this error to an actor (`"hostess"`, `"pilot"`, `"passenger 7"`).
    ///
    /// Errors already attributed keep their original actor.
    #[must_use]
    pub fn in_actor(self, actor: impl Into<String>) -> Self {
        match self {
            already @ AirliftError::Actor { .. } => already,
            other => AirliftError::Actor {
                actor: actor.into(),
                source: Box::new(other),
            },
        }
    }

    /// Returns a bounded label for metrics and structured logs.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            AirliftError::Transport { .. } => "transport",
            AirliftError::InvalidPassenger { .. } => "invalid_passenger",
            AirliftError::InvariantViolation(_) => "invariant_violation",
            AirliftError::Interrupted(_) => "interrupted",
            AirliftError::Repository(_) => "repository",
            AirliftError::Config(_) => "config",
            AirliftError::Actor { source, .. } => source.error_type(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formatting() {
        let err = AirliftError::Transport {
            monitor: MonitorKind::Departure,
            operation: "wait_in_queue",
            reason: "channel closed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Transport error calling departure.wait_in_queue: channel closed"
        );

        assert_eq!(
            AirliftError::InvalidPassenger {
                id: 30,
                passengers: 21
            }
            .to_string(),
            "Invalid passenger id 30 (simulation has 21 passengers)"
        );
    }

    #[test]
    fn test_in_actor_identifies_actor_and_cause() {
        let err = AirliftError::InvariantViolation("boarding queue is empty".to_string())
            .in_actor("hostess");

        assert_eq!(
            err.to_string(),
            "hostess: Invariant violation: boarding queue is empty"
        );
        assert_eq!(err.error_type(), "invariant_violation");
    }

    #[test]
    fn test_in_actor_keeps_first_attribution() {
        let err = AirliftError::Interrupted("cancelled".to_string())
            .in_actor("passenger 3")
            .in_actor("passenger group");

        assert!(matches!(&err, AirliftError::Actor { actor, .. } if actor == "passenger 3"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: AirliftError = ConfigError::InvalidValue("AIRLIFT_MAX_SEATS".to_string()).into();
        assert_eq!(err.error_type(), "config");
    }
}
