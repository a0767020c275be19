//! `DestinationMonitor` - disembarking at the destination airport.
//!
//! Counts the passengers leaving the current flight and elects the last one,
//! who then notifies the pilot.

use crate::config::SimulationParams;
use crate::entities::{PassengerId, PassengerState};
use crate::errors::AirliftError;
use crate::observability::metrics;
use crate::repository::Reporter;

use super::messages::{DestinationMessage, Transition};
use super::{request, MonitorKind, ShutdownQuorum, SHUTDOWN_QUORUM};

use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

const DESTINATION_CHANNEL_BUFFER: usize = 256;

/// Handle to the `DestinationMonitor`.
#[derive(Clone)]
pub struct DestinationMonitorHandle {
    sender: mpsc::Sender<DestinationMessage>,
}

impl DestinationMonitorHandle {
    /// Passenger: leave the plane.
    ///
    /// `flight_headcount` is the number of passengers of this flight, as read
    /// from the plane. Returns true for the last passenger out.
    pub async fn leave_the_plane(
        &self,
        passenger_id: PassengerId,
        flight_headcount: usize,
    ) -> Result<Transition<PassengerState, bool>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Destination,
            "leave_the_plane",
            |respond_to| DestinationMessage::LeaveThePlane {
                passenger_id,
                flight_headcount,
                respond_to,
            },
        )
        .await
    }

    pub async fn shutdown(&self) -> Result<(), AirliftError> {
        request(
            &self.sender,
            MonitorKind::Destination,
            "shutdown",
            |respond_to| DestinationMessage::Shutdown { respond_to },
        )
        .await
    }
}

/// The `DestinationMonitor` implementation. No operation here blocks.
pub struct DestinationMonitor {
    params: SimulationParams,
    receiver: mpsc::Receiver<DestinationMessage>,
    cancel_token: CancellationToken,
    reporter: Arc<dyn Reporter>,
    /// Passengers that left the current flight.
    ptal: usize,
    shutdown: ShutdownQuorum,
    messages_processed: u64,
}

impl DestinationMonitor {
    /// Spawn the destination monitor task.
    pub fn spawn(
        params: SimulationParams,
        reporter: Arc<dyn Reporter>,
        cancel_token: CancellationToken,
    ) -> (DestinationMonitorHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(DESTINATION_CHANNEL_BUFFER);

        let monitor = Self {
            params,
            receiver,
            cancel_token,
            reporter,
            ptal: 0,
            shutdown: ShutdownQuorum::new(SHUTDOWN_QUORUM),
            messages_processed: 0,
        };

        let task_handle = tokio::spawn(monitor.run());

        (DestinationMonitorHandle { sender }, task_handle)
    }

    #[instrument(skip_all, name = "airlift.monitor.destination")]
    async fn run(mut self) {
        info!(target: "airlift.monitor.destination", "DestinationMonitor started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: "airlift.monitor.destination", "DestinationMonitor received cancellation signal");
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.messages_processed += 1;
                            if self.handle_message(message).is_break() {
                                info!(target: "airlift.monitor.destination", "DestinationMonitor shutdown quorum reached");
                                break;
                            }
                        }
                        None => {
                            info!(target: "airlift.monitor.destination", "DestinationMonitor channel closed, exiting");
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "airlift.monitor.destination",
            messages_processed = self.messages_processed,
            shutdown_requests = self.shutdown.requests(),
            "DestinationMonitor stopped"
        );
    }

    fn handle_message(&mut self, message: DestinationMessage) -> ControlFlow<()> {
        metrics::record_monitor_call(MonitorKind::Destination.as_str(), message.operation());

        match message {
            DestinationMessage::LeaveThePlane {
                passenger_id,
                flight_headcount,
                respond_to,
            } => {
                let result = self.leave_the_plane(passenger_id, flight_headcount);
                let _ = respond_to.send(result);
            }

            DestinationMessage::Shutdown { respond_to } => {
                let _ = respond_to.send(Ok(()));
                if self.shutdown.register() {
                    return ControlFlow::Break(());
                }
            }
        }

        ControlFlow::Continue(())
    }

    fn leave_the_plane(
        &mut self,
        passenger_id: PassengerId,
        flight_headcount: usize,
    ) -> Result<Transition<PassengerState, bool>, AirliftError> {
        if passenger_id >= self.params.passengers {
            return Err(AirliftError::InvalidPassenger {
                id: passenger_id,
                passengers: self.params.passengers,
            });
        }
        if flight_headcount == 0 || self.ptal >= flight_headcount {
            return Err(AirliftError::InvariantViolation(format!(
                "passenger {passenger_id} left a flight of {flight_headcount} after {} others",
                self.ptal
            )));
        }

        self.reporter
            .report_passenger_state(passenger_id, PassengerState::AtDestination);
        self.ptal += 1;

        let last = self.ptal == flight_headcount;
        if last {
            self.ptal = 0;
            debug!(
                target: "airlift.monitor.destination",
                passenger_id,
                flight_headcount,
                "Last passenger left the plane"
            );
        }

        Ok(Transition::with(PassengerState::AtDestination, last))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::repository::{MemoryReporter, ReportedEvent};

    fn spawn_monitor() -> (DestinationMonitorHandle, Arc<MemoryReporter>, JoinHandle<()>) {
        let params = SimulationParams::new(6, 1, 3).unwrap();
        let reporter = Arc::new(MemoryReporter::new());
        let (handle, task) =
            DestinationMonitor::spawn(params, reporter.clone(), CancellationToken::new());
        (handle, reporter, task)
    }

    #[tokio::test]
    async fn test_last_passenger_is_elected_once_per_flight() {
        let (handle, reporter, _task) = spawn_monitor();

        let mut elected = Vec::new();
        for passenger_id in [4, 1, 2] {
            let transition = handle.leave_the_plane(passenger_id, 3).await.unwrap();
            assert_eq!(transition.state, PassengerState::AtDestination);
            elected.push(transition.value);
        }
        assert_eq!(elected, vec![false, false, true]);

        // The count restarts for the next flight.
        let transition = handle.leave_the_plane(0, 1).await.unwrap();
        assert!(transition.value);

        assert_eq!(
            reporter.events().first(),
            Some(&ReportedEvent::Passenger {
                passenger_id: 4,
                state: PassengerState::AtDestination
            })
        );
        assert_eq!(reporter.events().len(), 4);
    }

    #[tokio::test]
    async fn test_zero_headcount_is_invariant_violation() {
        let (handle, reporter, _task) = spawn_monitor();

        let result = handle.leave_the_plane(0, 0).await;
        assert!(matches!(result, Err(AirliftError::InvariantViolation(_))));
        assert!(reporter.events().is_empty());
    }

    #[tokio::test]
    async fn test_headcount_overrun_is_invariant_violation() {
        let (handle, _reporter, _task) = spawn_monitor();

        // A flight of 2 after 2 of a flight of 3 already left.
        handle.leave_the_plane(0, 3).await.unwrap();
        handle.leave_the_plane(1, 3).await.unwrap();
        let result = handle.leave_the_plane(2, 2).await;
        assert!(matches!(result, Err(AirliftError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn test_invalid_passenger_id_is_rejected() {
        let (handle, _reporter, _task) = spawn_monitor();

        let result = handle.leave_the_plane(6, 1).await;
        assert!(matches!(
            result,
            Err(AirliftError::InvalidPassenger {
                id: 6,
                passengers: 6
            })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_quorum_stops_monitor() {
        let (handle, _reporter, task) = spawn_monitor();

        handle.shutdown().await.unwrap();
        handle.shutdown().await.unwrap();
        assert!(!task.is_finished());
        handle.shutdown().await.unwrap();

        task.await.unwrap();
        let result = handle.leave_the_plane(0, 1).await;
        assert!(matches!(
            result,
            Err(AirliftError::Transport {
                monitor: MonitorKind::Destination,
                ..
            })
        ));
    }
}
