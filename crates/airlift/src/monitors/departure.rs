//! `DepartureMonitor` - the check-in counter at the departure airport.
//!
//! Owns the boarding queue and the hand-off flags between the hostess and
//! the passenger currently being served:
//!
//! 1. A passenger joins the FIFO and waits until the hostess calls them.
//! 2. The hostess dequeues the head, calls it and waits for the documents.
//! 3. The passenger shows the documents and waits for clearance.
//! 4. The hostess clears them and waits until they boarded and the next
//!    step (another passenger, or departure) is possible.
//! 5. The passenger boards, which wakes the hostess.

use crate::config::SimulationParams;
use crate::entities::{HostessState, PassengerId, PassengerState};
use crate::errors::AirliftError;
use crate::observability::metrics;
use crate::repository::Reporter;

use super::messages::{DepartureMessage, Transition};
use super::{request, MonitorKind, Responder, ShutdownQuorum, SHUTDOWN_QUORUM};

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default channel buffer size for the departure mailbox.
const DEPARTURE_CHANNEL_BUFFER: usize = 256;

/// Handle to the `DepartureMonitor`.
#[derive(Clone)]
pub struct DepartureMonitorHandle {
    sender: mpsc::Sender<DepartureMessage>,
}

impl DepartureMonitorHandle {
    /// Hostess: reset the per-flight boarding count and wait until a passenger is queued.
    pub async fn prepare_for_pass_boarding(
        &self,
    ) -> Result<Transition<HostessState>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Departure,
            "prepare_for_pass_boarding",
            |respond_to| DepartureMessage::PrepareForPassBoarding { respond_to },
        )
        .await
    }

    /// Passenger: join the boarding queue and wait until called by the hostess.
    pub async fn wait_in_queue(
        &self,
        passenger_id: PassengerId,
    ) -> Result<Transition<PassengerState>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Departure,
            "wait_in_queue",
            |respond_to| DepartureMessage::WaitInQueue {
                passenger_id,
                respond_to,
            },
        )
        .await
    }

    /// Hostess: call the head of the queue and wait for their documents.
    ///
    /// The value is true if more passengers are still queued.
    pub async fn check_documents(&self) -> Result<Transition<HostessState, bool>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Departure,
            "check_documents",
            |respond_to| DepartureMessage::CheckDocuments { respond_to },
        )
        .await
    }

    /// Passenger: show the documents and wait for clearance to board.
    pub async fn show_documents(&self) -> Result<(), AirliftError> {
        request(
            &self.sender,
            MonitorKind::Departure,
            "show_documents",
            |respond_to| DepartureMessage::ShowDocuments { respond_to },
        )
        .await
    }

    /// Hostess: clear the served passenger to board and wait for the next step.
    ///
    /// `hostess_count` counts the passengers served this flight including the
    /// one just cleared; `checked_passengers` counts those of earlier flights.
    /// The value is true if passengers are queued.
    pub async fn wait_for_next_passenger(
        &self,
        hostess_count: usize,
        checked_passengers: usize,
    ) -> Result<Transition<HostessState, bool>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Departure,
            "wait_for_next_passenger",
            |respond_to| DepartureMessage::WaitForNextPassenger {
                hostess_count,
                checked_passengers,
                respond_to,
            },
        )
        .await
    }

    /// Passenger: board the plane.
    pub async fn board_the_plane(
        &self,
        passenger_id: PassengerId,
    ) -> Result<Transition<PassengerState>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Departure,
            "board_the_plane",
            |respond_to| DepartureMessage::BoardThePlane {
                passenger_id,
                respond_to,
            },
        )
        .await
    }

    /// Whether no passenger is queued.
    pub async fn queue_empty(&self) -> Result<bool, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Departure,
            "queue_empty",
            |respond_to| DepartureMessage::QueueEmpty { respond_to },
        )
        .await
    }

    /// Number of queued passengers.
    pub async fn passengers_in_queue(&self) -> Result<usize, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Departure,
            "passengers_in_queue",
            |respond_to| DepartureMessage::PassengersInQueue { respond_to },
        )
        .await
    }

    /// Request shutdown on behalf of one client group.
    pub async fn shutdown(&self) -> Result<(), AirliftError> {
        request(
            &self.sender,
            MonitorKind::Departure,
            "shutdown",
            |respond_to| DepartureMessage::Shutdown { respond_to },
        )
        .await
    }
}

/// A blocked departure operation.
#[derive(Debug)]
enum Waiter {
    PrepareForPassBoarding {
        respond_to: Responder<Transition<HostessState>>,
    },
    WaitInQueue {
        passenger_id: PassengerId,
        respond_to: Responder<Transition<PassengerState>>,
    },
    CheckDocuments {
        respond_to: Responder<Transition<HostessState, bool>>,
    },
    ShowDocuments {
        respond_to: Responder<()>,
    },
    WaitForNextPassenger {
        hostess_count: usize,
        checked_passengers: usize,
        respond_to: Responder<Transition<HostessState, bool>>,
    },
}

/// The `DepartureMonitor` implementation.
pub struct DepartureMonitor {
    params: SimulationParams,
    receiver: mpsc::Receiver<DepartureMessage>,
    cancel_token: CancellationToken,
    reporter: Arc<dyn Reporter>,
    /// Passengers waiting in the queue.
    in_q: usize,
    /// Passengers boarded on the current flight.
    in_p: usize,
    boarding_queue: VecDeque<PassengerId>,
    /// Per passenger: the hostess has called them.
    called: Vec<bool>,
    /// The served passenger has boarded.
    ready_for_next_passenger: bool,
    /// The called passenger has shown the documents.
    ready_to_check_documents: bool,
    /// The hostess has cleared the passenger to board.
    can_board_the_plane: bool,
    parked: Vec<Waiter>,
    shutdown: ShutdownQuorum,
    messages_processed: u64,
}

impl DepartureMonitor {
    /// Spawn the departure monitor task.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        params: SimulationParams,
        reporter: Arc<dyn Reporter>,
        cancel_token: CancellationToken,
    ) -> (DepartureMonitorHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(DEPARTURE_CHANNEL_BUFFER);

        let monitor = Self {
            params,
            receiver,
            cancel_token,
            reporter,
            in_q: 0,
            in_p: 0,
            boarding_queue: VecDeque::with_capacity(params.passengers),
            called: vec![false; params.passengers],
            ready_for_next_passenger: false,
            ready_to_check_documents: false,
            can_board_the_plane: false,
            parked: Vec::new(),
            shutdown: ShutdownQuorum::new(SHUTDOWN_QUORUM),
            messages_processed: 0,
        };

        let task_handle = tokio::spawn(monitor.run());

        (DepartureMonitorHandle { sender }, task_handle)
    }

    /// Run the monitor message loop.
    #[instrument(skip_all, name = "airlift.monitor.departure")]
    async fn run(mut self) {
        info!(
            target: "airlift.monitor.departure",
            passengers = self.params.passengers,
            "DepartureMonitor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "airlift.monitor.departure",
                        "DepartureMonitor received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.messages_processed += 1;
                            if self.handle_message(message).is_break() {
                                info!(
                                    target: "airlift.monitor.departure",
                                    "DepartureMonitor shutdown quorum reached"
                                );
                                break;
                            }
                        }
                        None => {
                            info!(
                                target: "airlift.monitor.departure",
                                "DepartureMonitor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        if !self.parked.is_empty() {
            warn!(
                target: "airlift.monitor.departure",
                parked = self.parked.len(),
                "DepartureMonitor stopped with blocked callers"
            );
        }

        info!(
            target: "airlift.monitor.departure",
            messages_processed = self.messages_processed,
            shutdown_requests = self.shutdown.requests(),
            "DepartureMonitor stopped"
        );
    }

    /// Handle a single message, then wake every parked caller whose predicate holds.
    fn handle_message(&mut self, message: DepartureMessage) -> ControlFlow<()> {
        metrics::record_monitor_call(MonitorKind::Departure.as_str(), message.operation());

        match message {
            DepartureMessage::PrepareForPassBoarding { respond_to } => {
                self.reporter
                    .report_hostess_state(HostessState::WaitForPassenger);
                self.in_p = 0;
                self.parked
                    .push(Waiter::PrepareForPassBoarding { respond_to });
            }

            DepartureMessage::WaitInQueue {
                passenger_id,
                respond_to,
            } => match self.enqueue(passenger_id) {
                Ok(()) => self.parked.push(Waiter::WaitInQueue {
                    passenger_id,
                    respond_to,
                }),
                Err(e) => {
                    let _ = respond_to.send(Err(e));
                }
            },

            DepartureMessage::CheckDocuments { respond_to } => match self.call_next_passenger() {
                Ok(()) => self.parked.push(Waiter::CheckDocuments { respond_to }),
                Err(e) => {
                    let _ = respond_to.send(Err(e));
                }
            },

            DepartureMessage::ShowDocuments { respond_to } => {
                self.ready_to_check_documents = true;
                self.parked.push(Waiter::ShowDocuments { respond_to });
            }

            DepartureMessage::WaitForNextPassenger {
                hostess_count,
                checked_passengers,
                respond_to,
            } => {
                self.reporter
                    .report_hostess_state(HostessState::WaitForPassenger);
                self.can_board_the_plane = true;
                self.parked.push(Waiter::WaitForNextPassenger {
                    hostess_count,
                    checked_passengers,
                    respond_to,
                });
            }

            DepartureMessage::BoardThePlane {
                passenger_id,
                respond_to,
            } => {
                let result = self.board(passenger_id);
                let _ = respond_to.send(result);
            }

            DepartureMessage::QueueEmpty { respond_to } => {
                let _ = respond_to.send(Ok(self.in_q == 0));
            }

            DepartureMessage::PassengersInQueue { respond_to } => {
                let _ = respond_to.send(Ok(self.in_q));
            }

            DepartureMessage::Shutdown { respond_to } => {
                let _ = respond_to.send(Ok(()));
                if self.shutdown.register() {
                    return ControlFlow::Break(());
                }
            }
        }

        self.wake_all();
        ControlFlow::Continue(())
    }

    /// Append a passenger to the boarding queue.
    fn enqueue(&mut self, passenger_id: PassengerId) -> Result<(), AirliftError> {
        self.check_passenger_id(passenger_id)?;
        if self.boarding_queue.len() >= self.params.passengers {
            return Err(AirliftError::InvariantViolation(format!(
                "boarding queue overflow while queueing passenger {passenger_id}"
            )));
        }

        self.reporter
            .report_passenger_state(passenger_id, PassengerState::InQueue);
        self.in_q += 1;
        self.boarding_queue.push_back(passenger_id);
        metrics::set_boarding_queue_depth(self.in_q);

        debug!(
            target: "airlift.monitor.departure",
            passenger_id,
            in_q = self.in_q,
            "Passenger queued"
        );
        Ok(())
    }

    /// Dequeue the head of the boarding queue and mark it called.
    fn call_next_passenger(&mut self) -> Result<(), AirliftError> {
        self.reporter
            .report_hostess_state(HostessState::CheckPassenger);

        let passenger_id = self.boarding_queue.pop_front().ok_or_else(|| {
            AirliftError::InvariantViolation(
                "check_documents called with an empty boarding queue".to_string(),
            )
        })?;
        self.in_q = self.in_q.saturating_sub(1);
        metrics::set_boarding_queue_depth(self.in_q);

        let passengers = self.params.passengers;
        let called = self
            .called
            .get_mut(passenger_id)
            .ok_or(AirliftError::InvalidPassenger {
                id: passenger_id,
                passengers,
            })?;
        *called = true;

        debug!(
            target: "airlift.monitor.departure",
            passenger_id,
            in_q = self.in_q,
            "Passenger called to show documents"
        );
        Ok(())
    }

    fn board(&mut self, passenger_id: PassengerId) -> Result<Transition<PassengerState>, AirliftError> {
        self.check_passenger_id(passenger_id)?;

        self.ready_for_next_passenger = true;
        self.in_p += 1;
        self.reporter
            .report_passenger_state(passenger_id, PassengerState::InFlight);

        debug!(
            target: "airlift.monitor.departure",
            passenger_id,
            in_p = self.in_p,
            "Passenger boarded"
        );
        Ok(Transition::to(PassengerState::InFlight))
    }

    fn check_passenger_id(&self, passenger_id: PassengerId) -> Result<(), AirliftError> {
        if passenger_id < self.params.passengers {
            Ok(())
        } else {
            Err(AirliftError::InvalidPassenger {
                id: passenger_id,
                passengers: self.params.passengers,
            })
        }
    }

    /// Resume parked callers, oldest first, until no predicate holds.
    fn wake_all(&mut self) {
        while let Some(index) = self.parked.iter().position(|w| self.can_resume(w)) {
            let waiter = self.parked.remove(index);
            self.resume(waiter);
        }
    }

    fn can_resume(&self, waiter: &Waiter) -> bool {
        match waiter {
            Waiter::PrepareForPassBoarding { .. } => self.in_q > 0,
            Waiter::WaitInQueue { passenger_id, .. } => {
                self.called.get(*passenger_id).copied().unwrap_or(false)
            }
            Waiter::CheckDocuments { .. } => self.ready_to_check_documents,
            Waiter::ShowDocuments { .. } => self.can_board_the_plane,
            Waiter::WaitForNextPassenger {
                hostess_count,
                checked_passengers,
                ..
            } => {
                // The final group never waits: everyone has boarded.
                let all_boarded = self.in_p + checked_passengers >= self.params.passengers;
                let next_step_possible =
                    self.in_q > 0 || *hostess_count >= self.params.min_boarding;
                all_boarded || (next_step_possible && self.ready_for_next_passenger)
            }
        }
    }

    fn resume(&mut self, waiter: Waiter) {
        match waiter {
            Waiter::PrepareForPassBoarding { respond_to } => {
                let _ = respond_to.send(Ok(Transition::to(HostessState::WaitForPassenger)));
            }
            Waiter::WaitInQueue {
                passenger_id,
                respond_to,
            } => {
                if let Some(called) = self.called.get_mut(passenger_id) {
                    *called = false;
                }
                let _ = respond_to.send(Ok(Transition::to(PassengerState::InQueue)));
            }
            Waiter::CheckDocuments { respond_to } => {
                self.ready_to_check_documents = false;
                let _ = respond_to.send(Ok(Transition::with(
                    HostessState::CheckPassenger,
                    self.in_q > 0,
                )));
            }
            Waiter::ShowDocuments { respond_to } => {
                self.can_board_the_plane = false;
                let _ = respond_to.send(Ok(()));
            }
            Waiter::WaitForNextPassenger { respond_to, .. } => {
                self.ready_for_next_passenger = false;
                let _ = respond_to.send(Ok(Transition::with(
                    HostessState::WaitForPassenger,
                    self.in_q > 0,
                )));
            }
        }
    }
}
