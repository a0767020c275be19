//! `PlaneMonitor` - boarding completion, flight and deboarding hand-offs.
//!
//! The pilot and the hostess meet here twice per flight: the pilot signals
//! that boarding may start (`next_flight`), the hostess signals that boarding
//! is complete (`ready_to_take_off`). Passengers take a seat and wait for the
//! pilot to announce the arrival; the last one out empties the plane and
//! releases the pilot.
//!
//! The hostess announces how many passengers were cleared. The pilot only takes
//! off once that many passengers are seated, so a passenger that boarded but
//! has not yet taken a seat cannot be left behind.

use crate::config::SimulationParams;
use crate::entities::{HostessState, PassengerId, PilotState};
use crate::errors::AirliftError;
use crate::observability::metrics;
use crate::repository::Reporter;

use super::messages::{Arrival, PlaneMessage, Transition};
use super::{request, MonitorKind, Responder, ShutdownQuorum, SHUTDOWN_QUORUM};

use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

const PLANE_CHANNEL_BUFFER: usize = 256;

/// Handle to the `PlaneMonitor`.
#[derive(Clone)]
pub struct PlaneMonitorHandle {
    sender: mpsc::Sender<PlaneMessage>,
}

impl PlaneMonitorHandle {
    /// Passengers currently on board.
    pub async fn get_in_f(&self) -> Result<usize, AirliftError> {
        request(&self.sender, MonitorKind::Plane, "get_in_f", |respond_to| {
            PlaneMessage::GetInF { respond_to }
        })
        .await
    }

    pub async fn park_at_transfer_gate(&self) -> Result<Transition<PilotState>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Plane,
            "park_at_transfer_gate",
            |respond_to| PlaneMessage::ParkAtTransferGate { respond_to },
        )
        .await
    }

    pub async fn inform_plane_ready_for_boarding(
        &self,
    ) -> Result<Transition<PilotState>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Plane,
            "inform_plane_ready_for_boarding",
            |respond_to| PlaneMessage::InformPlaneReadyForBoarding { respond_to },
        )
        .await
    }

    /// Hostess: wait until the pilot is ready for the next boarding.
    ///
    /// Returns the number of passengers of all completed boardings. Does not
    /// wait once that number covers every passenger.
    pub async fn wait_for_next_flight(
        &self,
        first: bool,
        checked_passengers: usize,
    ) -> Result<Transition<HostessState, usize>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Plane,
            "wait_for_next_flight",
            |respond_to| PlaneMessage::WaitForNextFlight {
                first,
                checked_passengers,
                respond_to,
            },
        )
        .await
    }

    pub async fn wait_for_all_in_boarding(&self) -> Result<Transition<PilotState>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Plane,
            "wait_for_all_in_boarding",
            |respond_to| PlaneMessage::WaitForAllInBoarding { respond_to },
        )
        .await
    }

    pub async fn inform_plane_ready_to_take_off(
        &self,
        headcount: usize,
    ) -> Result<Transition<HostessState>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Plane,
            "inform_plane_ready_to_take_off",
            |respond_to| PlaneMessage::InformPlaneReadyToTakeOff {
                headcount,
                respond_to,
            },
        )
        .await
    }

    pub async fn wait_for_end_of_flight(&self) -> Result<(), AirliftError> {
        request(
            &self.sender,
            MonitorKind::Plane,
            "wait_for_end_of_flight",
            |respond_to| PlaneMessage::WaitForEndOfFlight { respond_to },
        )
        .await
    }

    /// Pilot: announce the arrival and wait for the plane to empty.
    ///
    /// Replies `transported_passengers` plus this flight's headcount, and the
    /// passenger that emptied the plane.
    pub async fn announce_arrival(
        &self,
        transported_passengers: usize,
    ) -> Result<Transition<PilotState, Arrival>, AirliftError> {
        request(
            &self.sender,
            MonitorKind::Plane,
            "announce_arrival",
            |respond_to| PlaneMessage::AnnounceArrival {
                transported_passengers,
                respond_to,
            },
        )
        .await
    }

    pub async fn notify_pilot(&self, passenger_id: PassengerId) -> Result<(), AirliftError> {
        request(&self.sender, MonitorKind::Plane, "notify_pilot", |respond_to| {
            PlaneMessage::NotifyPilot {
                passenger_id,
                respond_to,
            }
        })
        .await
    }

    pub async fn report_final_report(&self) -> Result<(), AirliftError> {
        request(
            &self.sender,
            MonitorKind::Plane,
            "report_final_report",
            |respond_to| PlaneMessage::ReportFinalReport { respond_to },
        )
        .await
    }

    pub async fn shutdown(&self) -> Result<(), AirliftError> {
        request(&self.sender, MonitorKind::Plane, "shutdown", |respond_to| {
            PlaneMessage::Shutdown { respond_to }
        })
        .await
    }
}

#[derive(Debug)]
enum Waiter {
    NextFlight {
        boarded_so_far: usize,
        respond_to: Responder<Transition<HostessState, usize>>,
    },
    AllInBoarding {
        respond_to: Responder<Transition<PilotState>>,
    },
    EndOfFlight {
        respond_to: Responder<()>,
    },
    Deboarded {
        total: usize,
        respond_to: Responder<Transition<PilotState, Arrival>>,
    },
}

/// The `PlaneMonitor` implementation.
pub struct PlaneMonitor {
    params: SimulationParams,
    receiver: mpsc::Receiver<PlaneMessage>,
    cancel_token: CancellationToken,
    reporter: Arc<dyn Reporter>,
    /// Passengers seated.
    in_f: usize,
    next_flight: bool,
    ready_to_take_off: bool,
    start_deboarding: bool,
    /// Passengers the hostess cleared for the boarding in progress or, once
    /// it departed, for the last departed flight.
    departing_headcount: usize,
    /// Passenger that emptied the plane on the flight being deboarded.
    last_passenger: Option<PassengerId>,
    final_report_sent: bool,
    parked: Vec<Waiter>,
    shutdown: ShutdownQuorum,
    messages_processed: u64,
}

impl PlaneMonitor {
    /// Spawn the plane monitor task.
    pub fn spawn(
        params: SimulationParams,
        reporter: Arc<dyn Reporter>,
        cancel_token: CancellationToken,
    ) -> (PlaneMonitorHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(PLANE_CHANNEL_BUFFER);

        let monitor = Self {
            params,
            receiver,
            cancel_token,
            reporter,
            in_f: 0,
            next_flight: false,
            ready_to_take_off: false,
            start_deboarding: false,
            departing_headcount: 0,
            last_passenger: None,
            final_report_sent: false,
            parked: Vec::new(),
            shutdown: ShutdownQuorum::new(SHUTDOWN_QUORUM),
            messages_processed: 0,
        };

        let task_handle = tokio::spawn(monitor.run());

        (PlaneMonitorHandle { sender }, task_handle)
    }

    #[instrument(skip_all, name = "airlift.monitor.plane")]
    async fn run(mut self) {
        info!(
            target: "airlift.monitor.plane",
            max_seats = self.params.max_seats,
            "PlaneMonitor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: "airlift.monitor.plane", "PlaneMonitor received cancellation signal");
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.messages_processed += 1;
                            if self.handle_message(message).is_break() {
                                info!(target: "airlift.monitor.plane", "PlaneMonitor shutdown quorum reached");
                                break;
                            }
                        }
                        None => {
                            info!(target: "airlift.monitor.plane", "PlaneMonitor channel closed, exiting");
                            break;
                        }
                    }
                }
            }
        }

        if !self.parked.is_empty() {
            warn!(
                target: "airlift.monitor.plane",
                parked = self.parked.len(),
                "PlaneMonitor stopped with blocked callers"
            );
        }

        info!(
            target: "airlift.monitor.plane",
            messages_processed = self.messages_processed,
            shutdown_requests = self.shutdown.requests(),
            "PlaneMonitor stopped"
        );
    }

    fn handle_message(&mut self, message: PlaneMessage) -> ControlFlow<()> {
        metrics::record_monitor_call(MonitorKind::Plane.as_str(), message.operation());

        match message {
            PlaneMessage::GetInF { respond_to } => {
                let _ = respond_to.send(Ok(self.in_f));
            }

            PlaneMessage::ParkAtTransferGate { respond_to } => {
                self.reporter.report_pilot_state(PilotState::AtTransferGate);
                let _ = respond_to.send(Ok(Transition::to(PilotState::AtTransferGate)));
            }

            PlaneMessage::InformPlaneReadyForBoarding { respond_to } => {
                self.next_flight = true;
                self.reporter.report_pilot_state(PilotState::ReadyForBoarding);
                let _ = respond_to.send(Ok(Transition::to(PilotState::ReadyForBoarding)));
            }

            PlaneMessage::WaitForNextFlight {
                first,
                checked_passengers,
                respond_to,
            } => {
                if !first {
                    self.reporter.report_hostess_state(HostessState::WaitForFlight);
                }
                let last_flight = if first { 0 } else { self.departing_headcount };
                let boarded_so_far = checked_passengers + last_flight;

                if boarded_so_far > self.params.passengers {
                    let _ = respond_to.send(Err(AirliftError::InvariantViolation(format!(
                        "{boarded_so_far} passengers boarded out of {}",
                        self.params.passengers
                    ))));
                } else if boarded_so_far == self.params.passengers {
                    let _ = respond_to.send(Ok(Transition::with(
                        HostessState::WaitForFlight,
                        boarded_so_far,
                    )));
                } else {
                    self.parked.push(Waiter::NextFlight {
                        boarded_so_far,
                        respond_to,
                    });
                }
            }

            PlaneMessage::WaitForAllInBoarding { respond_to } => {
                self.reporter
                    .report_pilot_state(PilotState::WaitingForBoarding);
                self.parked.push(Waiter::AllInBoarding { respond_to });
            }

            PlaneMessage::InformPlaneReadyToTakeOff {
                headcount,
                respond_to,
            } => {
                if headcount == 0 || headcount > self.params.max_seats {
                    let _ = respond_to.send(Err(AirliftError::InvariantViolation(format!(
                        "boarding completed with {headcount} passengers, plane seats {}",
                        self.params.max_seats
                    ))));
                } else {
                    self.departing_headcount = headcount;
                    self.ready_to_take_off = true;
                    self.reporter.report_hostess_state(HostessState::ReadyToFly);
                    let _ = respond_to.send(Ok(Transition::to(HostessState::ReadyToFly)));
                }
            }

            PlaneMessage::WaitForEndOfFlight { respond_to } => {
                if self.in_f >= self.params.max_seats {
                    let _ = respond_to.send(Err(AirliftError::InvariantViolation(format!(
                        "plane is full with {} passengers",
                        self.in_f
                    ))));
                } else {
                    self.in_f += 1;
                    self.parked.push(Waiter::EndOfFlight { respond_to });
                }
            }

            PlaneMessage::AnnounceArrival {
                transported_passengers,
                respond_to,
            } => {
                self.reporter.report_pilot_state(PilotState::Deboarding);
                let headcount = self.in_f;
                let total = transported_passengers + headcount;

                if headcount == 0 || total > self.params.passengers {
                    let _ = respond_to.send(Err(AirliftError::InvariantViolation(format!(
                        "arrival with {headcount} passengers after {transported_passengers} transported"
                    ))));
                } else {
                    self.start_deboarding = true;
                    debug!(
                        target: "airlift.monitor.plane",
                        headcount,
                        "Plane arrived, deboarding"
                    );
                    self.parked.push(Waiter::Deboarded { total, respond_to });
                }
            }

            PlaneMessage::NotifyPilot {
                passenger_id,
                respond_to,
            } => {
                self.in_f = 0;
                self.last_passenger = Some(passenger_id);
                let _ = respond_to.send(Ok(()));
            }

            PlaneMessage::ReportFinalReport { respond_to } => {
                if self.final_report_sent {
                    warn!(
                        target: "airlift.monitor.plane",
                        "Final report already emitted, ignoring"
                    );
                } else {
                    self.final_report_sent = true;
                    self.reporter.report_final_summary();
                }
                let _ = respond_to.send(Ok(()));
            }

            PlaneMessage::Shutdown { respond_to } => {
                let _ = respond_to.send(Ok(()));
                if self.shutdown.register() {
                    return ControlFlow::Break(());
                }
            }
        }

        self.wake_all();
        ControlFlow::Continue(())
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
            Waiter::NextFlight { .. } => self.next_flight,
            Waiter::AllInBoarding { .. } => {
                self.ready_to_take_off && self.in_f == self.departing_headcount
            }
            Waiter::EndOfFlight { .. } => self.start_deboarding,
            Waiter::Deboarded { .. } => self.in_f == 0,
        }
    }

    fn resume(&mut self, waiter: Waiter) {
        match waiter {
            Waiter::NextFlight {
                boarded_so_far,
                respond_to,
            } => {
                self.next_flight = false;
                let _ = respond_to.send(Ok(Transition::with(
                    HostessState::WaitForFlight,
                    boarded_so_far,
                )));
            }
            Waiter::AllInBoarding { respond_to } => {
                self.ready_to_take_off = false;
                self.reporter.report_pilot_state(PilotState::FlyingForward);
                metrics::record_flight_departed(self.departing_headcount);
                info!(
                    target: "airlift.monitor.plane",
                    headcount = self.departing_headcount,
                    "Plane took off"
                );
                let _ = respond_to.send(Ok(Transition::to(PilotState::FlyingForward)));
            }
            Waiter::EndOfFlight { respond_to } => {
                let _ = respond_to.send(Ok(()));
            }
            Waiter::Deboarded { total, respond_to } => {
                self.start_deboarding = false;
                let Some(last_passenger) = self.last_passenger.take() else {
                    let _ = respond_to.send(Err(AirliftError::InvariantViolation(
                        "plane emptied without a last passenger".to_string(),
                    )));
                    return;
                };
                self.reporter.report_pilot_state(PilotState::FlyingBack);
                metrics::set_passengers_transported(total);
                let _ = respond_to.send(Ok(Transition::with(
                    PilotState::FlyingBack,
                    Arrival {
                        transported_passengers: total,
                        last_passenger,
                    },
                )));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::repository::{MemoryReporter, ReportedEvent};
    use std::time::Duration;
    use tokio::time::timeout;

    const STEP: Duration = Duration::from_secs(5);

    fn spawn_monitor(
        passengers: usize,
        min_boarding: usize,
        max_seats: usize,
    ) -> (PlaneMonitorHandle, Arc<MemoryReporter>, CancellationToken) {
        let params = SimulationParams::new(passengers, min_boarding, max_seats).unwrap();
        let reporter = Arc::new(MemoryReporter::new());
        let cancel_token = CancellationToken::new();
        let (handle, _task) = PlaneMonitor::spawn(params, reporter.clone(), cancel_token.clone());
        (handle, reporter, cancel_token)
    }

    fn spawn_seated_passenger(handle: &PlaneMonitorHandle) -> JoinHandle<()> {
        let handle = handle.clone();
        tokio::spawn(async move { handle.wait_for_end_of_flight().await.unwrap() })
    }

    async fn wait_for_in_f(handle: &PlaneMonitorHandle, expected: usize) {
        timeout(STEP, async {
            while handle.get_in_f().await.unwrap() != expected {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("plane never reached the expected headcount");
    }

    #[tokio::test]
    async fn test_first_wait_for_next_flight_blocks_until_pilot_ready() {
        let (handle, reporter, _cancel) = spawn_monitor(5, 1, 5);

        let hostess = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait_for_next_flight(true, 0).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!hostess.is_finished());

        handle.park_at_transfer_gate().await.unwrap();
        let transition = handle.inform_plane_ready_for_boarding().await.unwrap();
        assert_eq!(transition.state, PilotState::ReadyForBoarding);

        let transition = timeout(STEP, hostess).await.unwrap().unwrap().unwrap();
        assert_eq!(transition.state, HostessState::WaitForFlight);
        assert_eq!(transition.value, 0);

        // The first call reports nothing for the hostess.
        assert_eq!(
            reporter.events(),
            vec![
                ReportedEvent::Pilot(PilotState::AtTransferGate),
                ReportedEvent::Pilot(PilotState::ReadyForBoarding),
            ]
        );
    }

    #[tokio::test]
    async fn test_pilot_waits_until_announced_passengers_are_seated() {
        let (handle, reporter, _cancel) = spawn_monitor(5, 1, 5);

        let pilot = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait_for_all_in_boarding().await })
        };

        spawn_seated_passenger(&handle);
        wait_for_in_f(&handle, 1).await;
        handle.inform_plane_ready_to_take_off(2).await.unwrap();

        // One of two cleared passengers is still on the way to the seat.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pilot.is_finished());

        spawn_seated_passenger(&handle);

        let transition = timeout(STEP, pilot).await.unwrap().unwrap().unwrap();
        assert_eq!(transition.state, PilotState::FlyingForward);
        assert!(reporter
            .events()
            .contains(&ReportedEvent::Hostess(HostessState::ReadyToFly)));
    }

    #[tokio::test]
    async fn test_announce_arrival_waits_for_last_passenger() {
        let (handle, reporter, _cancel) = spawn_monitor(5, 1, 5);

        let passengers = vec![spawn_seated_passenger(&handle), spawn_seated_passenger(&handle)];
        wait_for_in_f(&handle, 2).await;

        let pilot = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.announce_arrival(3).await })
        };

        // Deboarding releases every seated passenger.
        for passenger in passengers {
            timeout(STEP, passenger).await.unwrap().unwrap();
        }
        assert_eq!(handle.get_in_f().await.unwrap(), 2);
        assert!(!pilot.is_finished());

        handle.notify_pilot(4).await.unwrap();

        let transition = timeout(STEP, pilot).await.unwrap().unwrap().unwrap();
        assert_eq!(transition.state, PilotState::FlyingBack);
        assert_eq!(
            transition.value,
            Arrival {
                transported_passengers: 5,
                last_passenger: 4,
            }
        );
        assert_eq!(handle.get_in_f().await.unwrap(), 0);

        let events = reporter.events();
        assert_eq!(
            events,
            vec![
                ReportedEvent::Pilot(PilotState::Deboarding),
                ReportedEvent::Pilot(PilotState::FlyingBack),
            ]
        );
    }

    #[tokio::test]
    async fn test_wait_for_next_flight_adds_departed_headcount() {
        let (handle, reporter, _cancel) = spawn_monitor(6, 1, 5);

        handle.inform_plane_ready_to_take_off(4).await.unwrap();

        // 4 of 6 passengers boarded: wait for the plane to come back.
        let hostess = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait_for_next_flight(false, 0).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!hostess.is_finished());

        handle.inform_plane_ready_for_boarding().await.unwrap();
        let transition = timeout(STEP, hostess).await.unwrap().unwrap().unwrap();
        assert_eq!(transition.value, 4);

        // The remaining 2 board: every passenger is accounted for, no wait.
        handle.inform_plane_ready_to_take_off(2).await.unwrap();
        let transition = timeout(STEP, handle.wait_for_next_flight(false, 4))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(transition.state, HostessState::WaitForFlight);
        assert_eq!(transition.value, 6);

        let hostess_events: Vec<_> = reporter
            .events()
            .into_iter()
            .filter(|event| matches!(event, ReportedEvent::Hostess(_)))
            .collect();
        assert_eq!(
            hostess_events,
            vec![
                ReportedEvent::Hostess(HostessState::ReadyToFly),
                ReportedEvent::Hostess(HostessState::WaitForFlight),
                ReportedEvent::Hostess(HostessState::ReadyToFly),
                ReportedEvent::Hostess(HostessState::WaitForFlight),
            ]
        );
    }

    #[tokio::test]
    async fn test_final_report_is_emitted_once() {
        let (handle, reporter, _cancel) = spawn_monitor(5, 1, 5);

        handle.report_final_report().await.unwrap();
        handle.report_final_report().await.unwrap();

        let summaries = reporter
            .events()
            .into_iter()
            .filter(|event| *event == ReportedEvent::FinalSummary)
            .count();
        assert_eq!(summaries, 1);
    }

    #[tokio::test]
    async fn test_invalid_headcount_is_invariant_violation() {
        let (handle, _reporter, _cancel) = spawn_monitor(20, 1, 5);

        let result = handle.inform_plane_ready_to_take_off(0).await;
        assert!(matches!(result, Err(AirliftError::InvariantViolation(_))));

        let result = handle.inform_plane_ready_to_take_off(6).await;
        assert!(matches!(result, Err(AirliftError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn test_arrival_with_empty_plane_is_invariant_violation() {
        let (handle, _reporter, _cancel) = spawn_monitor(5, 1, 5);

        let result = handle.announce_arrival(0).await;
        assert!(matches!(result, Err(AirliftError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn test_shutdown_quorum_fails_blocked_passenger() {
        let params = SimulationParams::new(5, 1, 5).unwrap();
        let (handle, task) = PlaneMonitor::spawn(
            params,
            Arc::new(MemoryReporter::new()),
            CancellationToken::new(),
        );

        let passenger = spawn_seated_passenger_result(&handle);
        wait_for_in_f(&handle, 1).await;

        for _ in 0..SHUTDOWN_QUORUM {
            handle.shutdown().await.unwrap();
        }
        timeout(STEP, task).await.unwrap().unwrap();

        let result = timeout(STEP, passenger).await.unwrap().unwrap();
        assert!(matches!(
            result,
            Err(AirliftError::Transport {
                monitor: MonitorKind::Plane,
                operation: "wait_for_end_of_flight",
                ..
            })
        ));
    }

    fn spawn_seated_passenger_result(
        handle: &PlaneMonitorHandle,
    ) -> JoinHandle<Result<(), AirliftError>> {
        let handle = handle.clone();
        tokio::spawn(async move { handle.wait_for_end_of_flight().await })
    }
}
