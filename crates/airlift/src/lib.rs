//! Airlift Simulation Library
//!
//! Concurrent simulation of a shuttle airlift: N passengers travel to the
//! departure airport, queue, have their documents checked by a hostess, board
//! a plane that a pilot flies to the destination, and disembark. The run ends
//! once every passenger has reached the destination.
//!
//! # Architecture
//!
//! The actors never share memory. They coordinate exclusively through three
//! monitors, each a single task that owns its state:
//!
//! ```text
//! Passenger (N) ──┬──▶ DepartureMonitor   (queue, document check, boarding)
//!                 ├──▶ PlaneMonitor       (seats, take-off, deboarding)
//!                 └──▶ DestinationMonitor (disembark count)
//! Hostess ────────┬──▶ DepartureMonitor
//!                 └──▶ PlaneMonitor
//! Pilot ──────────────▶ PlaneMonitor
//!
//! every monitor ──▶ Reporter (audit log)
//! ```
//!
//! # Key Design Decisions
//!
//! - **Explicit state passing**: monitor calls return the caller's new state
//! - **Broadcast wake**: every parked request is re-tested after every message
//! - **Strict FIFO**: passengers are called in arrival order
//! - **Shutdown quorum**: a monitor stops once all three client groups are done
//! - **Fail fast**: any actor failure aborts the whole run
//!
//! # Modules
//!
//! - [`config`] - Simulation parameters and delays from environment
//! - [`entities`] - Passenger, hostess and pilot life cycles
//! - [`errors`] - Error types
//! - [`monitors`] - Departure, plane and destination monitors
//! - [`observability`] - Prometheus metrics
//! - [`repository`] - Reporter trait and the audit log writer
//! - [`simulation`] - Runner wiring monitors and actors together

pub mod config;
pub mod entities;
pub mod errors;
pub mod monitors;
pub mod observability;
pub mod repository;
pub mod simulation;
