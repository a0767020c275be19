//! # Airlift Test Utilities
//!
//! Shared test utilities for the Airlift simulation.
//!
//! ## Modules
//!
//! - `fixtures` - Pre-configured parameters, configs and reporters
//! - `scenario` - Drivers for whole runs with a controlled start
//! - `assertions` - Verification helpers over reported events
//!
//! ## Usage
//!
//! ```rust,ignore
//! use airlift_test_utils::*;
//!
//! #[tokio::test(flavor = "multi_thread")]
//! async fn test_example() {
//!     let run = run_with_full_queue(default_params()).await;
//!
//!     assert_eq!(run.pilot.flights, vec![10, 10, 1]);
//!     assert_passenger_lifecycles(&run.events, 21);
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod scenario;

pub use assertions::*;
pub use fixtures::*;
pub use scenario::*;
