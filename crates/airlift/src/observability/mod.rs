//! Observability for the airlift: Prometheus metrics.
//!
//! Logging goes through `tracing` with per-component targets
//! (`airlift.monitor.*`, `airlift.entity.*`, `airlift.simulation`); the
//! subscriber is installed by the binary.

pub mod metrics;
