//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the polling scheduler and the port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for external systems (market data source).
pub mod ports;

/// Application services driving the polling schedule.
pub mod services;
