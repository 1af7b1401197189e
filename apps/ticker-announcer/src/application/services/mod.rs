//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `PollingScheduler`: drives the fetch/announce cycle for the active
//!   ticker generation

mod scheduler;

pub use scheduler::PollingScheduler;
