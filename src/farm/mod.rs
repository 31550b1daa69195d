//! # Farm
//!
//! The master side of the master/worker genetic algorithm: run parameters,
//! the fitness contract, chunk partitioning, the coordinator state machine and
//! the launcher that wires it to a worker pool.
pub mod challenge;
pub mod coordinator;
pub mod launcher;
pub mod options;
pub mod partition;

pub use challenge::Challenge;
pub use coordinator::{Coordinator, Event, Phase, Step};
pub use launcher::{Farm, RunResult};
pub use options::{FarmOptions, FarmOptionsBuilder, LogLevel};
