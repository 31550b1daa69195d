//! # Error Types
//!
//! This module defines the error type shared by every part of the farm. Each
//! variant corresponds to a fatal condition: once a run hits one of them the
//! launcher stops and hands the error back to the caller.
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use tsp_farm::error::{FarmError, Result};
//!
//! fn check_workers(num_workers: usize) -> Result<()> {
//!     if num_workers == 0 {
//!         return Err(FarmError::InvalidConfiguration(
//!             "Number of workers cannot be zero".to_string(),
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_workers(0).is_err());
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use tsp_farm::error::{FarmError, OptionExt};
//!
//! fn first_cost(costs: &[f64]) -> tsp_farm::error::Result<f64> {
//!     costs.first().copied().ok_or_else_farm(|| {
//!         FarmError::InvalidConfiguration("empty fitness table".to_string())
//!     })
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

use crate::tour::Tour;

/// Represents errors that can occur while running the farm.
#[derive(Error, Debug)]
pub enum FarmError {
    /// Run parameters or the initial population were rejected before the first generation.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A population slot does not hold a full permutation of the cities.
    #[error("Corrupt population at slot {slot}: {reason}")]
    CorruptPopulation { slot: usize, reason: String },

    /// The chunk ranges of a generation do not cover every slot exactly once.
    #[error("Incomplete partition: {0}")]
    IncompletePartition(String),

    /// The feedback channel delivered something the barrier cannot account for.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// The fitness function failed or produced a non-finite cost.
    #[error("Fitness evaluation failed for tour {tour:?}: {reason}")]
    FitnessEvaluation { tour: Tour, reason: String },

    /// A worker panicked while processing a chunk.
    #[error("Worker lost: {0}")]
    WorkerLost(String),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for farm operations.
pub type Result<T> = std::result::Result<T, FarmError>;

/// Extension trait for Result to add context to errors.
///
/// ## Examples
///
/// ```rust
/// use tsp_farm::error::ResultExt;
///
/// fn parse_workers(raw: &str) -> tsp_farm::error::Result<usize> {
///     raw.parse::<usize>().context("Failed to parse worker count")
/// }
///
/// assert!(parse_workers("four").is_err());
/// ```
pub trait ResultExt<T, E> {
    /// Converts the error into `FarmError::Other`, prefixed with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| FarmError::Other(format!("{}: {}", context, e)))
    }
}

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, FarmError>` using
    /// a closure to generate the error.
    fn ok_or_else_farm<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> FarmError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_farm<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> FarmError,
    {
        self.ok_or_else(err_fn)
    }
}
