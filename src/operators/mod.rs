//! # Genetic Operators
//!
//! Permutation-preserving operators applied by workers to their chunk:
//! segment-exchange crossover followed by repair, and swap mutation.
pub mod crossover;
pub mod mutation;

pub use crossover::{crossover_pair, exchange_segment, repair_pair};
pub use mutation::swap_mutation;
