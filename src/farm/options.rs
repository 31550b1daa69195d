//! # FarmOptions
//!
//! The `FarmOptions` struct holds the run parameters of the farm: population
//! size, number of workers, number of generations (epochs), and the crossover
//! and mutation probabilities.
//!
//! ## Example
//!
//! ```rust
//! use tsp_farm::farm::options::{FarmOptions, LogLevel};
//!
//! // Create a new FarmOptions instance with custom parameters
//! let custom_options = FarmOptions::new(64, 4, 200, 0.8, 0.1);
//! assert!(custom_options.validate().is_ok());
//!
//! // Or through the builder
//! let options = FarmOptions::builder()
//!     .population_size(32)
//!     .num_workers(2)
//!     .max_epochs(50)
//!     .log_level(LogLevel::Minimal)
//!     .seed(7)
//!     .build();
//! assert_eq!(options.get_seed(), Some(7));
//! ```
//!
//! ### `LogLevel`
//!
//! Controls how much per-generation progress the farm reports through
//! `tracing`:
//!
//! - `Verbose`: generation progress plus chunk dispatch and barrier details.
//! - `Minimal`: one line per generation.
//! - `None`: only run start and end.

use crate::error::{FarmError, Result};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Verbose,
    Minimal,
    None,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FarmOptions {
    population_size: usize,
    num_workers: usize,
    max_epochs: usize,
    crossover_prob: f64,
    mutation_prob: f64,
    /// Base seed for the per-worker generators; entropy when absent
    seed: Option<u64>,
    log_level: LogLevel,
}

impl FarmOptions {
    pub fn new(
        population_size: usize,
        num_workers: usize,
        max_epochs: usize,
        crossover_prob: f64,
        mutation_prob: f64,
    ) -> Self {
        Self {
            population_size,
            num_workers,
            max_epochs,
            crossover_prob,
            mutation_prob,
            seed: None,
            log_level: LogLevel::None,
        }
    }

    /// Checks the parameters before any generation starts.
    ///
    /// # Errors
    ///
    /// Returns `FarmError::InvalidConfiguration` if:
    /// - `num_workers` is zero
    /// - `population_size` is smaller than `num_workers`
    /// - either probability lies outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(FarmError::InvalidConfiguration(
                "Number of workers cannot be zero".to_string(),
            ));
        }

        if self.population_size < self.num_workers {
            return Err(FarmError::InvalidConfiguration(format!(
                "Population size {} is smaller than the number of workers {}",
                self.population_size, self.num_workers
            )));
        }

        for (name, p) in [
            ("Crossover", self.crossover_prob),
            ("Mutation", self.mutation_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(FarmError::InvalidConfiguration(format!(
                    "{} probability {} is outside [0, 1]",
                    name, p
                )));
            }
        }

        Ok(())
    }

    pub fn get_population_size(&self) -> usize {
        self.population_size
    }

    pub fn get_num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn get_max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn get_crossover_prob(&self) -> f64 {
        self.crossover_prob
    }

    pub fn get_mutation_prob(&self) -> f64 {
        self.mutation_prob
    }

    pub fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn get_log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn set_population_size(&mut self, population_size: usize) {
        self.population_size = population_size;
    }

    pub fn set_num_workers(&mut self, num_workers: usize) {
        self.num_workers = num_workers;
    }

    pub fn set_max_epochs(&mut self, max_epochs: usize) {
        self.max_epochs = max_epochs;
    }

    pub fn set_crossover_prob(&mut self, p: f64) {
        self.crossover_prob = p;
    }

    pub fn set_mutation_prob(&mut self, p: f64) {
        self.mutation_prob = p;
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }

    pub fn set_log_level(&mut self, log_level: LogLevel) {
        self.log_level = log_level;
    }

    /// Returns a builder for creating a `FarmOptions` instance.
    pub fn builder() -> FarmOptionsBuilder {
        FarmOptionsBuilder::default()
    }
}

impl Default for FarmOptions {
    fn default() -> Self {
        Self {
            population_size: 100,
            num_workers: 4,
            max_epochs: 100,
            crossover_prob: 0.8,
            mutation_prob: 0.1,
            seed: None,
            log_level: LogLevel::None,
        }
    }
}

/// Builder for `FarmOptions`.
///
/// Unset fields fall back to `FarmOptions::default()`.
#[derive(Debug, Clone, Default)]
pub struct FarmOptionsBuilder {
    population_size: Option<usize>,
    num_workers: Option<usize>,
    max_epochs: Option<usize>,
    crossover_prob: Option<f64>,
    mutation_prob: Option<f64>,
    seed: Option<u64>,
    log_level: Option<LogLevel>,
}

impl FarmOptionsBuilder {
    pub fn population_size(mut self, value: usize) -> Self {
        self.population_size = Some(value);
        self
    }

    pub fn num_workers(mut self, value: usize) -> Self {
        self.num_workers = Some(value);
        self
    }

    pub fn max_epochs(mut self, value: usize) -> Self {
        self.max_epochs = Some(value);
        self
    }

    pub fn crossover_prob(mut self, value: f64) -> Self {
        self.crossover_prob = Some(value);
        self
    }

    pub fn mutation_prob(mut self, value: f64) -> Self {
        self.mutation_prob = Some(value);
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    pub fn log_level(mut self, value: LogLevel) -> Self {
        self.log_level = Some(value);
        self
    }

    pub fn build(self) -> FarmOptions {
        let default = FarmOptions::default();
        FarmOptions {
            population_size: self.population_size.unwrap_or(default.population_size),
            num_workers: self.num_workers.unwrap_or(default.num_workers),
            max_epochs: self.max_epochs.unwrap_or(default.max_epochs),
            crossover_prob: self.crossover_prob.unwrap_or(default.crossover_prob),
            mutation_prob: self.mutation_prob.unwrap_or(default.mutation_prob),
            seed: self.seed.or(default.seed),
            log_level: self.log_level.unwrap_or(default.log_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(FarmOptions::default().validate().is_ok());
    }

    #[test]
    fn test_builder_falls_back_to_defaults() {
        let options = FarmOptions::builder().num_workers(8).build();
        let default = FarmOptions::default();
        assert_eq!(options.get_num_workers(), 8);
        assert_eq!(options.get_population_size(), default.get_population_size());
        assert_eq!(options.get_crossover_prob(), default.get_crossover_prob());
        assert_eq!(options.get_seed(), None);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let options = FarmOptions::new(10, 0, 5, 0.5, 0.5);
        match options.validate() {
            Err(FarmError::InvalidConfiguration(msg)) => {
                assert!(msg.contains("Number of workers cannot be zero"))
            }
            other => panic!("Expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_population_smaller_than_workers() {
        let options = FarmOptions::new(3, 4, 5, 0.5, 0.5);
        assert!(matches!(
            options.validate(),
            Err(FarmError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_probabilities_outside_unit_interval() {
        for (crossover, mutation) in [(1.5, 0.1), (0.5, -0.1), (f64::NAN, 0.1)] {
            let options = FarmOptions::new(10, 2, 5, crossover, mutation);
            assert!(
                matches!(options.validate(), Err(FarmError::InvalidConfiguration(_))),
                "accepted crossover={} mutation={}",
                crossover,
                mutation
            );
        }

        assert!(FarmOptions::new(10, 2, 5, 0.0, 1.0).validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let options = FarmOptions::builder()
            .population_size(12)
            .seed(99)
            .log_level(LogLevel::Verbose)
            .build();
        let json = serde_json::to_string(&options).unwrap();
        let back: FarmOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
