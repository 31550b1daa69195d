use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use super::challenge::{checked_score, Challenge};
use super::coordinator::{validate_run, Coordinator, Event, Step};
use super::options::FarmOptions;
use crate::error::{FarmError, Result};
use crate::pool::{Feedback, WorkerPool};
use crate::state::{GlobalOptimum, Population};
use crate::tour::{Cost, Tour};

/// The outcome of a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Best tour found and its cost.
    pub best: GlobalOptimum,
    /// Number of generations performed.
    pub epochs: usize,
    /// Global optimum cost after each generation.
    pub history: Vec<Cost>,
    /// The population as it stood after the last selection.
    pub population: Population,
}

/// Runs the master/worker farm: one coordinator on the calling thread and a
/// pool of `num_workers` worker threads.
///
/// # Example
///
/// ```rust
/// use tsp_farm::farm::{Farm, FarmOptions};
///
/// // Cost of visiting cities placed on a line, returning to the start.
/// let line = |tour: &[usize]| {
///     let mut cost = 0.0;
///     for i in 0..tour.len() {
///         let next = tour[(i + 1) % tour.len()];
///         cost += (tour[i] as f64 - next as f64).abs();
///     }
///     cost
/// };
///
/// let options = FarmOptions::builder()
///     .population_size(8)
///     .num_workers(2)
///     .max_epochs(10)
///     .seed(3)
///     .build();
/// let initial: Vec<Vec<usize>> = (0..8)
///     .map(|k| (0..6).map(|c| (c * 5 + k) % 6).collect())
///     .collect();
///
/// let result = Farm::with_challenge(options, line).run(initial).unwrap();
/// assert_eq!(result.epochs, 10);
/// assert!(result.best.cost >= 10.0);
/// ```
pub struct Farm<C: ?Sized> {
    options: FarmOptions,
    challenge: Arc<C>,
}

impl<C> Farm<C>
where
    C: Challenge + 'static,
{
    pub fn with_challenge(options: FarmOptions, challenge: C) -> Self {
        Self::new(options, Arc::new(challenge))
    }
}

impl<C> Farm<C>
where
    C: Challenge + ?Sized + 'static,
{
    pub fn new(options: FarmOptions, challenge: Arc<C>) -> Self {
        Self { options, challenge }
    }

    pub fn options(&self) -> &FarmOptions {
        &self.options
    }

    /// Evolves `initial` for `max_epochs` generations and returns the best tour found.
    ///
    /// The initial population is evaluated on the pool first; its best tour
    /// seeds the global optimum, so a run with zero epochs returns it.
    ///
    /// # Errors
    ///
    /// This method will return an error if:
    /// - the options are invalid or `initial` has the wrong size (`InvalidConfiguration`)
    /// - a tour is not a permutation, initially or at a generation start (`CorruptPopulation`)
    /// - the fitness function fails (`FitnessEvaluation`)
    /// - a worker panics (`WorkerLost`)
    /// - the feedback channel misbehaves (`ProtocolViolation`)
    pub fn run(&self, initial: Vec<Tour>) -> Result<RunResult> {
        validate_run(&self.options, &initial)?;

        let mut pool = WorkerPool::new(self.options.get_num_workers(), self.options.get_seed())?;
        let costs = pool.install(|| evaluate_all(&initial, self.challenge.as_ref()))?;
        let population = Population::new(initial, costs)?;
        let mut coordinator =
            Coordinator::new(&self.options, population, Arc::clone(&self.challenge))?;

        info!(
            population_size = self.options.get_population_size(),
            num_workers = pool.num_workers(),
            max_epochs = self.options.get_max_epochs(),
            initial_cost = coordinator.optimum().cost,
            "Farm started"
        );

        loop {
            let event = match pool.poll() {
                Feedback::Report(report) => Event::Result(report?),
                Feedback::Empty if coordinator.in_flight() == 0 => Event::RequestWork,
                Feedback::Empty => Event::Result(pool.recv()??),
                Feedback::Closed => {
                    return Err(FarmError::ProtocolViolation(
                        "feedback channel closed mid-run".to_string(),
                    ))
                }
            };

            match coordinator.on_event(event)? {
                Step::Dispatch(chunks) => {
                    for chunk in chunks {
                        pool.submit(chunk)?;
                    }
                }
                Step::Wait => {}
                Step::Terminate => break,
            }
        }
        pool.shutdown();

        let result = coordinator.finish();
        info!(
            epochs = result.epochs,
            best_cost = result.best.cost,
            "Farm finished"
        );
        Ok(result)
    }
}

fn evaluate_all<C>(tours: &[Tour], challenge: &C) -> Result<Vec<Cost>>
where
    C: Challenge + ?Sized,
{
    tours
        .par_iter()
        .map(|tour| checked_score(challenge, tour))
        .collect()
}
