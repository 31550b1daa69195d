//! # Coordinator
//!
//! The master side of the farm. It splits the population into one chunk per
//! worker, waits until every chunk of the generation has come back (the
//! barrier), runs elitist selection and decides whether to start another
//! generation or stop.
//!
//! The coordinator does no I/O of its own. It reacts to [`Event`]s and
//! answers with a [`Step`] telling the driver what to do next, so the
//! generation protocol can be exercised without any threads.
//!
//! ```text
//! Idle ──RequestWork──▶ Dispatching ──▶ AwaitingBarrier
//!                          ▲                 │ all chunks back
//!                          └── epoch < max ── Selecting ── epoch == max ──▶ Terminated
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::challenge::Challenge;
use super::launcher::RunResult;
use super::options::{FarmOptions, LogLevel};
use super::partition::{partition, verify_coverage};
use crate::error::{FarmError, OptionExt, Result};
use crate::state::{GlobalOptimum, Population};
use crate::tour::{validate_tours, Cost, Tour};
use crate::worker::{Chunk, ChunkContext, ChunkOutcome, WorkerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dispatching,
    AwaitingBarrier,
    Selecting,
    Terminated,
}

/// Input to the coordinator.
#[derive(Debug)]
pub enum Event {
    /// The driver has nothing to deliver and asks for work.
    RequestWork,
    /// A worker finished a chunk.
    Result(ChunkOutcome),
}

/// What the driver must do after an event.
pub enum Step<C: ?Sized> {
    /// Send these chunks to the workers.
    Dispatch(Vec<Chunk<C>>),
    /// Chunks are still in flight; deliver the next result.
    Wait,
    /// The run is over; no further dispatch.
    Terminate,
}

impl<C: ?Sized> fmt::Debug for Step<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Dispatch(chunks) => f.debug_tuple("Dispatch").field(chunks).finish(),
            Step::Wait => f.write_str("Wait"),
            Step::Terminate => f.write_str("Terminate"),
        }
    }
}

/// Checks run parameters and the initial tours before anything is spawned.
pub fn validate_run(options: &FarmOptions, tours: &[Tour]) -> Result<()> {
    options.validate()?;
    if tours.len() != options.get_population_size() {
        return Err(FarmError::InvalidConfiguration(format!(
            "Initial population holds {} tours, expected {}",
            tours.len(),
            options.get_population_size()
        )));
    }
    validate_tours(tours)
}

pub struct Coordinator<C: ?Sized> {
    num_workers: usize,
    max_epochs: usize,
    population_size: usize,
    log_level: LogLevel,

    epoch: usize,
    dispatched: usize,
    received: Vec<ChunkOutcome>,
    phase: Phase,

    population: Population,
    optimum: GlobalOptimum,
    context: ChunkContext<C>,
    last_selection: Option<WorkerResult>,
    history: Vec<Cost>,
}

impl<C> Coordinator<C>
where
    C: Challenge + ?Sized,
{
    /// Creates a coordinator over an already evaluated population.
    ///
    /// The global optimum starts as the best initial tour, which is also the
    /// first elite slot.
    ///
    /// # Errors
    ///
    /// - `FarmError::InvalidConfiguration` for bad options or a population of the wrong size
    /// - `FarmError::CorruptPopulation` if an initial tour is not a permutation
    pub fn new(options: &FarmOptions, population: Population, challenge: Arc<C>) -> Result<Self> {
        validate_run(options, population.tours())?;

        let best = population.best_slot().ok_or_else_farm(|| {
            FarmError::InvalidConfiguration("Population cannot be empty".to_string())
        })?;
        let optimum = GlobalOptimum::new(population.cost(best), population.tour(best).clone());

        Ok(Self {
            num_workers: options.get_num_workers(),
            max_epochs: options.get_max_epochs(),
            population_size: options.get_population_size(),
            log_level: options.get_log_level(),
            epoch: 0,
            dispatched: 0,
            received: Vec::with_capacity(options.get_num_workers()),
            phase: Phase::Idle,
            population,
            optimum,
            context: ChunkContext {
                challenge,
                crossover_prob: options.get_crossover_prob(),
                mutation_prob: options.get_mutation_prob(),
                elite_slot: Some(best),
            },
            last_selection: None,
            history: Vec::with_capacity(options.get_max_epochs()),
        })
    }

    pub fn on_event(&mut self, event: Event) -> Result<Step<C>> {
        match event {
            Event::RequestWork => match self.phase {
                Phase::Idle if self.epoch >= self.max_epochs => {
                    self.phase = Phase::Terminated;
                    Ok(Step::Terminate)
                }
                Phase::Idle => Ok(Step::Dispatch(self.start_generation()?)),
                Phase::Terminated => Ok(Step::Terminate),
                _ => Ok(Step::Wait),
            },
            Event::Result(outcome) => self.on_worker_result(outcome),
        }
    }

    /// Partitions the population and moves every chunk's slots out for dispatch.
    ///
    /// # Errors
    ///
    /// - `FarmError::CorruptPopulation` if a tour entering the generation is not a permutation
    /// - `FarmError::IncompletePartition` if the chunks would not cover every slot once
    pub fn start_generation(&mut self) -> Result<Vec<Chunk<C>>> {
        if !matches!(self.phase, Phase::Idle | Phase::Selecting) {
            return Err(FarmError::ProtocolViolation(format!(
                "cannot start a generation while {:?}",
                self.phase
            )));
        }
        validate_tours(self.population.tours())?;

        let ranges = partition(self.population_size, self.num_workers);
        verify_coverage(&ranges, self.population.len())?;

        self.phase = Phase::Dispatching;
        let chunks: Vec<Chunk<C>> = ranges
            .iter()
            .zip(self.population.split(&ranges))
            .map(|(range, (tours, costs))| Chunk {
                epoch: self.epoch,
                start: range.start,
                tours,
                costs,
                context: self.context.clone(),
            })
            .collect();

        self.dispatched = chunks.len();
        self.received.clear();
        self.phase = Phase::AwaitingBarrier;

        if self.log_level == LogLevel::Verbose {
            debug!(
                epoch = self.epoch,
                chunks = self.dispatched,
                elite_slot = ?self.context.elite_slot,
                "Generation dispatched"
            );
        }
        Ok(chunks)
    }

    /// Accumulates a worker outcome; selection runs once the barrier is met.
    ///
    /// # Errors
    ///
    /// `FarmError::ProtocolViolation` if no generation is in flight, the outcome
    /// belongs to another epoch, its chunk was already received, or its
    /// indices fall outside its own slots.
    pub fn on_worker_result(&mut self, outcome: ChunkOutcome) -> Result<Step<C>> {
        if self.phase != Phase::AwaitingBarrier {
            return Err(FarmError::ProtocolViolation(format!(
                "outcome for slot {} arrived while {:?}",
                outcome.start, self.phase
            )));
        }
        if outcome.epoch != self.epoch {
            return Err(FarmError::ProtocolViolation(format!(
                "outcome from epoch {} arrived during epoch {}",
                outcome.epoch, self.epoch
            )));
        }
        if self.received.iter().any(|r| r.start == outcome.start) {
            return Err(FarmError::ProtocolViolation(format!(
                "chunk at slot {} reported twice in epoch {}",
                outcome.start, self.epoch
            )));
        }
        let range = outcome.range();
        if outcome.costs.len() != outcome.tours.len()
            || !range.contains(&outcome.result.best)
            || !range.contains(&outcome.result.worst)
        {
            return Err(FarmError::ProtocolViolation(format!(
                "outcome {:?} does not match its chunk {:?}",
                outcome.result, range
            )));
        }

        self.received.push(outcome);
        if self.received.len() < self.dispatched {
            return Ok(Step::Wait);
        }

        self.phase = Phase::Selecting;
        let results = self.reassemble()?;
        let previous = self.optimum.cost;
        let selection = self.run_selection(&results)?;

        self.epoch += 1;
        self.history.push(self.optimum.cost);
        self.log_generation(selection, self.optimum.cost < previous);

        if self.epoch == self.max_epochs {
            self.phase = Phase::Terminated;
            return Ok(Step::Terminate);
        }
        Ok(Step::Dispatch(self.start_generation()?))
    }

    /// Finds the generation's best and worst slots, updates the global optimum
    /// and copies it over the worst slot.
    ///
    /// Every result's best and worst candidates are compared independently.
    pub fn run_selection(&mut self, results: &[WorkerResult]) -> Result<WorkerResult> {
        let first = results.first().ok_or_else_farm(|| {
            FarmError::ProtocolViolation("selection ran without worker results".to_string())
        })?;

        let (mut best, mut worst) = (first.best, first.worst);
        for result in results {
            if self.population.cost(result.best) < self.population.cost(best) {
                best = result.best;
            }
            if self.population.cost(result.worst) > self.population.cost(worst) {
                worst = result.worst;
            }
        }

        self.optimum
            .offer(self.population.cost(best), self.population.tour(best));
        self.population.install(worst, &self.optimum);
        self.context.elite_slot = Some(worst);

        let selection = WorkerResult { best, worst };
        self.last_selection = Some(selection);
        Ok(selection)
    }

    /// Puts the returned chunks back into the population in slot order.
    fn reassemble(&mut self) -> Result<Vec<WorkerResult>> {
        let mut outcomes = std::mem::take(&mut self.received);
        outcomes.sort_unstable_by_key(|outcome| outcome.start);

        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if outcome.start != self.population.len() {
                return Err(FarmError::ProtocolViolation(format!(
                    "chunk at slot {} does not continue the population at slot {}",
                    outcome.start,
                    self.population.len()
                )));
            }
            results.push(outcome.result);
            self.population.absorb(outcome.tours, outcome.costs);
        }

        if self.population.len() != self.population_size {
            return Err(FarmError::ProtocolViolation(format!(
                "returned chunks rebuild {} of {} slots",
                self.population.len(),
                self.population_size
            )));
        }
        Ok(results)
    }

    fn log_generation(&self, selection: WorkerResult, improved: bool) {
        match self.log_level {
            LogLevel::Minimal | LogLevel::Verbose => info!(
                epoch = self.epoch,
                best_cost = self.optimum.cost,
                improved,
                "Generation complete"
            ),
            LogLevel::None => {}
        }
        if self.log_level == LogLevel::Verbose {
            debug!(
                epoch = self.epoch,
                generation_best = selection.best,
                generation_worst = selection.worst,
                "Elite installed"
            );
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Number of dispatched chunks of the current generation not yet returned.
    pub fn in_flight(&self) -> usize {
        if self.phase == Phase::AwaitingBarrier {
            self.dispatched - self.received.len()
        } else {
            0
        }
    }

    pub fn optimum(&self) -> &GlobalOptimum {
        &self.optimum
    }

    /// The population. Empty while a generation is in flight.
    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn elite_slot(&self) -> Option<usize> {
        self.context.elite_slot
    }

    /// Best and worst slots chosen by the latest selection.
    pub fn last_selection(&self) -> Option<WorkerResult> {
        self.last_selection
    }

    pub fn history(&self) -> &[Cost] {
        &self.history
    }

    pub fn finish(self) -> RunResult {
        RunResult {
            best: self.optimum,
            epochs: self.epoch,
            history: self.history,
            population: self.population,
        }
    }
}
