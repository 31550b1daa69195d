//! # Worker
//!
//! A worker turns one chunk of the population into a `ChunkOutcome`: it
//! applies crossover, mutation and evaluation to the chunk's slots and
//! reports the best and worst slot it saw. It holds no state between chunks
//! apart from the random generator its thread owns.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use tracing::trace;

use crate::error::{FarmError, OptionExt, Result};
use crate::farm::challenge::{checked_score, Challenge};
use crate::operators::{crossover_pair, swap_mutation};
use crate::rng::RandomNumberGenerator;
use crate::tour::{Cost, Tour};

/// Handles every chunk of a run carries along: the fitness function, the
/// operator probabilities and the slot currently holding the elite tour.
pub struct ChunkContext<C: ?Sized> {
    pub challenge: Arc<C>,
    pub crossover_prob: f64,
    pub mutation_prob: f64,
    pub elite_slot: Option<usize>,
}

impl<C: ?Sized> Clone for ChunkContext<C> {
    fn clone(&self) -> Self {
        Self {
            challenge: Arc::clone(&self.challenge),
            crossover_prob: self.crossover_prob,
            mutation_prob: self.mutation_prob,
            elite_slot: self.elite_slot,
        }
    }
}

impl<C: ?Sized> fmt::Debug for ChunkContext<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkContext")
            .field("crossover_prob", &self.crossover_prob)
            .field("mutation_prob", &self.mutation_prob)
            .field("elite_slot", &self.elite_slot)
            .finish_non_exhaustive()
    }
}

/// A task: the slots `start..start + tours.len()` of one generation.
///
/// The chunk owns its tours and costs while it is in flight; nobody else can
/// touch those slots until the outcome is handed back to the coordinator.
pub struct Chunk<C: ?Sized> {
    pub epoch: usize,
    pub start: usize,
    pub tours: Vec<Tour>,
    pub costs: Vec<Cost>,
    pub context: ChunkContext<C>,
}

impl<C: ?Sized> Chunk<C> {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.tours.len()
    }
}

impl<C: ?Sized> fmt::Debug for Chunk<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("epoch", &self.epoch)
            .field("range", &self.range())
            .field("context", &self.context)
            .finish()
    }
}

/// Population indices of the lowest and highest cost found in a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerResult {
    pub best: usize,
    pub worst: usize,
}

/// What a worker sends back: the result indices plus the chunk's slots.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutcome {
    pub epoch: usize,
    pub start: usize,
    pub tours: Vec<Tour>,
    pub costs: Vec<Cost>,
    pub result: WorkerResult,
}

impl ChunkOutcome {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.tours.len()
    }
}

pub struct Worker;

impl Worker {
    /// Runs crossover, mutation and evaluation over the chunk.
    ///
    /// # Errors
    ///
    /// - `FarmError::FitnessEvaluation` if the fitness function fails or
    ///   returns a non-finite cost
    /// - `FarmError::ProtocolViolation` if the chunk holds no slots
    pub fn process<C>(chunk: Chunk<C>, rng: &mut RandomNumberGenerator) -> Result<ChunkOutcome>
    where
        C: Challenge + ?Sized,
    {
        let Chunk {
            epoch,
            start,
            mut tours,
            mut costs,
            context,
        } = chunk;

        Self::crossover(&mut tours, context.crossover_prob, rng);

        let elite = context
            .elite_slot
            .and_then(|slot| slot.checked_sub(start))
            .filter(|&local| local < tours.len());
        Self::mutate(&mut tours, elite, context.mutation_prob, rng);

        let result = Self::evaluate(start, &tours, &mut costs, context.challenge.as_ref())?;
        trace!(
            epoch,
            start,
            len = tours.len(),
            best = result.best,
            worst = result.worst,
            "Chunk processed"
        );

        Ok(ChunkOutcome {
            epoch,
            start,
            tours,
            costs,
            result,
        })
    }

    /// Crosses disjoint adjacent pairs; an odd trailing tour is left alone.
    fn crossover(tours: &mut [Tour], p: f64, rng: &mut RandomNumberGenerator) {
        for pair in tours.chunks_exact_mut(2) {
            if !rng.coin(p) {
                continue;
            }
            let (first, second) = pair.split_at_mut(1);
            let (a, b) = (&mut first[0], &mut second[0]);
            if let Some((left, right)) = rng.cut_points(a.len()) {
                crossover_pair(a, b, left, right);
            }
        }
    }

    fn mutate(tours: &mut [Tour], elite: Option<usize>, p: f64, rng: &mut RandomNumberGenerator) {
        for (local, tour) in tours.iter_mut().enumerate() {
            if Some(local) != elite && rng.coin(p) {
                swap_mutation(tour, rng);
            }
        }
    }

    fn evaluate<C>(
        start: usize,
        tours: &[Tour],
        costs: &mut [Cost],
        challenge: &C,
    ) -> Result<WorkerResult>
    where
        C: Challenge + ?Sized,
    {
        let mut best: Option<(usize, Cost)> = None;
        let mut worst: Option<(usize, Cost)> = None;

        for (offset, (tour, slot_cost)) in tours.iter().zip(costs.iter_mut()).enumerate() {
            let cost = checked_score(challenge, tour)?;
            *slot_cost = cost;

            let slot = start + offset;
            if best.map_or(true, |(_, c)| cost < c) {
                best = Some((slot, cost));
            }
            if worst.map_or(true, |(_, c)| cost > c) {
                worst = Some((slot, cost));
            }
        }

        best.zip(worst)
            .map(|((best, _), (worst, _))| WorkerResult { best, worst })
            .ok_or_else_farm(|| {
                FarmError::ProtocolViolation(format!("chunk at slot {} holds no tours", start))
            })
    }
}
