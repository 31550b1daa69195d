//! # Shared Problem State
//!
//! The population and its fitness table, plus the best tour seen so far.
//! Both live for the whole run and are only ever mutated by the coordinator,
//! or by a worker holding a chunk's slots, never by two parties at once.

use std::ops::Range;

use crate::error::{FarmError, Result};
use crate::tour::{Cost, Tour};

/// Best individual seen across all generations.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalOptimum {
    pub cost: Cost,
    pub tour: Tour,
}

impl GlobalOptimum {
    pub fn new(cost: Cost, tour: Tour) -> Self {
        Self { cost, tour }
    }

    /// Replaces the optimum if `cost` is strictly lower. Returns whether it did.
    pub fn offer(&mut self, cost: Cost, tour: &[usize]) -> bool {
        if cost < self.cost {
            self.cost = cost;
            self.tour = tour.to_vec();
            true
        } else {
            false
        }
    }
}

/// Tours and their costs, indexed by slot.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    tours: Vec<Tour>,
    costs: Vec<Cost>,
}

impl Population {
    /// Builds a population from tours and their costs, which must have equal length.
    pub fn new(tours: Vec<Tour>, costs: Vec<Cost>) -> Result<Self> {
        if tours.len() != costs.len() {
            return Err(FarmError::InvalidConfiguration(format!(
                "{} tours but {} fitness values",
                tours.len(),
                costs.len()
            )));
        }
        Ok(Self { tours, costs })
    }

    pub fn len(&self) -> usize {
        self.tours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }

    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    pub fn costs(&self) -> &[Cost] {
        &self.costs
    }

    pub fn tour(&self, slot: usize) -> &Tour {
        &self.tours[slot]
    }

    pub fn cost(&self, slot: usize) -> Cost {
        self.costs[slot]
    }

    /// Slot with the lowest cost; the first one wins ties.
    pub fn best_slot(&self) -> Option<usize> {
        self.costs
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, Cost)>, (slot, &cost)| match best {
                Some((_, best_cost)) if best_cost <= cost => best,
                _ => Some((slot, cost)),
            })
            .map(|(slot, _)| slot)
    }

    /// Overwrites `slot` with a copy of `optimum`.
    pub fn install(&mut self, slot: usize, optimum: &GlobalOptimum) {
        self.tours[slot].clone_from(&optimum.tour);
        self.costs[slot] = optimum.cost;
    }

    /// Moves the given ranges out of the population, leaving it empty.
    ///
    /// `ranges` must be contiguous, ascending and cover every slot; see
    /// `farm::partition::verify_coverage`.
    pub fn split(&mut self, ranges: &[Range<usize>]) -> Vec<(Vec<Tour>, Vec<Cost>)> {
        let mut segments = Vec::with_capacity(ranges.len());
        for range in ranges.iter().rev() {
            let tours = self.tours.split_off(range.start);
            let costs = self.costs.split_off(range.start);
            segments.push((tours, costs));
        }
        segments.reverse();
        segments
    }

    /// Appends a returned segment. Segments must come back in slot order.
    pub fn absorb(&mut self, tours: Vec<Tour>, costs: Vec<Cost>) {
        self.tours.extend(tours);
        self.costs.extend(costs);
    }

    pub fn into_parts(self) -> (Vec<Tour>, Vec<Cost>) {
        (self.tours, self.costs)
    }
}
