//! # Tours
//!
//! A tour (chromosome) is a permutation of city indices `0..N`. Every slot of
//! the population must hold one at each generation boundary; the helpers here
//! check that.

use crate::error::{FarmError, Result};

/// Index of a city in the problem instance.
pub type City = usize;

/// An ordered visit of every city exactly once.
pub type Tour = Vec<City>;

/// Cost of a tour. Lower is better.
pub type Cost = f64;

/// Returns `true` if `tour` holds every city of `0..tour.len()` exactly once.
pub fn is_permutation(tour: &[City]) -> bool {
    let mut seen = vec![false; tour.len()];
    for &city in tour {
        match seen.get_mut(city) {
            Some(flag) if !*flag => *flag = true,
            _ => return false,
        }
    }
    true
}

/// Checks that `tour` is a permutation, reporting `slot` in the error if not.
pub fn validate_tour(slot: usize, tour: &[City]) -> Result<()> {
    let mut seen = vec![false; tour.len()];
    for &city in tour {
        if city >= tour.len() {
            return Err(FarmError::CorruptPopulation {
                slot,
                reason: format!("city {} is out of range for {} cities", city, tour.len()),
            });
        }
        if seen[city] {
            return Err(FarmError::CorruptPopulation {
                slot,
                reason: format!("city {} appears more than once", city),
            });
        }
        seen[city] = true;
    }
    Ok(())
}

/// Checks every tour of `tours`, and that they all visit the same number of cities.
pub fn validate_tours(tours: &[Tour]) -> Result<()> {
    let Some(first) = tours.first() else {
        return Ok(());
    };
    for (slot, tour) in tours.iter().enumerate() {
        if tour.len() != first.len() {
            return Err(FarmError::CorruptPopulation {
                slot,
                reason: format!(
                    "tour visits {} cities, expected {}",
                    tour.len(),
                    first.len()
                ),
            });
        }
        validate_tour(slot, tour)?;
    }
    Ok(())
}
