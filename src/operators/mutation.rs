use crate::rng::RandomNumberGenerator;
use crate::tour::City;

/// Swaps two uniformly chosen positions of `tour`.
///
/// Both positions are drawn independently, so they may coincide and leave the
/// tour unchanged. The tour stays a permutation either way.
pub fn swap_mutation(tour: &mut [City], rng: &mut RandomNumberGenerator) {
    if tour.is_empty() {
        return;
    }
    let i = rng.position(tour.len());
    let j = rng.position(tour.len());
    tour.swap(i, j);
}
