use std::ops::Range;

use crate::error::{FarmError, Result};

/// Splits `0..population_size` into `num_workers` contiguous half-open ranges.
///
/// The first `population_size % num_workers` ranges hold one extra slot, so
/// every slot lands in exactly one range. Ranges are empty only when
/// `population_size < num_workers`, which configuration validation rejects.
pub fn partition(population_size: usize, num_workers: usize) -> Vec<Range<usize>> {
    if num_workers == 0 {
        return Vec::new();
    }
    let base = population_size / num_workers;
    let extra = population_size % num_workers;

    let mut ranges = Vec::with_capacity(num_workers);
    let mut start = 0;
    for worker in 0..num_workers {
        let len = base + usize::from(worker < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Checks that `ranges` tile `0..population_size` in order, without gaps or overlap.
pub fn verify_coverage(ranges: &[Range<usize>], population_size: usize) -> Result<()> {
    let mut next = 0;
    for range in ranges {
        if range.start != next {
            return Err(FarmError::IncompletePartition(format!(
                "chunk {:?} starts at {} but slot {} is next",
                range, range.start, next
            )));
        }
        if range.end < range.start {
            return Err(FarmError::IncompletePartition(format!(
                "chunk {:?} is inverted",
                range
            )));
        }
        next = range.end;
    }
    if next != population_size {
        return Err(FarmError::IncompletePartition(format!(
            "chunks cover 0..{} of a population of {}",
            next, population_size
        )));
    }
    Ok(())
}
