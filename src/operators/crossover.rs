use std::collections::VecDeque;

use crate::tour::City;

/// Swaps the genes `[left, right]` between two tours of equal length.
///
/// The result is generally not a pair of permutations; follow it with
/// [`repair_pair`].
pub fn exchange_segment(a: &mut [City], b: &mut [City], left: usize, right: usize) {
    debug_assert_eq!(a.len(), b.len());
    debug_assert!(left <= right && right < a.len());
    a[left..=right].swap_with_slice(&mut b[left..=right]);
}

/// Restores two offspring to permutations after a segment exchange.
///
/// Every city is counted in both offspring. Cities missing from `a` are queued
/// at the front of a shared deque and cities missing from `b` at the back.
/// Scanning positions in order, the first occurrence of a duplicated city in
/// `a` takes a value from the front and in `b` from the back, so the two
/// offspring never draw each other's missing cities.
///
/// Both inputs must be the result of exchanging a segment between two
/// permutations of the same cities; every city then occurs at most twice.
pub fn repair_pair(a: &mut [City], b: &mut [City]) {
    let len = a.len();
    let mut count_a = vec![0u32; len];
    let mut count_b = vec![0u32; len];
    for j in 0..len {
        count_a[a[j]] += 1;
        count_b[b[j]] += 1;
    }

    let mut missing = VecDeque::new();
    for city in 0..len {
        if count_a[city] == 0 {
            missing.push_front(city);
        }
        if count_b[city] == 0 {
            missing.push_back(city);
        }
    }
    if missing.is_empty() {
        return;
    }

    for j in 0..len {
        if count_a[a[j]] == 2 {
            if let Some(city) = missing.pop_front() {
                count_a[a[j]] -= 1;
                count_a[city] += 1;
                a[j] = city;
            }
        }
        if count_b[b[j]] == 2 {
            if let Some(city) = missing.pop_back() {
                count_b[b[j]] -= 1;
                count_b[city] += 1;
                b[j] = city;
            }
        }
    }
}

/// Exchanges `[left, right]` between two parent tours and repairs both offspring.
pub fn crossover_pair(a: &mut [City], b: &mut [City], left: usize, right: usize) {
    exchange_segment(a, b, left, right);
    repair_pair(a, b);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tour::is_permutation;

    fn counts(tour: &[City]) -> Vec<usize> {
        let mut counts = vec![0; tour.len()];
        for &city in tour {
            counts[city] += 1;
        }
        counts
    }

    #[test]
    fn test_exchange_segment() {
        let mut a = vec![0, 1, 2, 3, 4, 5];
        let mut b = vec![5, 4, 3, 2, 1, 0];
        exchange_segment(&mut a, &mut b, 2, 3);
        assert_eq!(a, vec![0, 1, 3, 2, 4, 5]);
        assert_eq!(b, vec![5, 4, 2, 3, 1, 0]);
    }

    #[test]
    fn test_repair_duplicate_zero_missing_three() {
        let mut a = vec![2, 0, 3, 1];
        let mut b = vec![3, 2, 0, 1];
        assert_eq!(counts(&a), vec![1, 1, 1, 1]);

        exchange_segment(&mut a, &mut b, 2, 3);
        assert_eq!(a, vec![2, 0, 0, 1]);
        assert_eq!(counts(&a), vec![2, 1, 1, 0]);

        repair_pair(&mut a, &mut b);
        assert_eq!(counts(&a), vec![1, 1, 1, 1]);
        assert_eq!(counts(&b), vec![1, 1, 1, 1]);
        assert_eq!(a, vec![2, 3, 0, 1]);
        assert_eq!(b, vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_repair_is_noop_on_permutations() {
        let mut a = vec![0, 1, 2, 3, 4];
        let mut b = vec![4, 3, 2, 1, 0];
        repair_pair(&mut a, &mut b);
        assert_eq!(a, vec![0, 1, 2, 3, 4]);
        assert_eq!(b, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_crossover_pair_yields_permutations() {
        let parents = [
            vec![0, 1, 2, 3, 4, 5, 6, 7],
            vec![7, 5, 3, 1, 6, 4, 2, 0],
            vec![3, 7, 0, 4, 1, 6, 5, 2],
        ];
        for p in &parents {
            for q in &parents {
                for left in 1..6 {
                    for right in left + 1..7 {
                        let (mut a, mut b) = (p.clone(), q.clone());
                        crossover_pair(&mut a, &mut b, left, right);
                        assert!(is_permutation(&a), "{:?} from {:?} x {:?}", a, p, q);
                        assert!(is_permutation(&b), "{:?} from {:?} x {:?}", b, p, q);
                    }
                }
            }
        }
    }

    #[test]
    fn test_identical_parents_are_untouched() {
        let mut a = vec![1, 3, 0, 2, 4];
        let mut b = a.clone();
        crossover_pair(&mut a, &mut b, 1, 3);
        assert_eq!(a, vec![1, 3, 0, 2, 4]);
        assert_eq!(b, vec![1, 3, 0, 2, 4]);
    }
}
