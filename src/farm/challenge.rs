use crate::error::{FarmError, Result};
use crate::tour::{City, Cost};

/// The fitness function of a run: maps a tour to its cost, lower being better.
///
/// Workers call it concurrently from several threads, so implementations must
/// be pure and `Send + Sync`. Any `Fn(&[City]) -> Cost` closure qualifies.
///
/// ```rust
/// use tsp_farm::farm::Challenge;
///
/// let hops = |tour: &[usize]| {
///     tour.windows(2)
///         .map(|w| (w[0] as f64 - w[1] as f64).abs())
///         .sum::<f64>()
/// };
/// assert_eq!(hops.score(&[0, 2, 1]), 3.0);
/// ```
pub trait Challenge: Send + Sync {
    fn score(&self, tour: &[City]) -> Cost;

    /// Fallible variant used by workers. Deployments whose fitness function
    /// can fail override this; the error aborts the run.
    fn try_score(&self, tour: &[City]) -> std::result::Result<Cost, String> {
        Ok(self.score(tour))
    }
}

impl<F> Challenge for F
where
    F: Fn(&[City]) -> Cost + Send + Sync,
{
    fn score(&self, tour: &[City]) -> Cost {
        self(tour)
    }
}

/// Scores `tour`, turning a failed or non-finite score into `FarmError::FitnessEvaluation`.
pub fn checked_score<C>(challenge: &C, tour: &[City]) -> Result<Cost>
where
    C: Challenge + ?Sized,
{
    let cost = challenge
        .try_score(tour)
        .map_err(|reason| FarmError::FitnessEvaluation {
            tour: tour.to_vec(),
            reason,
        })?;
    if !cost.is_finite() {
        return Err(FarmError::FitnessEvaluation {
            tour: tour.to_vec(),
            reason: format!("non-finite cost {}", cost),
        });
    }
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_challenge() {
        let first = |tour: &[City]| tour[0] as Cost;
        assert_eq!(first.score(&[3, 1, 2, 0]), 3.0);
        assert_eq!(first.try_score(&[1, 0]), Ok(1.0));
    }

    #[test]
    fn test_checked_score_rejects_infinity() {
        let infinite = |_: &[City]| f64::INFINITY;
        match checked_score(&infinite, &[0, 1]) {
            Err(FarmError::FitnessEvaluation { tour, reason }) => {
                assert_eq!(tour, vec![0, 1]);
                assert!(reason.contains("inf"));
            }
            other => panic!("Expected FitnessEvaluation, got {:?}", other),
        }
    }
}
