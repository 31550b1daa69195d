use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tsp_farm::{
    error::FarmError,
    farm::{Challenge, Farm, FarmOptions, LogLevel},
    tour::{is_permutation, City, Cost, Tour},
};

/// Closed-tour length over cities placed on a circle.
#[derive(Clone)]
struct CircleTour {
    points: Vec<(f64, f64)>,
    evaluations: Arc<AtomicUsize>,
}

impl CircleTour {
    fn new(n: usize) -> Self {
        let points = (0..n)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / n as f64;
                (angle.cos() * 100.0, angle.sin() * 100.0)
            })
            .collect();
        Self {
            points,
            evaluations: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn get_evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

impl Challenge for CircleTour {
    fn score(&self, tour: &[City]) -> Cost {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        (0..tour.len())
            .map(|i| {
                let (x1, y1) = self.points[tour[i]];
                let (x2, y2) = self.points[tour[(i + 1) % tour.len()]];
                ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
            })
            .sum()
    }
}

fn scrambled(n: usize, count: usize, stride: usize) -> Vec<Tour> {
    (0..count)
        .map(|k| (0..n).map(|c| (c * stride + k) % n).collect())
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[test]
fn test_disabled_operators_single_generation() {
    let tours: Vec<Tour> = vec![
        vec![0, 1, 2, 3, 4, 5],
        vec![5, 4, 3, 2, 1, 0],
        vec![0, 2, 4, 1, 3, 5],
        vec![1, 0, 3, 2, 5, 4],
        vec![3, 0, 4, 1, 5, 2],
        vec![2, 1, 0, 3, 4, 5],
    ];
    let challenge = CircleTour::new(6);
    let expected: Vec<Cost> = tours.iter().map(|t| challenge.score(t)).collect();
    let min = expected.iter().cloned().fold(f64::INFINITY, f64::min);

    let options = FarmOptions::new(6, 2, 1, 0.0, 0.0);
    let result = Farm::with_challenge(options, challenge.clone())
        .run(tours.clone())
        .unwrap();

    assert_eq!(result.epochs, 1);
    assert!((result.best.cost - min).abs() < 1e-9);

    // Tours are untouched except the generation worst, which now holds the optimum.
    let (final_tours, final_costs) = result.population.into_parts();
    let worst = expected
        .iter()
        .enumerate()
        .fold(0, |w, (i, &c)| if c > expected[w] { i } else { w });
    for slot in 0..6 {
        if slot == worst {
            assert_eq!(final_tours[slot], result.best.tour);
            assert!((final_costs[slot] - result.best.cost).abs() < 1e-9);
        } else {
            assert_eq!(final_tours[slot], tours[slot]);
            assert!((final_costs[slot] - expected[slot]).abs() < 1e-9);
        }
    }
}

#[test]
fn test_zero_epochs_returns_initial_optimum() {
    let tours = scrambled(7, 5, 3);
    let challenge = CircleTour::new(7);
    let best_initial = tours
        .iter()
        .map(|t| challenge.score(t))
        .fold(f64::INFINITY, f64::min);

    let options = FarmOptions::new(5, 2, 0, 0.9, 0.9);
    let result = Farm::with_challenge(options, challenge).run(tours.clone()).unwrap();

    assert_eq!(result.epochs, 0);
    assert!(result.history.is_empty());
    assert_eq!(result.best.cost, best_initial);
    assert_eq!(result.population.tours(), &tours[..]);
}

#[test]
fn test_runs_exactly_max_epochs() {
    init_tracing();
    let challenge = CircleTour::new(10);
    let options = FarmOptions::builder()
        .population_size(11)
        .num_workers(3)
        .max_epochs(7)
        .crossover_prob(0.7)
        .mutation_prob(0.2)
        .seed(42)
        .log_level(LogLevel::Verbose)
        .build();

    let result = Farm::with_challenge(options, challenge.clone())
        .run(scrambled(10, 11, 3))
        .unwrap();

    assert_eq!(result.epochs, 7);
    assert_eq!(result.history.len(), 7);
    // Initial evaluation plus one evaluation per slot per generation.
    assert_eq!(challenge.get_evaluations(), 11 + 7 * 11);
}

#[test]
fn test_optimum_improves_monotonically_and_population_stays_valid() {
    let challenge = CircleTour::new(12);
    let options = FarmOptions::builder()
        .population_size(40)
        .num_workers(4)
        .max_epochs(60)
        .crossover_prob(0.9)
        .mutation_prob(0.3)
        .seed(7)
        .build();
    let initial = scrambled(12, 40, 5);
    let initial_best = initial
        .iter()
        .map(|t| challenge.score(t))
        .fold(f64::INFINITY, f64::min);

    let result = Farm::with_challenge(options, challenge.clone())
        .run(initial)
        .unwrap();

    assert!(result.history.windows(2).all(|w| w[1] <= w[0]));
    assert!(result.best.cost <= initial_best);
    assert!(is_permutation(&result.best.tour));
    assert!((challenge.score(&result.best.tour) - result.best.cost).abs() < 1e-9);

    let population = &result.population;
    assert_eq!(population.len(), 40);
    assert!(population.tours().iter().all(|t| is_permutation(t)));
    assert!(population.tours().contains(&result.best.tour));
    for (tour, &cost) in population.tours().iter().zip(population.costs()) {
        assert!((challenge.score(tour) - cost).abs() < 1e-9);
    }
}

#[test]
fn test_uneven_partition_runs_every_slot() {
    // 13 slots over 5 workers: chunks of 3, 3, 3, 2, 2.
    let challenge = CircleTour::new(8);
    let options = FarmOptions::new(13, 5, 4, 0.5, 0.5);
    let result = Farm::with_challenge(options, challenge.clone())
        .run(scrambled(8, 13, 3))
        .unwrap();

    assert_eq!(result.population.len(), 13);
    assert_eq!(challenge.get_evaluations(), 13 * 5);
}

#[test]
fn test_invalid_configuration_rejected_before_run() {
    let challenge = CircleTour::new(5);

    let cases = vec![
        FarmOptions::new(4, 0, 3, 0.5, 0.5),
        FarmOptions::new(2, 3, 3, 0.5, 0.5),
        FarmOptions::new(4, 2, 3, 1.2, 0.5),
        FarmOptions::new(4, 2, 3, 0.5, -0.01),
    ];
    for options in cases {
        let size = options.get_population_size();
        let result = Farm::with_challenge(options, challenge.clone()).run(scrambled(5, size, 2));
        assert!(matches!(result, Err(FarmError::InvalidConfiguration(_))));
    }

    // Population of the wrong size.
    let options = FarmOptions::new(4, 2, 3, 0.5, 0.5);
    let result = Farm::with_challenge(options, challenge.clone()).run(scrambled(5, 3, 2));
    assert!(matches!(result, Err(FarmError::InvalidConfiguration(_))));
    assert_eq!(challenge.get_evaluations(), 0);
}

#[test]
fn test_corrupt_initial_population_rejected() {
    let mut tours = scrambled(5, 4, 2);
    tours[2] = vec![0, 1, 1, 3, 4];
    let options = FarmOptions::new(4, 2, 3, 0.5, 0.5);

    let result = Farm::with_challenge(options, CircleTour::new(5)).run(tours);
    assert!(matches!(
        result,
        Err(FarmError::CorruptPopulation { slot: 2, .. })
    ));
}

struct FlakyDistance {
    calls: AtomicUsize,
    fail_after: usize,
}

impl Challenge for FlakyDistance {
    fn score(&self, tour: &[City]) -> Cost {
        tour[0] as f64
    }

    fn try_score(&self, tour: &[City]) -> Result<Cost, String> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
            return Err("distance service unavailable".to_string());
        }
        Ok(self.score(tour))
    }
}

#[test]
fn test_fitness_failure_aborts_run() {
    let challenge = FlakyDistance {
        calls: AtomicUsize::new(0),
        fail_after: 20,
    };
    let options = FarmOptions::new(8, 2, 10, 0.5, 0.5);

    match Farm::with_challenge(options, challenge).run(scrambled(6, 8, 5)) {
        Err(FarmError::FitnessEvaluation { tour, reason }) => {
            assert_eq!(reason, "distance service unavailable");
            assert!(is_permutation(&tour));
        }
        other => panic!("Expected FitnessEvaluation, got {:?}", other.map(|r| r.epochs)),
    }
}

#[test]
fn test_worker_panic_surfaces_as_worker_lost() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let exploding = move |tour: &[City]| -> Cost {
        if counter.fetch_add(1, Ordering::SeqCst) >= 6 {
            panic!("city table corrupted");
        }
        tour[0] as f64
    };

    let options = FarmOptions::new(6, 3, 5, 0.0, 0.0);
    let result = Farm::with_challenge(options, exploding).run(scrambled(4, 6, 3));
    assert!(matches!(result, Err(FarmError::WorkerLost(_))));
}

#[test]
fn test_shared_challenge_behind_trait_object() {
    let challenge: Arc<dyn Challenge> = Arc::new(CircleTour::new(9));
    let options = FarmOptions::new(9, 3, 5, 0.8, 0.2);
    let farm = Farm::new(options, challenge);

    let result = farm.run(scrambled(9, 9, 2)).unwrap();
    assert_eq!(result.epochs, farm.options().get_max_epochs());
}
