//! # Worker Pool
//!
//! Carries chunks from the coordinator to the workers and their outcomes
//! back. Chunks run on a `rayon` thread pool of `num_workers` threads; each
//! thread keeps one random generator for its whole life. Outcomes travel over
//! a `crossbeam_channel` feedback channel in whatever order workers finish.
//!
//! ```rust
//! use std::sync::Arc;
//! use tsp_farm::farm::Challenge;
//! use tsp_farm::pool::WorkerPool;
//! use tsp_farm::worker::{Chunk, ChunkContext};
//!
//! let challenge: Arc<dyn Challenge> = Arc::new(|tour: &[usize]| tour[0] as f64);
//! let pool = WorkerPool::new(2, Some(1)).unwrap();
//! pool.submit(Chunk {
//!     epoch: 0,
//!     start: 0,
//!     tours: vec![vec![1, 0], vec![0, 1]],
//!     costs: vec![0.0, 0.0],
//!     context: ChunkContext {
//!         challenge,
//!         crossover_prob: 0.0,
//!         mutation_prob: 0.0,
//!         elite_slot: None,
//!     },
//! })
//! .unwrap();
//!
//! let outcome = pool.recv().unwrap().unwrap();
//! assert_eq!(outcome.result.best, 1);
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::warn;

use crate::error::{FarmError, OptionExt, Result, ResultExt};
use crate::farm::challenge::Challenge;
use crate::rng::WorkerRngs;
use crate::worker::{Chunk, ChunkOutcome, Worker};

/// What a worker sends back for one chunk.
pub type WorkerReport = Result<ChunkOutcome>;

/// State of the feedback channel as seen by a non-blocking poll.
#[derive(Debug)]
pub enum Feedback {
    /// No outcome is waiting; the coordinator may ask for more work.
    Empty,
    /// A worker delivered an outcome.
    Report(WorkerReport),
    /// The pool was shut down and every in-flight outcome was drained.
    Closed,
}

pub struct WorkerPool {
    pool: rayon::ThreadPool,
    rngs: Arc<WorkerRngs>,
    feedback_tx: Option<Sender<WorkerReport>>,
    feedback_rx: Receiver<WorkerReport>,
}

impl WorkerPool {
    /// Starts `num_workers` threads. `seed` makes each thread's generator reproducible.
    pub fn new(num_workers: usize, seed: Option<u64>) -> Result<Self> {
        if num_workers == 0 {
            return Err(FarmError::InvalidConfiguration(
                "Number of workers cannot be zero".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|index| format!("tsp-farm-worker-{}", index))
            .build()
            .context("Failed to build worker pool")?;
        let (feedback_tx, feedback_rx) = crossbeam_channel::unbounded();

        Ok(Self {
            pool,
            rngs: Arc::new(WorkerRngs::new(seed)),
            feedback_tx: Some(feedback_tx),
            feedback_rx,
        })
    }

    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Hands `chunk` to the next free worker.
    ///
    /// A panic inside the worker is reported as `FarmError::WorkerLost`
    /// on the feedback channel instead of tearing the pool down.
    pub fn submit<C>(&self, chunk: Chunk<C>) -> Result<()>
    where
        C: Challenge + ?Sized + 'static,
    {
        let feedback = self.feedback_tx.clone().ok_or_else_farm(|| {
            FarmError::ProtocolViolation("chunk submitted after shutdown".to_string())
        })?;
        let rngs = Arc::clone(&self.rngs);
        let (epoch, start) = (chunk.epoch, chunk.start);

        self.pool.spawn(move || {
            let report = panic::catch_unwind(AssertUnwindSafe(|| {
                rngs.with(|rng| Worker::process(chunk, rng))
            }))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                warn!(epoch, start, %message, "Worker panicked");
                Err(FarmError::WorkerLost(format!(
                    "chunk at slot {} of epoch {} panicked: {}",
                    start, epoch, message
                )))
            });
            // The receiver is gone only if the run was abandoned.
            let _ = feedback.send(report);
        });
        Ok(())
    }

    /// Non-blocking check of the feedback channel.
    pub fn poll(&self) -> Feedback {
        match self.feedback_rx.try_recv() {
            Ok(report) => Feedback::Report(report),
            Err(TryRecvError::Empty) => Feedback::Empty,
            Err(TryRecvError::Disconnected) => Feedback::Closed,
        }
    }

    /// Blocks until a worker reports.
    pub fn recv(&self) -> Result<WorkerReport> {
        self.feedback_rx.recv().map_err(|_| {
            FarmError::ProtocolViolation("feedback channel closed with no outcome".to_string())
        })
    }

    /// Runs `op` inside the pool, so rayon parallel iterators use its threads.
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Stops accepting chunks. Once in-flight outcomes are drained, `poll`
    /// reports `Feedback::Closed`.
    pub fn shutdown(&mut self) {
        self.feedback_tx = None;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
