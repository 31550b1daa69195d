pub mod error;
pub mod farm;
pub mod operators;
pub mod pool;
pub mod rng;
pub mod state;
pub mod tour;
pub mod worker;

// Re-export commonly used types for convenience
pub use error::{FarmError, OptionExt, Result, ResultExt};
pub use farm::{Challenge, Farm, FarmOptions, RunResult};
pub use state::GlobalOptimum;
pub use tour::{City, Cost, Tour};
