//! Genetic search over Q-learning hyperparameters.
//!
//! A [`Chromosome`](chromosome::Chromosome) holds the four tunable genes of a
//! training run: learning rate α, discount γ, per-episode ε decay and the reward
//! of a drawn game. The optimizer looks for the chromosome whose agent learns
//! perfect play the fastest.
//!
//! # How Optimization Works
//!
//! 1. **Population** - Sample chromosomes uniformly within [`GeneRanges`](chromosome::GeneRanges)
//! 2. **Evaluation** - Each unevaluated individual trains a fresh agent and plays the master
//! 3. **Fitness** - Non-loss rate, plus a speed bonus once the agent never loses
//! 4. **Selection** - Tournament selection over the evaluated generation
//! 5. **Reproduction** - Elites carried over, the rest from crossover and mutation
//! 6. **Repeat** - For a fixed number of generations
//!
//! # Architecture
//!
//! ```text
//! GeneticOptimizer
//!     ↓ dispatches EvaluationTask (chromosome + seed)
//! rayon thread pool
//!     ↓ runs
//! FitnessEvaluator (trains + evaluates a QAgent)
//!     ↓ returns
//! EvaluationOutcome
//!     ↓ reported to
//! GenerationObserver
//!     ↓ then
//! PopulationEvolver (next generation)
//! ```
//!
//! Evaluation tasks share nothing but the read-only evaluator; every task owns its
//! agent, boards and RNG. A task that fails or panics is retried with a shifted
//! seed and finally scored `0.0` and flagged as failed, so the population size
//! never changes.
//!
//! # Example
//!
//! ```no_run
//! use oxo_engine::Board;
//! use oxo_learning::TrainingConfig;
//! use oxo_search::PerfectPlayTable;
//! use oxo_training::{
//!     fitness::QLearningEvaluator,
//!     optimizer::{GeneticConfig, GeneticOptimizer},
//! };
//! use rand::SeedableRng;
//! use rand_pcg::Pcg64;
//!
//! let table = PerfectPlayTable::precompute(&Board::new());
//! let evaluator = QLearningEvaluator::new(Some(&table), TrainingConfig::default(), 50);
//! let optimizer = GeneticOptimizer::new(GeneticConfig::default());
//! let mut rng = Pcg64::seed_from_u64(0);
//! let result = optimizer.run(&evaluator, &mut (), &mut rng)?;
//! println!("best fitness: {:.3}", result.best.fitness());
//! # Ok::<(), oxo_training::OptimizerError>(())
//! ```
//!
//! # Current Limitations
//!
//! - **Fixed budget**: runs for a fixed number of generations, no stagnation detection
//! - **Noisy fitness**: each individual is trained once, so lucky seeds can win
//!   a generation; use repeated validation runs to confirm a winner

pub mod chromosome;
pub mod fitness;
pub mod genetic;
pub mod optimizer;

use oxo_learning::TrainingError;

/// Failure of a single fitness evaluation attempt.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EvaluationError {
    #[display("training failed: {_0}")]
    Training(TrainingError),
    #[display("evaluation panicked: {message}")]
    #[from(ignore)]
    Panicked { message: String },
}

/// Error aborting an optimization run.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum OptimizerError {
    #[display("invalid optimizer configuration: {reason}")]
    #[from(ignore)]
    InvalidConfig { reason: &'static str },
    #[display("failed to build the evaluation thread pool")]
    ThreadPool(rayon::ThreadPoolBuildError),
}
