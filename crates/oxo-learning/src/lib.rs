//! Tabular Q-learning for tic-tac-toe.
//!
//! - [`QTable`] / [`QAgent`] - the sparse value table and the ε-greedy agent that
//!   owns it
//! - [`MovePolicy`] - the move-source capability shared by every kind of player
//!   ([`TablePlayer`], [`SearchPlayer`], [`LearningPlayer`], [`RandomPlayer`])
//! - [`evaluate_agent`] / [`evaluate_self_play`] - exploration-free match series
//! - [`Trainer`] - the curriculum training loop with ε decay and early stopping
//!
//! # Example
//!
//! ```no_run
//! use oxo_engine::Board;
//! use oxo_learning::{LearningParams, QAgent, Trainer, TrainingConfig};
//! use oxo_search::PerfectPlayTable;
//! use rand::SeedableRng;
//! use rand_pcg::Pcg64;
//!
//! let table = PerfectPlayTable::precompute(&Board::new());
//! let trainer = Trainer::new(TrainingConfig::default(), Some(&table));
//! let mut agent = QAgent::new(LearningParams::default());
//! let mut rng = Pcg64::seed_from_u64(0);
//! let outcome = trainer.train(&mut agent, &mut rng, None)?;
//! println!("converged after {} episodes", outcome.episodes_to_convergence);
//! # Ok::<(), oxo_learning::TrainingError>(())
//! ```

use oxo_engine::{MoveError, Player};

pub use self::{agent::*, evaluation::*, policy::*, q_table::*, trainer::*};

mod agent;
mod evaluation;
pub mod policy;
mod q_table;
pub mod trainer;

/// Error aborting training or a game during training or evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TrainingError {
    #[display("{player} had no move on an unfinished board")]
    NoMove { player: Player },
    #[display("illegal move: {_0}")]
    IllegalMove(MoveError),
    #[display("invalid training configuration: {reason}")]
    InvalidConfig { reason: &'static str },
}
