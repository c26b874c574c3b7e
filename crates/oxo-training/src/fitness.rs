//! Fitness of a chromosome: train an agent with it, then play the master.
//!
//! # Fitness Function
//!
//! With `q = (wins + draws) / games` against the master:
//!
//! - `q < 1`: fitness is `q`
//! - `q = 1`: fitness is `1 + max(0, (budget - episodes_to_convergence) / budget)`
//!
//! so every agent that never loses beats every agent that sometimes does, and
//! among perfect agents the one that converged earliest wins. An agent that never
//! passed the convergence check reports the whole budget and gets no bonus.

use oxo_learning::{
    MatchRecord, QAgent, Trainer, TrainingConfig, evaluate_agent, master_policy,
};
use oxo_search::PerfectPlayTable;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::{EvaluationError, chromosome::Chromosome};

/// A self-contained unit of work for one evaluation worker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTask {
    /// Id of the evaluated individual within its generation.
    pub id: usize,
    pub chromosome: Chromosome,
    /// Seed of the task's own RNG.
    pub seed: u64,
}

/// Result of evaluating one chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub fitness: f64,
    /// Evaluation games against the master.
    pub record: MatchRecord,
    /// `None` when no attempt completed.
    pub episodes_to_convergence: Option<usize>,
    /// Set when every attempt failed.
    pub failed: bool,
}

impl EvaluationOutcome {
    /// Outcome of an individual whose evaluation attempts all failed.
    #[must_use]
    pub fn failure() -> Self {
        Self {
            fitness: 0.0,
            record: MatchRecord::default(),
            episodes_to_convergence: None,
            failed: true,
        }
    }
}

/// Scores a training run.
///
/// # Examples
///
/// ```
/// use oxo_learning::MatchRecord;
/// use oxo_training::fitness::fitness;
///
/// let lossy = MatchRecord { wins: 0, losses: 5, draws: 45 };
/// assert_eq!(fitness(&lossy, 6500, 6500), 0.9);
///
/// let perfect = MatchRecord { wins: 0, losses: 0, draws: 50 };
/// assert_eq!(fitness(&perfect, 1300, 6500), 1.8);
/// assert_eq!(fitness(&perfect, 6500, 6500), 1.0);
/// ```
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn fitness(record: &MatchRecord, episodes_to_convergence: usize, budget: usize) -> f64 {
    let quality = record.non_loss_rate();
    if quality < 1.0 {
        return quality;
    }
    let budget = budget.max(1) as f64;
    let speed_bonus = (budget - episodes_to_convergence as f64) / budget;
    1.0 + speed_bonus.max(0.0)
}

/// Computes the fitness of a chromosome.
///
/// Implementations are shared by every worker thread of the optimizer and must
/// derive all randomness from [`EvaluationTask::seed`].
pub trait FitnessEvaluator: Sync {
    fn evaluate(&self, task: &EvaluationTask) -> Result<EvaluationOutcome, EvaluationError>;
}

/// Trains a fresh [`QAgent`] with the chromosome and evaluates it greedily
/// against the master.
#[derive(Debug, Clone)]
pub struct QLearningEvaluator<'a> {
    table: Option<&'a PerfectPlayTable>,
    training: TrainingConfig,
    evaluation_games: usize,
}

impl<'a> QLearningEvaluator<'a> {
    /// `training` provides everything but the chromosome's genes; without a table
    /// the master is live alpha-beta search.
    #[must_use]
    pub fn new(
        table: Option<&'a PerfectPlayTable>,
        training: TrainingConfig,
        evaluation_games: usize,
    ) -> Self {
        Self {
            table,
            training,
            evaluation_games,
        }
    }

    #[must_use]
    pub fn training(&self) -> &TrainingConfig {
        &self.training
    }

    #[must_use]
    pub fn evaluation_games(&self) -> usize {
        self.evaluation_games
    }
}

impl FitnessEvaluator for QLearningEvaluator<'_> {
    fn evaluate(&self, task: &EvaluationTask) -> Result<EvaluationOutcome, EvaluationError> {
        let mut rng = Pcg64::seed_from_u64(task.seed);
        let config = task.chromosome.training_config(&self.training);
        let budget = config.episodes;
        let trainer = Trainer::new(config, self.table);
        let mut agent = QAgent::new(task.chromosome.learning_params());
        let training = trainer.train(&mut agent, &mut rng, None)?;

        let master = master_policy(self.table);
        let record = evaluate_agent(&agent, master.as_ref(), self.evaluation_games, &mut rng)?;
        let fitness = fitness(&record, training.episodes_to_convergence, budget);
        tracing::debug!(
            id = task.id,
            fitness,
            wins = record.wins,
            draws = record.draws,
            losses = record.losses,
            episodes_to_convergence = training.episodes_to_convergence,
            "individual evaluated"
        );
        Ok(EvaluationOutcome {
            fitness,
            record,
            episodes_to_convergence: Some(training.episodes_to_convergence),
            failed: false,
        })
    }
}
