use chrono::{DateTime, Utc};
use oxo_learning::{LearningParams, MatchRecord, QAgent, QTable, TrainingConfig};
use serde::{Deserialize, Serialize};

/// A trained Q-table together with how it was trained.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QModel {
    pub trained_at: DateTime<Utc>,
    pub params: LearningParams,
    pub training: TrainingConfig,
    /// Episodes over every training session, resumed ones included.
    pub total_episodes: usize,
    /// Episodes of the last session until its convergence check passed.
    pub episodes_to_convergence: usize,
    pub converged: bool,
    /// Greedy play against the master after the last session.
    pub evaluation: MatchRecord,
    pub q_table: QTable,
}

impl QModel {
    pub fn into_agent(self) -> QAgent {
        let mut agent = QAgent::with_table(self.q_table, self.params);
        agent.set_epsilon(0.0);
        agent
    }
}
