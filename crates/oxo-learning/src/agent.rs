use oxo_engine::{Board, BoardKey, Position};
use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::q_table::QTable;

/// Step size and discount of the value update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningParams {
    /// Learning rate α.
    pub alpha: f64,
    /// Discount factor γ.
    pub gamma: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            gamma: 0.9,
        }
    }
}

/// Tabular Q-learning agent with an ε-greedy policy.
#[derive(Debug, Clone, PartialEq)]
pub struct QAgent {
    table: QTable,
    params: LearningParams,
    epsilon: f64,
}

impl QAgent {
    /// Creates an agent with an empty table and ε = 1 (fully exploring).
    #[must_use]
    pub fn new(params: LearningParams) -> Self {
        Self::with_table(QTable::new(), params)
    }

    #[must_use]
    pub fn with_table(table: QTable, params: LearningParams) -> Self {
        Self {
            table,
            params,
            epsilon: 1.0,
        }
    }

    #[must_use]
    pub fn table(&self) -> &QTable {
        &self.table
    }

    #[must_use]
    pub fn into_table(self) -> QTable {
        self.table
    }

    #[must_use]
    pub fn params(&self) -> LearningParams {
        self.params
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Sets the exploration rate, clamped to `[0, 1]`.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    #[must_use]
    pub fn state_key(board: &Board) -> BoardKey {
        board.key()
    }

    #[must_use]
    pub fn q_value(&self, state: BoardKey, action: Position) -> f64 {
        self.table.get(state, action)
    }

    /// Picks a move with the agent's current ε.
    ///
    /// Returns `None` when the board has no empty cell.
    pub fn choose_action<R>(&self, board: &Board, rng: &mut R) -> Option<Position>
    where
        R: Rng + ?Sized,
    {
        self.choose_action_with(board, self.epsilon, rng)
    }

    /// Picks a move exploring with probability `epsilon`.
    ///
    /// When exploiting, ties between the highest-valued moves are broken uniformly
    /// at random.
    pub fn choose_action_with<R>(&self, board: &Board, epsilon: f64, rng: &mut R) -> Option<Position>
    where
        R: Rng + ?Sized,
    {
        let moves = board.legal_moves();
        if moves.is_empty() {
            return None;
        }
        if rng.random_bool(epsilon.clamp(0.0, 1.0)) {
            return moves.choose(rng).copied();
        }

        let state = Self::state_key(board);
        let best = self.table.max_value(state, &moves);
        let best_moves: Vec<Position> = moves
            .iter()
            .copied()
            .filter(|action| self.q_value(state, *action) >= best)
            .collect();
        best_moves.choose(rng).copied()
    }

    /// Applies one Bellman update to `Q(state, action)`.
    ///
    /// The target is `reward` when `terminal` is set; otherwise it is
    /// `reward + γ · max Q(next_state, a')` over the given next moves (`0` when there
    /// are none).
    pub fn update(
        &mut self,
        state: BoardKey,
        action: Position,
        reward: f64,
        next: Option<(BoardKey, &[Position])>,
        terminal: bool,
    ) {
        let old = self.q_value(state, action);
        let target = match next {
            Some((next_state, next_moves)) if !terminal => {
                reward + self.params.gamma * self.table.max_value(next_state, next_moves)
            }
            _ => reward,
        };
        self.table
            .set(state, action, old + self.params.alpha * (target - old));
    }
}
