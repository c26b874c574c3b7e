//! Move sources that can sit on either side of the board.
//!
//! Training, evaluation and the benchmarks only need one capability from a player:
//! propose a move for the current board. [`MovePolicy`] captures it so the trainer
//! never has to know whether its opponent is a lookup table, a live search or
//! another learner.
//!
//! - [`TablePlayer`] - plays the stored move of a [`PerfectPlayTable`]
//! - [`SearchPlayer`] - searches the position with a [`SearchEngine`]
//! - [`LearningPlayer`] - ε-greedy over a [`QAgent`]
//! - [`RandomPlayer`] - uniformly random legal move

use oxo_engine::{Board, Position};
use oxo_search::{PerfectPlayTable, SearchAlgorithm, SearchEngine};
use rand::{RngCore, seq::IndexedRandom};

use crate::agent::QAgent;

/// A source of moves for one side of a game.
pub trait MovePolicy {
    /// Proposes a move for the player to move, `None` if the board has no empty cell.
    fn propose_move(&self, board: &Board, rng: &mut dyn RngCore) -> Option<Position>;
}

/// Follows a precomputed [`PerfectPlayTable`].
///
/// Positions missing from the table get a uniformly random legal move.
#[derive(Debug, Clone, Copy)]
pub struct TablePlayer<'a> {
    table: &'a PerfectPlayTable,
}

impl<'a> TablePlayer<'a> {
    #[must_use]
    pub fn new(table: &'a PerfectPlayTable) -> Self {
        Self { table }
    }
}

impl MovePolicy for TablePlayer<'_> {
    fn propose_move(&self, board: &Board, rng: &mut dyn RngCore) -> Option<Position> {
        if board.is_terminal() {
            return None;
        }
        self.table
            .best_move(board)
            .or_else(|| board.legal_moves().choose(rng).copied())
    }
}

/// Plays the move chosen by a live search.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPlayer {
    engine: SearchEngine,
}

impl SearchPlayer {
    #[must_use]
    pub fn new(algorithm: SearchAlgorithm) -> Self {
        Self {
            engine: SearchEngine::new(algorithm),
        }
    }
}

impl MovePolicy for SearchPlayer {
    fn propose_move(&self, board: &Board, _rng: &mut dyn RngCore) -> Option<Position> {
        if board.is_terminal() {
            return None;
        }
        Some(self.engine.simulation_move(board).0)
    }
}

/// Plays a [`QAgent`], optionally with an exploration rate other than the agent's own.
#[derive(Debug, Clone, Copy)]
pub struct LearningPlayer<'a> {
    agent: &'a QAgent,
    epsilon: Option<f64>,
}

impl<'a> LearningPlayer<'a> {
    /// Explores with the agent's current ε.
    #[must_use]
    pub fn new(agent: &'a QAgent) -> Self {
        Self {
            agent,
            epsilon: None,
        }
    }

    /// Never explores.
    #[must_use]
    pub fn greedy(agent: &'a QAgent) -> Self {
        Self::with_epsilon(agent, 0.0)
    }

    #[must_use]
    pub fn with_epsilon(agent: &'a QAgent, epsilon: f64) -> Self {
        Self {
            agent,
            epsilon: Some(epsilon),
        }
    }
}

impl MovePolicy for LearningPlayer<'_> {
    fn propose_move(&self, board: &Board, rng: &mut dyn RngCore) -> Option<Position> {
        if board.is_terminal() {
            return None;
        }
        let epsilon = self.epsilon.unwrap_or(self.agent.epsilon());
        self.agent.choose_action_with(board, epsilon, rng)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPlayer;

impl MovePolicy for RandomPlayer {
    fn propose_move(&self, board: &Board, rng: &mut dyn RngCore) -> Option<Position> {
        if board.is_terminal() {
            return None;
        }
        board.legal_moves().choose(rng).copied()
    }
}

/// The perfect-play opponent: the table when one is available, live alpha-beta
/// search otherwise.
#[must_use]
pub fn master_policy(table: Option<&PerfectPlayTable>) -> Box<dyn MovePolicy + '_> {
    match table {
        Some(table) => Box::new(TablePlayer::new(table)),
        None => Box::new(SearchPlayer::new(SearchAlgorithm::AlphaBeta)),
    }
}

#[cfg(test)]
mod tests {
    use oxo_engine::BoardKey;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use super::*;
    use crate::agent::LearningParams;

    #[test]
    fn test_table_and_search_agree() {
        let table = PerfectPlayTable::precompute(&Board::new());
        let mut rng = Pcg64::seed_from_u64(5);
        let table_player = master_policy(Some(&table));
        let search_player = master_policy(None);
        for (key, entry) in table.iter().filter(|(_, e)| e.best_move().is_some()).step_by(37) {
            let board = Board::from_key(key).unwrap();
            let expected = entry.best_move();
            assert_eq!(table_player.propose_move(&board, &mut rng), expected);
            assert_eq!(search_player.propose_move(&board, &mut rng), expected);
        }
    }

    #[test]
    fn test_table_player_falls_back_to_random() {
        let table = PerfectPlayTable::default();
        let player = TablePlayer::new(&table);
        let board: Board = "XO.......".parse().unwrap();
        let mut rng = Pcg64::seed_from_u64(5);
        let position = player.propose_move(&board, &mut rng).unwrap();
        assert!(board.cell(position).is_empty());
    }

    #[test]
    fn test_no_move_on_finished_board() {
        let board: Board = "XXXOO....".parse().unwrap();
        let agent = QAgent::new(LearningParams::default());
        let mut rng = Pcg64::seed_from_u64(5);
        let policies: [&dyn MovePolicy; 3] =
            [&SearchPlayer::default(), &LearningPlayer::new(&agent), &RandomPlayer];
        for policy in policies {
            assert_eq!(policy.propose_move(&board, &mut rng), None);
        }
    }

    #[test]
    fn test_learning_player_overrides_epsilon() {
        let mut agent = QAgent::new(LearningParams::default());
        agent.update(BoardKey::EMPTY, Position::CENTER, 1.0, None, true);
        assert!((agent.epsilon() - 1.0).abs() < f64::EPSILON);
        let player = LearningPlayer::greedy(&agent);
        let mut rng = Pcg64::seed_from_u64(5);
        for _ in 0..20 {
            assert_eq!(
                player.propose_move(&Board::new(), &mut rng),
                Some(Position::CENTER)
            );
        }
    }
}
