//! Recursive game-tree scoring shared by every search entry point.
//!
//! Both algorithms evaluate a position from a fixed `perspective` player: a won game
//! scores `+1` for that player, `-1` for the opponent and `0` for a draw. The
//! `maximizing` flag says whether the side to move at this node is trying to raise
//! or lower that score.
//!
//! [`SearchAlgorithm::AlphaBeta`] carries a `[alpha, beta]` window and stops iterating
//! siblings once `beta <= alpha`. It never changes the value of a position searched
//! with the full window, only how many nodes are visited to find it.

use oxo_engine::{Board, Player};

/// Minimax value of a position, always one of `-1`, `0` or `1` at the leaves.
pub type Value = i8;

/// Counts every node visited by a search, including leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCounter(u64);

impl NodeCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visit(&mut self) {
        self.0 += 1;
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.0
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::FromStr)]
pub enum SearchAlgorithm {
    /// Exhaustive minimax.
    Minimax,
    /// Minimax with alpha-beta pruning.
    #[default]
    AlphaBeta,
}

impl SearchAlgorithm {
    pub const ALL: [SearchAlgorithm; 2] = [SearchAlgorithm::Minimax, SearchAlgorithm::AlphaBeta];

    /// Scores `board` from `perspective` with a full window.
    ///
    /// The board is explored in place and is restored before returning.
    pub fn search(
        self,
        board: &mut Board,
        maximizing: bool,
        perspective: Player,
        nodes: &mut NodeCounter,
    ) -> Value {
        self.search_window(board, Value::MIN, Value::MAX, maximizing, perspective, nodes)
    }

    /// Scores `board` within `[alpha, beta]`.
    ///
    /// Plain minimax ignores the window. For alpha-beta, a result outside the window
    /// is only a bound on the true value.
    pub fn search_window(
        self,
        board: &mut Board,
        alpha: Value,
        beta: Value,
        maximizing: bool,
        perspective: Player,
        nodes: &mut NodeCounter,
    ) -> Value {
        match self {
            SearchAlgorithm::Minimax => minimax(board, maximizing, perspective, nodes),
            SearchAlgorithm::AlphaBeta => {
                alpha_beta(board, alpha, beta, maximizing, perspective, nodes)
            }
        }
    }
}

fn minimax(board: &mut Board, maximizing: bool, perspective: Player, nodes: &mut NodeCounter) -> Value {
    nodes.visit();
    if let Some(outcome) = board.outcome() {
        return outcome.value_for(perspective);
    }

    let mut best = if maximizing { Value::MIN } else { Value::MAX };
    for position in board.legal_moves() {
        let mut child = board
            .play(position)
            .expect("legal move should always be accepted");
        let score = minimax(&mut child, !maximizing, perspective, nodes);
        best = if maximizing {
            best.max(score)
        } else {
            best.min(score)
        };
    }
    best
}

fn alpha_beta(
    board: &mut Board,
    mut alpha: Value,
    mut beta: Value,
    maximizing: bool,
    perspective: Player,
    nodes: &mut NodeCounter,
) -> Value {
    nodes.visit();
    if let Some(outcome) = board.outcome() {
        return outcome.value_for(perspective);
    }

    let mut best = if maximizing { Value::MIN } else { Value::MAX };
    for position in board.legal_moves() {
        let mut child = board
            .play(position)
            .expect("legal move should always be accepted");
        let score = alpha_beta(&mut child, alpha, beta, !maximizing, perspective, nodes);
        if maximizing {
            best = best.max(score);
            alpha = alpha.max(best);
        } else {
            best = best.min(score);
            beta = beta.min(best);
        }
        if beta <= alpha {
            break;
        }
    }
    best
}
