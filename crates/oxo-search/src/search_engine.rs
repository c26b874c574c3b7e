//! Move selection on top of a [`SearchAlgorithm`].
//!
//! [`SearchEngine`] scores every legal move of the player to move by searching one
//! ply deeper with roles flipped, then keeps the highest score. Ties go to the first
//! move in row-major order, so [`SearchAlgorithm::Minimax`] and
//! [`SearchAlgorithm::AlphaBeta`] always agree on the chosen move.
//!
//! # Usage
//!
//! ```
//! use oxo_engine::Board;
//! use oxo_search::{SearchAlgorithm, SearchEngine};
//!
//! let engine = SearchEngine::new(SearchAlgorithm::AlphaBeta);
//! let best = engine.find_best_move(&Board::new());
//! assert_eq!(best.value(), 0);
//! assert_eq!(best.children().len(), 9);
//! ```

use oxo_engine::{Board, Player, Position};

use crate::algorithm::{NodeCounter, SearchAlgorithm, Value};

/// Score of a single root move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveScore {
    position: Position,
    score: Value,
    board: Board,
}

impl MoveScore {
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Exact minimax value of the move for the player who makes it.
    #[must_use]
    pub fn score(&self) -> Value {
        self.score
    }

    /// Board after the move.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }
}

/// Result of [`SearchEngine::find_best_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    position: Position,
    value: Value,
    nodes: u64,
    children: Vec<MoveScore>,
}

impl BestMove {
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub fn value(&self) -> Value {
        self.value
    }

    /// Nodes visited below the root.
    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Scores of every legal root move, in row-major order.
    #[must_use]
    pub fn children(&self) -> &[MoveScore] {
        &self.children
    }
}

/// Node of the tree returned by [`SearchEngine::build_decision_tree`].
///
/// Only the chosen child of each node is expanded; its siblings carry their score
/// and no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionNode {
    board: Board,
    position: Option<Position>,
    score: Value,
    chosen: bool,
    children: Vec<DecisionNode>,
}

impl DecisionNode {
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The move that led to this node, `None` for the root.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    #[must_use]
    pub fn score(&self) -> Value {
        self.score
    }

    #[must_use]
    pub fn is_chosen(&self) -> bool {
        self.chosen
    }

    #[must_use]
    pub fn children(&self) -> &[DecisionNode] {
        &self.children
    }

    /// Follows the chosen children from this node down to the deepest expanded one.
    pub fn principal_variation(&self) -> impl Iterator<Item = Position> + '_ {
        std::iter::successors(self.chosen_child(), |node| node.chosen_child())
            .filter_map(|node| node.position)
    }

    fn chosen_child(&self) -> Option<&DecisionNode> {
        self.children.iter().find(|child| child.chosen)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchEngine {
    algorithm: SearchAlgorithm,
}

impl SearchEngine {
    #[must_use]
    pub fn new(algorithm: SearchAlgorithm) -> Self {
        Self { algorithm }
    }

    #[must_use]
    pub fn algorithm(&self) -> SearchAlgorithm {
        self.algorithm
    }

    /// Finds the best move for the player to move.
    ///
    /// Every root child is searched with a fresh window, so each reported child
    /// score is exact.
    ///
    /// # Panics
    ///
    /// Panics if the board is terminal (no move can be made).
    #[must_use]
    pub fn find_best_move(&self, board: &Board) -> BestMove {
        assert!(!board.is_terminal(), "cannot search a finished game");

        let perspective = board.turn();
        let mut board = board.clone();
        let mut nodes = NodeCounter::new();
        let mut best: Option<(Position, Value)> = None;
        let mut children = vec![];

        for position in board.legal_moves() {
            let mut child = board
                .play(position)
                .expect("legal move should always be accepted");
            let score = self
                .algorithm
                .search(&mut child, false, perspective, &mut nodes);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((position, score));
            }
            children.push(MoveScore {
                position,
                score,
                board: Board::clone(&child),
            });
        }

        let (position, value) = best.expect("non-terminal board should have a legal move");
        BestMove {
            position,
            value,
            nodes: nodes.count(),
            children,
        }
    }

    /// Chooses the same move as [`SearchEngine::find_best_move`] and returns it with
    /// the number of nodes visited.
    ///
    /// Root children are not materialized. With alpha-beta, the root `alpha` is
    /// shared across children so later siblings can be cut off early.
    ///
    /// # Panics
    ///
    /// Panics if the board is terminal.
    #[must_use]
    pub fn simulation_move(&self, board: &Board) -> (Position, u64) {
        assert!(!board.is_terminal(), "cannot search a finished game");

        let perspective = board.turn();
        let mut board = board.clone();
        let mut nodes = NodeCounter::new();
        let mut alpha = Value::MIN;
        let mut best: Option<(Position, Value)> = None;

        for position in board.legal_moves() {
            let mut child = board
                .play(position)
                .expect("legal move should always be accepted");
            let score = self.algorithm.search_window(
                &mut child,
                alpha,
                Value::MAX,
                false,
                perspective,
                &mut nodes,
            );
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((position, score));
            }
            alpha = alpha.max(score);
        }

        let (position, _) = best.expect("non-terminal board should have a legal move");
        (position, nodes.count())
    }

    /// Builds a tree tracing the engine's choices from `board` for up to `max_depth`
    /// plies.
    ///
    /// At each level every legal move is scored from `perspective`; the side to move
    /// maximizes when it is `perspective` and minimizes otherwise. Only the chosen
    /// move is expanded further.
    #[must_use]
    pub fn build_decision_tree(
        &self,
        board: &Board,
        perspective: Player,
        max_depth: usize,
    ) -> DecisionNode {
        let mut board = board.clone();
        let maximizing = board.turn() == perspective;
        let (score, children) = if board.is_terminal() || max_depth == 0 {
            let mut nodes = NodeCounter::new();
            let score = self
                .algorithm
                .search(&mut board, maximizing, perspective, &mut nodes);
            (score, vec![])
        } else {
            self.expand(&mut board, perspective, max_depth)
        };
        DecisionNode {
            board,
            position: None,
            score,
            chosen: true,
            children,
        }
    }

    fn expand(
        &self,
        board: &mut Board,
        perspective: Player,
        depth_left: usize,
    ) -> (Value, Vec<DecisionNode>) {
        let maximizing = board.turn() == perspective;
        let mut nodes = NodeCounter::new();
        let mut children = vec![];
        let mut best: Option<(usize, Value)> = None;

        for position in board.legal_moves() {
            let mut child = board
                .play(position)
                .expect("legal move should always be accepted");
            let score = self
                .algorithm
                .search(&mut child, !maximizing, perspective, &mut nodes);
            let better = best.is_none_or(|(_, best_score)| {
                if maximizing {
                    score > best_score
                } else {
                    score < best_score
                }
            });
            if better {
                best = Some((children.len(), score));
            }
            children.push(DecisionNode {
                board: Board::clone(&child),
                position: Some(position),
                score,
                chosen: false,
                children: vec![],
            });
        }

        let (chosen, score) = best.expect("non-terminal board should have a legal move");
        let node = &mut children[chosen];
        node.chosen = true;
        if depth_left > 1 && !node.board.is_terminal() {
            let mut next = node.board.clone();
            node.children = self.expand(&mut next, perspective, depth_left - 1).1;
        }
        (score, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engines() -> [SearchEngine; 2] {
        SearchAlgorithm::ALL.map(SearchEngine::new)
    }

    #[test]
    fn test_takes_winning_move() {
        let board: Board = "XX.OO....".parse().unwrap();
        for engine in engines() {
            let best = engine.find_best_move(&board);
            assert_eq!(best.position(), Position::new(0, 2).unwrap());
            assert_eq!(best.value(), 1);
        }
    }

    #[test]
    fn test_blocks_opponent() {
        // O to move must block X at (0, 2)
        let board: Board = "XX..O....".parse().unwrap();
        for engine in engines() {
            let best = engine.find_best_move(&board);
            assert_eq!(best.position(), Position::new(0, 2).unwrap());
            assert_eq!(engine.simulation_move(&board).0, best.position());
        }
    }

    #[test]
    fn test_children_scores_are_exact() {
        let board: Board = "X...O....".parse().unwrap();
        let minimax = SearchEngine::new(SearchAlgorithm::Minimax).find_best_move(&board);
        let alpha_beta = SearchEngine::new(SearchAlgorithm::AlphaBeta).find_best_move(&board);
        assert_eq!(minimax.children().len(), 7);
        for (a, b) in minimax.children().iter().zip(alpha_beta.children()) {
            assert_eq!(a.position(), b.position());
            assert_eq!(a.score(), b.score());
            assert_eq!(a.board().move_count(), 3);
        }
        assert!(alpha_beta.nodes() <= minimax.nodes());
    }

    #[test]
    fn test_ties_go_to_first_move() {
        let best = SearchEngine::new(SearchAlgorithm::Minimax).find_best_move(&Board::new());
        assert_eq!(best.value(), 0);
        assert_eq!(best.position(), Position::new(0, 0).unwrap());
    }

    #[test]
    #[should_panic(expected = "finished game")]
    fn test_terminal_board_panics() {
        let board: Board = "XXXOO....".parse().unwrap();
        let _ = SearchEngine::default().find_best_move(&board);
    }

    #[test]
    fn test_decision_tree_expands_chosen_line() {
        let engine = SearchEngine::new(SearchAlgorithm::AlphaBeta);
        let board: Board = "X...O....".parse().unwrap();
        let tree = engine.build_decision_tree(&board, Player::X, 2);
        assert!(tree.is_chosen());
        assert_eq!(tree.position(), None);
        assert_eq!(tree.children().len(), 7);

        let chosen: Vec<_> = tree.children().iter().filter(|c| c.is_chosen()).collect();
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].score(), tree.score());
        assert_eq!(chosen[0].children().len(), 6);
        for sibling in tree.children().iter().filter(|c| !c.is_chosen()) {
            assert!(sibling.children().is_empty());
        }
        // second level minimizes X's score
        let min = chosen[0].children().iter().map(DecisionNode::score).min();
        assert_eq!(Some(chosen[0].score()), min);
        assert_eq!(tree.principal_variation().count(), 2);
    }

    #[test]
    fn test_decision_tree_depth_zero() {
        let engine = SearchEngine::default();
        let tree = engine.build_decision_tree(&Board::new(), Player::O, 0);
        assert_eq!(tree.score(), 0);
        assert!(tree.children().is_empty());
    }
}
