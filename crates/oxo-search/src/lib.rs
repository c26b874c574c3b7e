//! Adversarial search for tic-tac-toe.
//!
//! The crate is organized in three layers:
//!
//! 1. **Scoring** ([`algorithm`]) - the recursive [`SearchAlgorithm::Minimax`] and
//!    [`SearchAlgorithm::AlphaBeta`] searches, returning the minimax value of a position
//!    from a fixed perspective and counting visited nodes with a [`NodeCounter`].
//!
//! 2. **Move selection** ([`search_engine`]) - [`SearchEngine`] picks the best move for
//!    the player to move, reports per-move scores, measures search effort
//!    ([`SearchEngine::simulation_move`]) and builds inspection trees
//!    ([`SearchEngine::build_decision_tree`]).
//!
//! 3. **Perfect play** ([`perfect_play`]) - [`PerfectPlayTable`] stores the solved value
//!    and best move of every reachable position, so perfect play needs no search at all.
//!
//! # Architecture
//!
//! ```text
//! PerfectPlayTable (memoized, whole game)
//!     ↓ same value convention as
//! SearchEngine (one decision)
//!     ↓ uses
//! SearchAlgorithm (score one position)
//! ```
//!
//! All searches walk the game tree with a single board, pairing every move with its
//! undo through [`oxo_engine::Board::play`].
//!
//! # Example
//!
//! ```
//! use oxo_engine::{Board, Position};
//! use oxo_search::{PerfectPlayTable, SearchAlgorithm, SearchEngine};
//!
//! let board: Board = "XX.OO....".parse().unwrap();
//! let engine = SearchEngine::new(SearchAlgorithm::Minimax);
//! assert_eq!(engine.find_best_move(&board).position(), Position::new(0, 2).unwrap());
//!
//! let table = PerfectPlayTable::precompute(&board);
//! assert_eq!(table.best_move(&board), Position::new(0, 2));
//! ```

pub use self::{algorithm::*, perfect_play::*, search_engine::*};

pub mod algorithm;
pub mod perfect_play;
pub mod search_engine;
