use std::{
    fmt,
    ops::{Deref, DerefMut},
    str::FromStr,
};

use arrayvec::ArrayVec;

use crate::{
    InvalidBoardError, MoveError, ParseBoardError,
    core::{BoardKey, CELL_COUNT, Cell, Player, Position, WinLine},
};

use super::{GameStatus, Outcome};

/// A 3×3 board together with the player to move and the game status.
///
/// Moves are applied in place and can be reverted with [`Board::undo`], so a search
/// can walk the whole game tree with a single board.
///
/// When a move ends the game the turn is not passed on: [`Board::turn`] keeps
/// reporting the player that made the final move.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
    turn: Player,
    status: GameStatus,
}

/// State needed to revert a move made with [`Board::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveUndo {
    turn: Player,
    status: GameStatus,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Empty board with X to move.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; CELL_COUNT],
            turn: Player::X,
            status: GameStatus::Ongoing,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Reconstructs the board described by `key`.
    ///
    /// The player to move is derived from the mark counts (X when they are equal)
    /// and the status is recomputed from the cells. On a finished board the turn
    /// stays with the player who moved last, as it would after [`Board::apply`].
    pub fn from_key(key: BoardKey) -> Result<Self, InvalidBoardError> {
        let cells = key.cells();
        let count = |player| cells.iter().filter(|c| **c == Cell::Marked(player)).count();
        let (x_count, o_count) = (count(Player::X), count(Player::O));
        if x_count != o_count && x_count != o_count + 1 {
            return Err(InvalidBoardError::MarkCount { x_count, o_count });
        }
        let last_mover = if x_count == o_count {
            Player::O
        } else {
            Player::X
        };

        let x_line = winning_line(&cells, Player::X);
        let o_line = winning_line(&cells, Player::O);
        let status = match (x_line, o_line) {
            (Some(_), Some(_)) => return Err(InvalidBoardError::BothWinners),
            (Some(line), None) => won(Player::X, line, last_mover)?,
            (None, Some(line)) => won(Player::O, line, last_mover)?,
            (None, None) if x_count + o_count == CELL_COUNT => GameStatus::Draw,
            (None, None) => GameStatus::Ongoing,
        };
        let turn = if status.is_ongoing() {
            last_mover.opponent()
        } else {
            last_mover
        };

        Ok(Self {
            cells,
            turn,
            status,
        })
    }

    #[must_use]
    pub fn key(&self) -> BoardKey {
        BoardKey::from_cells(&self.cells)
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    #[must_use]
    pub fn cell(&self, position: Position) -> Cell {
        self.cells[position.index()]
    }

    /// The player to move, or the player who made the final move once the game is over.
    #[must_use]
    pub fn turn(&self) -> Player {
        self.turn
    }

    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.status.outcome()
    }

    #[must_use]
    pub fn winner(&self) -> Option<Player> {
        match self.status {
            GameStatus::Won { winner, .. } => Some(winner),
            _ => None,
        }
    }

    #[must_use]
    pub fn win_line(&self) -> Option<WinLine> {
        match self.status {
            GameStatus::Won { line, .. } => Some(line),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.status.is_draw()
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.status.is_ongoing()
    }

    /// Number of marks placed so far.
    #[must_use]
    pub fn move_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_marked()).count()
    }

    /// Empty cells in row-major order.
    ///
    /// The list is not cleared on a finished board; check [`Board::is_terminal`] first.
    #[must_use]
    pub fn legal_moves(&self) -> ArrayVec<Position, CELL_COUNT> {
        Position::ALL
            .into_iter()
            .filter(|p| self.cell(*p).is_empty())
            .collect()
    }

    /// Places the mark of the player to move at `position`.
    ///
    /// Returns the token needed to revert the move with [`Board::undo`]. On error
    /// the board is left unchanged.
    pub fn apply(&mut self, position: Position) -> Result<MoveUndo, MoveError> {
        if self.is_terminal() {
            return Err(MoveError::GameOver);
        }
        if self.cell(position).is_marked() {
            return Err(MoveError::Occupied { position });
        }

        let undo = MoveUndo {
            turn: self.turn,
            status: self.status,
        };
        let mover = self.turn;
        self.cells[position.index()] = Cell::Marked(mover);

        if let Some(line) = winning_line(&self.cells, mover) {
            self.status = GameStatus::Won {
                winner: mover,
                line,
            };
        } else if self.cells.iter().all(|c| c.is_marked()) {
            self.status = GameStatus::Draw;
        } else {
            self.turn = mover.opponent();
        }

        Ok(undo)
    }

    /// Reverts the move at `position` made by the [`Board::apply`] call that returned `undo`.
    pub fn undo(&mut self, position: Position, undo: MoveUndo) {
        debug_assert!(self.cell(position).is_marked());
        self.cells[position.index()] = Cell::Empty;
        self.turn = undo.turn;
        self.status = undo.status;
    }

    /// Applies a move that is reverted when the returned guard is dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use oxo_engine::{Board, Player, Position};
    ///
    /// let mut board = Board::new();
    /// {
    ///     let mut guard = board.play(Position::CENTER).unwrap();
    ///     assert_eq!(guard.turn(), Player::O);
    ///     let inner = guard.play(Position::CORNERS[0]).unwrap();
    ///     assert_eq!(inner.move_count(), 2);
    /// }
    /// assert_eq!(board.move_count(), 0);
    /// ```
    pub fn play(&mut self, position: Position) -> Result<MoveGuard<'_>, MoveError> {
        let undo = self.apply(position)?;
        Ok(MoveGuard {
            board: self,
            position,
            undo,
        })
    }
}

fn winning_line(cells: &[Cell; CELL_COUNT], player: Player) -> Option<WinLine> {
    WinLine::ALL.into_iter().find(|line| {
        line.positions()
            .iter()
            .all(|p| cells[p.index()] == Cell::Marked(player))
    })
}

fn won(winner: Player, line: WinLine, last_mover: Player) -> Result<GameStatus, InvalidBoardError> {
    if winner != last_mover {
        return Err(InvalidBoardError::WinnerOutOfTurn { winner });
    }
    Ok(GameStatus::Won { winner, line })
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.key(), f)
    }
}

impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: BoardKey = s.parse()?;
        Self::from_key(key).map_err(ParseBoardError::Unreachable)
    }
}

/// A move applied through [`Board::play`].
///
/// Dereferences to the board so further moves can be nested; the move is reverted
/// when the guard goes out of scope.
#[derive(Debug)]
pub struct MoveGuard<'a> {
    board: &'a mut Board,
    position: Position,
    undo: MoveUndo,
}

impl MoveGuard<'_> {
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }
}

impl Deref for MoveGuard<'_> {
    type Target = Board;

    fn deref(&self) -> &Self::Target {
        self.board
    }
}

impl DerefMut for MoveGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.board
    }
}

impl Drop for MoveGuard<'_> {
    fn drop(&mut self) {
        self.board.undo(self.position, self.undo);
    }
}
