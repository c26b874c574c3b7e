use oxo_engine::{Board, Outcome, Player};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    TrainingError,
    agent::QAgent,
    policy::{LearningPlayer, MovePolicy},
};

/// Results of a series of games from the evaluated player's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
}

impl MatchRecord {
    #[must_use]
    pub fn games(&self) -> usize {
        self.wins + self.losses + self.draws
    }

    /// Fraction of games not lost, `0.0` when no game was played.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn non_loss_rate(&self) -> f64 {
        let games = self.games();
        if games == 0 {
            return 0.0;
        }
        (self.wins + self.draws) as f64 / games as f64
    }

    pub fn record(&mut self, outcome: Outcome, player: Player) {
        match outcome.value_for(player) {
            1 => self.wins += 1,
            0 => self.draws += 1,
            _ => self.losses += 1,
        }
    }
}

/// Results of a greedy agent playing itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfPlayRecord {
    pub first_wins: usize,
    pub second_wins: usize,
    pub draws: usize,
}

/// Plays one game from the empty board, `first` playing X.
pub fn play_match<R>(
    first: &dyn MovePolicy,
    second: &dyn MovePolicy,
    rng: &mut R,
) -> Result<Outcome, TrainingError>
where
    R: Rng,
{
    let mut board = Board::new();
    loop {
        if let Some(outcome) = board.outcome() {
            return Ok(outcome);
        }
        let player = board.turn();
        let policy = match player {
            Player::X => first,
            Player::O => second,
        };
        let position = policy
            .propose_move(&board, rng)
            .ok_or(TrainingError::NoMove { player })?;
        board.apply(position).map_err(TrainingError::IllegalMove)?;
    }
}

/// Plays `games` games of the agent, without exploration, against `opponent`.
///
/// The agent moves first in even-numbered games and second in odd-numbered ones.
pub fn evaluate_agent<R>(
    agent: &QAgent,
    opponent: &dyn MovePolicy,
    games: usize,
    rng: &mut R,
) -> Result<MatchRecord, TrainingError>
where
    R: Rng,
{
    let learner = LearningPlayer::greedy(agent);
    let mut record = MatchRecord::default();
    for game in 0..games {
        let (outcome, side) = if game % 2 == 0 {
            (play_match(&learner, opponent, rng)?, Player::X)
        } else {
            (play_match(opponent, &learner, rng)?, Player::O)
        };
        record.record(outcome, side);
    }
    Ok(record)
}

/// Plays the greedy agent against itself `games` times.
pub fn evaluate_self_play<R>(
    agent: &QAgent,
    games: usize,
    rng: &mut R,
) -> Result<SelfPlayRecord, TrainingError>
where
    R: Rng,
{
    let learner = LearningPlayer::greedy(agent);
    let mut record = SelfPlayRecord::default();
    for _ in 0..games {
        match play_match(&learner, &learner, rng)? {
            Outcome::Winner(Player::X) => record.first_wins += 1,
            Outcome::Winner(Player::O) => record.second_wins += 1,
            Outcome::Draw => record.draws += 1,
        }
    }
    Ok(record)
}
