//! Curriculum training of a [`QAgent`].
//!
//! Every episode is a full game from the empty board. With probability
//! [`TrainingConfig::minimax_ratio`] the side [`TrainingConfig::master_side`] (O by
//! default) is played by the master opponent (see [`master_policy`]); otherwise the
//! agent plays both sides.
//!
//! # Credit Assignment
//!
//! Only moves chosen by the agent are recorded. After every move, the other side's
//! last recorded move is updated:
//!
//! - with reward `0` and a bootstrap from the new position while the game goes on
//! - with its terminal reward (`+1`, [`TrainingConfig::reward_draw`] or `-1`) once the
//!   game is over
//!
//! When the game ends, the move that ended it gets its terminal reward as well.
//! Master moves never receive an update, but the agent's own value estimates still
//! bootstrap across the master's replies.
//!
//! # Convergence
//!
//! Every [`ConvergenceCheck::interval`] episodes the greedy policy plays
//! [`ConvergenceCheck::games`] games against the master. Training stops as soon as
//! it loses none of them.

use oxo_engine::{Board, BoardKey, Outcome, Player, Position};
use oxo_search::PerfectPlayTable;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    TrainingError,
    agent::QAgent,
    evaluation::evaluate_agent,
    policy::{MovePolicy, master_policy},
};

/// Early-stopping evaluation schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceCheck {
    /// Episodes between two evaluations.
    pub interval: usize,
    /// Evaluation games against the master.
    pub games: usize,
    /// No evaluation before this many episodes.
    pub min_episodes: usize,
}

impl Default for ConvergenceCheck {
    fn default() -> Self {
        Self {
            interval: 100,
            games: 10,
            min_episodes: 0,
        }
    }
}

/// Learning-curve sampling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    pub interval: usize,
    pub games: usize,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            interval: 200,
            games: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Episode budget.
    pub episodes: usize,
    /// Probability that an episode is played against the master.
    pub minimax_ratio: f64,
    /// Side played by the master in master episodes.
    pub master_side: Player,
    pub start_epsilon: f64,
    pub epsilon_floor: f64,
    /// Per-episode ε decrement; `start_epsilon / episodes` when unset.
    pub epsilon_decay: Option<f64>,
    /// Reward for a drawn game.
    pub reward_draw: f64,
    pub convergence: ConvergenceCheck,
    /// Records a learning curve when set.
    pub curve: Option<CurveConfig>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 20_000,
            minimax_ratio: 0.2,
            master_side: Player::O,
            start_epsilon: 1.0,
            epsilon_floor: 0.01,
            epsilon_decay: None,
            reward_draw: 0.5,
            convergence: ConvergenceCheck::default(),
            curve: None,
        }
    }
}

impl TrainingConfig {
    /// Checks that every probability lies in `[0, 1]` and every rate is finite.
    pub fn validate(&self) -> Result<(), TrainingError> {
        let is_probability = |p: f64| (0.0..=1.0).contains(&p);
        let reason = if !is_probability(self.minimax_ratio) {
            "minimax ratio must be within [0, 1]"
        } else if !is_probability(self.start_epsilon) || !is_probability(self.epsilon_floor) {
            "epsilon must be within [0, 1]"
        } else if self
            .epsilon_decay
            .is_some_and(|decay| !decay.is_finite() || decay < 0.0)
        {
            "epsilon decay must be finite and non-negative"
        } else if !self.reward_draw.is_finite() {
            "draw reward must be finite"
        } else {
            return Ok(());
        };
        Err(TrainingError::InvalidConfig { reason })
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn decay_per_episode(&self) -> f64 {
        self.epsilon_decay
            .unwrap_or_else(|| self.start_epsilon / self.episodes.max(1) as f64)
    }

    fn reward(&self, outcome: Outcome, player: Player) -> f64 {
        match outcome.value_for(player) {
            1 => 1.0,
            0 => self.reward_draw,
            _ => -1.0,
        }
    }
}

/// A point of the learning curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub episode: usize,
    pub non_loss_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    /// Episodes actually played.
    pub episodes_played: usize,
    /// Episodes played when the agent stopped losing to the master, or the full
    /// budget if it never did.
    pub episodes_to_convergence: usize,
    pub converged: bool,
    pub curve: Vec<CurvePoint>,
}

/// Runs training episodes against a fixed curriculum.
pub struct Trainer<'a> {
    config: TrainingConfig,
    master: Box<dyn MovePolicy + 'a>,
}

impl<'a> Trainer<'a> {
    /// Creates a trainer whose master opponent is `table`, or live alpha-beta search
    /// when no table is given.
    #[must_use]
    pub fn new(config: TrainingConfig, table: Option<&'a PerfectPlayTable>) -> Self {
        Self {
            config,
            master: master_policy(table),
        }
    }

    /// Creates a trainer with a custom master opponent.
    #[must_use]
    pub fn with_master(config: TrainingConfig, master: Box<dyn MovePolicy + 'a>) -> Self {
        Self { config, master }
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Trains `agent` for up to [`TrainingConfig::episodes`] episodes.
    ///
    /// `progress` is called with `(episode, total)` at the start of every episode.
    /// The agent's ε is left at the floor when this returns successfully.
    ///
    /// Fails with [`TrainingError::InvalidConfig`] before any episode is played if
    /// the configuration does not pass [`TrainingConfig::validate`].
    pub fn train<R>(
        &self,
        agent: &mut QAgent,
        rng: &mut R,
        mut progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<TrainingOutcome, TrainingError>
    where
        R: Rng,
    {
        let config = &self.config;
        config.validate()?;
        let total = config.episodes;
        let decay = config.decay_per_episode();
        let check = config.convergence;

        let mut board = Board::new();
        let mut outcome = TrainingOutcome {
            episodes_played: 0,
            episodes_to_convergence: total,
            converged: false,
            curve: vec![],
        };
        agent.set_epsilon(config.start_epsilon);

        for episode in 0..total {
            if let Some(progress) = &mut progress {
                progress(episode, total);
            }
            board.reset();
            agent.set_epsilon((agent.epsilon() - decay).max(config.epsilon_floor));

            let master_side = rng
                .random_bool(config.minimax_ratio)
                .then_some(config.master_side);
            self.play_episode(agent, &mut board, master_side, rng)?;

            let played = episode + 1;
            outcome.episodes_played = played;

            let curve_due = config
                .curve
                .filter(|c| c.interval > 0 && played % c.interval == 0);
            if let Some(curve) = curve_due {
                outcome.curve.push(self.curve_point(agent, curve, played, rng)?);
            }

            if check.interval > 0 && played >= check.min_episodes && played % check.interval == 0
            {
                let record = evaluate_agent(agent, self.master.as_ref(), check.games, rng)?;
                tracing::trace!(
                    episode = played,
                    wins = record.wins,
                    losses = record.losses,
                    draws = record.draws,
                    epsilon = agent.epsilon(),
                    "convergence check"
                );
                if record.losses == 0 {
                    tracing::debug!(episode = played, "converged");
                    outcome.episodes_to_convergence = played;
                    outcome.converged = true;
                    break;
                }
            }
        }

        // the last point is missing when the budget is not a multiple of the interval
        let final_point_due = config
            .curve
            .filter(|c| !outcome.converged && c.interval > 0 && total % c.interval != 0);
        if let Some(curve) = final_point_due {
            outcome.curve.push(self.curve_point(agent, curve, total, rng)?);
        }

        agent.set_epsilon(config.epsilon_floor);
        Ok(outcome)
    }

    fn curve_point<R>(
        &self,
        agent: &QAgent,
        curve: CurveConfig,
        episode: usize,
        rng: &mut R,
    ) -> Result<CurvePoint, TrainingError>
    where
        R: Rng,
    {
        let record = evaluate_agent(agent, self.master.as_ref(), curve.games, rng)?;
        Ok(CurvePoint {
            episode,
            non_loss_rate: record.non_loss_rate(),
        })
    }

    fn play_episode<R>(
        &self,
        agent: &mut QAgent,
        board: &mut Board,
        master_side: Option<Player>,
        rng: &mut R,
    ) -> Result<(), TrainingError>
    where
        R: Rng,
    {
        let mut history: [Option<(BoardKey, Position)>; 2] = [None, None];

        while !board.is_terminal() {
            let player = board.turn();
            let state = QAgent::state_key(board);
            let is_master = master_side == Some(player);
            let action = if is_master {
                self.master.propose_move(board, rng)
            } else {
                agent.choose_action(board, rng)
            }
            .ok_or(TrainingError::NoMove { player })?;

            board.apply(action).map_err(TrainingError::IllegalMove)?;
            if !is_master {
                history[player.index()] = Some((state, action));
            }

            let other = player.opponent();
            if let Some((prev_state, prev_action)) = history[other.index()] {
                match board.outcome() {
                    None => {
                        let next_moves = board.legal_moves();
                        agent.update(
                            prev_state,
                            prev_action,
                            0.0,
                            Some((QAgent::state_key(board), next_moves.as_slice())),
                            false,
                        );
                    }
                    Some(outcome) => {
                        let reward = self.config.reward(outcome, other);
                        agent.update(prev_state, prev_action, reward, None, true);
                    }
                }
            }
        }

        let last = board.turn();
        if let (Some(outcome), Some((state, action))) = (board.outcome(), history[last.index()]) {
            let reward = self.config.reward(outcome, last);
            agent.update(state, action, reward, None, true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rand::{RngCore, SeedableRng};
    use rand_pcg::Pcg64;

    use super::*;
    use crate::{
        agent::LearningParams,
        policy::{RandomPlayer, TablePlayer},
    };

    /// Counts the moves asked of the master, per side.
    struct CountingMaster<'a> {
        inner: TablePlayer<'a>,
        moves: [Cell<usize>; 2],
    }

    impl MovePolicy for &CountingMaster<'_> {
        fn propose_move(&self, board: &Board, rng: &mut dyn RngCore) -> Option<Position> {
            let counter = &self.moves[board.turn().index()];
            counter.set(counter.get() + 1);
            self.inner.propose_move(board, rng)
        }
    }

    fn table() -> PerfectPlayTable {
        PerfectPlayTable::precompute(&Board::new())
    }

    #[test]
    fn test_epsilon_ends_at_floor_after_budget() {
        let config = TrainingConfig {
            episodes: 50,
            epsilon_decay: Some(0.001),
            convergence: ConvergenceCheck {
                interval: 0,
                ..ConvergenceCheck::default()
            },
            ..TrainingConfig::default()
        };
        let trainer = Trainer::with_master(config, Box::new(RandomPlayer));
        let mut agent = QAgent::new(LearningParams::default());
        let mut rng = Pcg64::seed_from_u64(1);
        let outcome = trainer.train(&mut agent, &mut rng, None).unwrap();
        assert_eq!(outcome.episodes_played, 50);
        assert_eq!(outcome.episodes_to_convergence, 50);
        assert!(!outcome.converged);
        assert!((agent.epsilon() - 0.01).abs() < f64::EPSILON);
        assert!(!agent.table().is_empty());
    }

    #[test]
    fn test_progress_reports_every_episode() {
        let config = TrainingConfig {
            episodes: 30,
            ..TrainingConfig::default()
        };
        let trainer = Trainer::with_master(config, Box::new(RandomPlayer));
        let mut agent = QAgent::new(LearningParams::default());
        let mut rng = Pcg64::seed_from_u64(2);
        let mut seen = vec![];
        let mut progress = |episode: usize, total: usize| seen.push((episode, total));
        trainer
            .train(&mut agent, &mut rng, Some(&mut progress))
            .unwrap();
        assert_eq!(seen.len(), 30);
        assert_eq!(seen[0], (0, 30));
        assert_eq!(seen[29], (29, 30));
    }

    #[test]
    fn test_self_play_updates_both_sides() {
        let config = TrainingConfig {
            episodes: 1,
            minimax_ratio: 0.0,
            ..TrainingConfig::default()
        };
        let trainer = Trainer::with_master(config, Box::new(RandomPlayer));
        let mut agent = QAgent::new(LearningParams::default());
        let mut rng = Pcg64::seed_from_u64(3);
        trainer.train(&mut agent, &mut rng, None).unwrap();
        // every learner move of the game is updated at least once
        assert!(agent.table().len() >= 5);
        let first_moves = agent
            .table()
            .iter()
            .filter(|entry| entry.state == BoardKey::EMPTY)
            .count();
        assert_eq!(first_moves, 1);
    }

    #[test]
    fn test_master_episodes_record_learner_moves() {
        let table = table();
        let config = TrainingConfig {
            episodes: 200,
            minimax_ratio: 1.0,
            convergence: ConvergenceCheck {
                interval: 0,
                ..ConvergenceCheck::default()
            },
            ..TrainingConfig::default()
        };
        let trainer = Trainer::new(config, Some(&table));
        let mut agent = QAgent::new(LearningParams::default());
        let mut rng = Pcg64::seed_from_u64(4);
        trainer.train(&mut agent, &mut rng, None).unwrap();
        assert!(!agent.table().is_empty());
        for entry in agent.table().iter() {
            let board = Board::from_key(entry.state).unwrap();
            assert!(!board.is_terminal());
            assert!(board.cell(entry.action).is_empty());
        }
    }

    #[test]
    fn test_master_plays_designated_side_only() {
        let table = table();
        let config = TrainingConfig {
            episodes: 200,
            minimax_ratio: 1.0,
            convergence: ConvergenceCheck {
                interval: 0,
                ..ConvergenceCheck::default()
            },
            ..TrainingConfig::default()
        };
        let master = CountingMaster {
            inner: TablePlayer::new(&table),
            moves: [Cell::new(0), Cell::new(0)],
        };
        let trainer = Trainer::with_master(config, Box::new(&master));
        let mut agent = QAgent::new(LearningParams::default());
        let mut rng = Pcg64::seed_from_u64(7);
        trainer.train(&mut agent, &mut rng, None).unwrap();

        assert_eq!(master.moves[Player::X.index()].get(), 0);
        assert!(master.moves[Player::O.index()].get() >= 200);
        // the learner only ever moved as X
        for entry in agent.table().iter() {
            assert_eq!(Board::from_key(entry.state).unwrap().turn(), Player::X);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_before_training() {
        let invalid = [
            TrainingConfig {
                minimax_ratio: f64::NAN,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                minimax_ratio: 1.5,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                epsilon_floor: -0.1,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                epsilon_decay: Some(f64::INFINITY),
                ..TrainingConfig::default()
            },
            TrainingConfig {
                reward_draw: f64::NAN,
                ..TrainingConfig::default()
            },
        ];
        for config in invalid {
            assert!(config.validate().is_err());
            let trainer = Trainer::with_master(config, Box::new(RandomPlayer));
            let mut agent = QAgent::new(LearningParams::default());
            let mut rng = Pcg64::seed_from_u64(8);
            let err = trainer.train(&mut agent, &mut rng, None).unwrap_err();
            assert!(matches!(err, TrainingError::InvalidConfig { .. }));
            assert!(agent.table().is_empty());
        }
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_converges_against_master() {
        let table = table();
        let mut agent = QAgent::new(LearningParams::default());
        let mut rng = Pcg64::seed_from_u64(2024);
        // learn O against the master first, then X; X-side training leaves O states alone
        let mut outcome = None;
        for master_side in [Player::X, Player::O] {
            let config = TrainingConfig {
                episodes: 50_000,
                minimax_ratio: 1.0,
                master_side,
                convergence: ConvergenceCheck {
                    interval: 100,
                    games: 50,
                    min_episodes: 0,
                },
                ..TrainingConfig::default()
            };
            let trainer = Trainer::new(config, Some(&table));
            outcome = Some(trainer.train(&mut agent, &mut rng, None).unwrap());
        }
        let outcome = outcome.unwrap();
        assert!(outcome.converged);
        assert!(outcome.episodes_to_convergence < 50_000);
        assert_eq!(outcome.episodes_to_convergence % 100, 0);
        assert_eq!(outcome.episodes_played, outcome.episodes_to_convergence);
        assert!((agent.epsilon() - 0.01).abs() < f64::EPSILON);

        let record = evaluate_agent(&agent, &TablePlayer::new(&table), 50, &mut rng).unwrap();
        assert_eq!(record.games(), 50);
        assert_eq!(record.losses, 0);
        assert!((record.non_loss_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_learning_curve_includes_final_point() {
        let config = TrainingConfig {
            episodes: 250,
            convergence: ConvergenceCheck {
                interval: 0,
                ..ConvergenceCheck::default()
            },
            curve: Some(CurveConfig {
                interval: 100,
                games: 4,
            }),
            ..TrainingConfig::default()
        };
        let trainer = Trainer::with_master(config, Box::new(RandomPlayer));
        let mut agent = QAgent::new(LearningParams::default());
        let mut rng = Pcg64::seed_from_u64(6);
        let outcome = trainer.train(&mut agent, &mut rng, None).unwrap();
        let episodes: Vec<_> = outcome.curve.iter().map(|p| p.episode).collect();
        assert_eq!(episodes, [100, 200, 250]);
        for point in &outcome.curve {
            assert!((0.0..=1.0).contains(&point.non_loss_rate));
        }
    }
}
