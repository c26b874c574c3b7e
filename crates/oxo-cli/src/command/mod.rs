use std::path::PathBuf;

use clap::{Parser, Subcommand};
use oxo_learning::{ConvergenceCheck, TrainingConfig};
use oxo_search::PerfectPlayTable;

use crate::util;

use self::{
    benchmark_search::BenchmarkSearchArg, precompute_table::PrecomputeTableArg,
    tournament::TournamentArg, train_agent::TrainAgentArg, tune::TuneArg, validate::ValidateArg,
};

mod benchmark_search;
mod precompute_table;
mod tournament;
mod train_agent;
mod tune;
mod validate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Solve every reachable position and save the perfect-play table
    PrecomputeTable(#[clap(flatten)] PrecomputeTableArg),
    /// Train a Q-learning agent against the master opponent
    TrainAgent(#[clap(flatten)] TrainAgentArg),
    /// Search learning hyperparameters with a genetic algorithm
    Tune(#[clap(flatten)] TuneArg),
    /// Repeat training with fixed hyperparameters and summarize the fitness
    Validate(#[clap(flatten)] ValidateArg),
    /// Play a trained model against the master, a random player and itself
    Tournament(#[clap(flatten)] TournamentArg),
    /// Compare minimax and alpha-beta node counts and timings
    BenchmarkSearch(#[clap(flatten)] BenchmarkSearchArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::PrecomputeTable(arg) => precompute_table::run(&arg)?,
        Mode::TrainAgent(arg) => train_agent::run(&arg)?,
        Mode::Tune(arg) => tune::run(&arg)?,
        Mode::Validate(arg) => validate::run(&arg)?,
        Mode::Tournament(arg) => tournament::run(&arg)?,
        Mode::BenchmarkSearch(arg) => benchmark_search::run(&arg)?,
    }
    Ok(())
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TableArg {
    /// Perfect-play table written by `precompute-table`; live alpha-beta search is
    /// used when the file does not exist
    #[arg(long, default_value = "perfect_play.json")]
    table: PathBuf,
}

impl TableArg {
    fn load(&self) -> anyhow::Result<Option<PerfectPlayTable>> {
        util::read_table_file(&self.table)
    }
}

/// Training settings shared by every command that trains agents.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainingArg {
    /// Probability that an episode is played against the master
    #[arg(long, default_value_t = 0.2)]
    minimax_ratio: f64,
    #[arg(long, default_value_t = 1.0)]
    start_epsilon: f64,
    #[arg(long, default_value_t = 0.01)]
    epsilon_floor: f64,
    /// Episodes between two convergence checks
    #[arg(long, default_value_t = 100)]
    check_interval: usize,
    /// Games against the master per convergence check
    #[arg(long, default_value_t = 10)]
    check_games: usize,
}

impl TrainingArg {
    fn to_config(&self, episodes: usize) -> anyhow::Result<TrainingConfig> {
        let config = TrainingConfig {
            episodes,
            minimax_ratio: self.minimax_ratio,
            start_epsilon: self.start_epsilon,
            epsilon_floor: self.epsilon_floor,
            convergence: ConvergenceCheck {
                interval: self.check_interval,
                games: self.check_games,
                ..ConvergenceCheck::default()
            },
            ..TrainingConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}
