use anyhow::Context;
use oxo_stats::descriptive::DescriptiveStats;
use oxo_training::{
    chromosome::Chromosome,
    fitness::{EvaluationTask, FitnessEvaluator, QLearningEvaluator},
};
use rand::Rng;

use crate::{
    command::{TableArg, TrainingArg},
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ValidateArg {
    #[clap(flatten)]
    table: TableArg,
    #[clap(flatten)]
    training: TrainingArg,
    /// Learning rate
    #[arg(long)]
    alpha: f64,
    /// Discount factor
    #[arg(long)]
    gamma: f64,
    /// Per-episode epsilon decrement
    #[arg(long)]
    decay: f64,
    /// Reward of a drawn game
    #[arg(long, default_value_t = 0.5)]
    reward_draw: f64,
    /// Training episodes per run
    #[arg(long, default_value_t = 6500)]
    episodes: usize,
    /// Games against the master per run
    #[arg(long, default_value_t = 50)]
    eval_games: usize,
    /// Number of independent runs
    #[arg(long, default_value_t = 10)]
    runs: usize,
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &ValidateArg) -> anyhow::Result<()> {
    let ValidateArg {
        table,
        training,
        alpha,
        gamma,
        decay,
        reward_draw,
        episodes,
        eval_games,
        runs,
        seed,
    } = arg;

    let table = table.load()?;
    let training = training.to_config(*episodes)?;
    let evaluator = QLearningEvaluator::new(table.as_ref(), training, *eval_games);
    let chromosome = Chromosome {
        alpha: *alpha,
        gamma: *gamma,
        decay: *decay,
        reward_draw: *reward_draw,
    };
    let mut rng = util::make_rng(*seed);

    let pb = util::progress_bar(*runs as u64, "runs");
    let mut outcomes = Vec::with_capacity(*runs);
    for id in 0..*runs {
        let task = EvaluationTask {
            id,
            chromosome,
            seed: rng.random(),
        };
        let outcome = evaluator
            .evaluate(&task)
            .with_context(|| format!("Validation run #{id} failed"))?;
        pb.println(format!(
            "  #{id:2}: fitness {:.3} (W {} / L {} / D {}, converged after {} episodes)",
            outcome.fitness,
            outcome.record.wins,
            outcome.record.losses,
            outcome.record.draws,
            outcome.episodes_to_convergence.unwrap_or(*episodes)
        ));
        outcomes.push(outcome);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let fitness = DescriptiveStats::new(outcomes.iter().map(|o| o.fitness))
        .context("at least one validation run is required")?;
    let perfect = outcomes.iter().filter(|o| o.record.losses == 0).count();

    eprintln!(
        "Validation of α={alpha:.3} γ={gamma:.3} decay={decay:.4} r_draw={reward_draw:.2} ({runs} runs)"
    );
    eprintln!("  Fitness Stats:");
    eprintln!("    Mean:   {:.3}", fitness.mean);
    eprintln!("    Stddev: {:.3}", fitness.std_dev);
    eprintln!("    Min:    {:.3}", fitness.min);
    eprintln!("    Max:    {:.3}", fitness.max);
    eprintln!("  Runs without a loss: {perfect}/{runs}");

    Ok(())
}
