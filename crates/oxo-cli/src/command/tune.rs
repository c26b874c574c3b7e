use std::{fs::File, path::PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use oxo_training::{
    chromosome::GeneRanges,
    fitness::{EvaluationOutcome, QLearningEvaluator},
    genetic::{Individual, MutationSchedule},
    optimizer::{
        GenerationObserver, GenerationReport, GenerationSummary, GeneticConfig, GeneticOptimizer,
    },
};
use serde::{Deserialize, Serialize};

use crate::{
    command::{TableArg, TrainingArg},
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TuneArg {
    #[clap(flatten)]
    table: TableArg,
    #[clap(flatten)]
    training: TrainingArg,
    /// Training episodes per individual
    #[arg(long, default_value_t = 6500)]
    episodes: usize,
    /// Games against the master per individual
    #[arg(long, default_value_t = 50)]
    eval_games: usize,
    #[arg(long, default_value_t = 50)]
    population: usize,
    #[arg(long, default_value_t = 30)]
    generations: usize,
    /// Individuals carried unchanged into the next generation
    #[arg(long, default_value_t = 5)]
    elites: usize,
    #[arg(long, default_value_t = 15)]
    tournament_size: usize,
    #[arg(long, default_value_t = 0.10)]
    mutation_start: f64,
    #[arg(long, default_value_t = 0.01)]
    mutation_end: f64,
    /// Evaluation worker threads
    #[arg(long, default_value_t = 6)]
    workers: usize,
    /// Evaluation attempts before an individual is marked as failed
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,
    /// Fitness report (CSV), appended after every generation
    #[arg(long, default_value = "genetic_results.csv")]
    report: PathBuf,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct TuneResult {
    finished_at: DateTime<Utc>,
    config: GeneticConfig,
    best_generation: usize,
    best: Individual,
    generations: Vec<GenerationSummary>,
}

/// One row of the fitness report.
#[derive(Debug, Clone, Serialize)]
struct FitnessRow {
    generation: usize,
    id: usize,
    alpha: f64,
    gamma: f64,
    decay: f64,
    reward_draw: f64,
    fitness: f64,
    wins: usize,
    losses: usize,
    draws: usize,
    episodes_to_convergence: Option<usize>,
    failed: bool,
}

impl FitnessRow {
    fn new(generation: usize, individual: &Individual) -> Self {
        let chromosome = individual.chromosome();
        let evaluation = individual
            .evaluation()
            .copied()
            .unwrap_or_else(EvaluationOutcome::failure);
        Self {
            generation,
            id: individual.id(),
            alpha: chromosome.alpha,
            gamma: chromosome.gamma,
            decay: chromosome.decay,
            reward_draw: chromosome.reward_draw,
            fitness: evaluation.fitness,
            wins: evaluation.record.wins,
            losses: evaluation.record.losses,
            draws: evaluation.record.draws,
            episodes_to_convergence: evaluation.episodes_to_convergence,
            failed: evaluation.failed,
        }
    }
}

struct FitnessReport {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl GenerationObserver for FitnessReport {
    type Error = anyhow::Error;

    fn generation_evaluated(&mut self, report: &GenerationReport<'_>) -> anyhow::Result<()> {
        let GenerationReport {
            generation,
            individuals,
            summary,
        } = *report;

        eprintln!("Generation #{generation}:");
        for ind in individuals {
            let c = ind.chromosome();
            let failed = if ind.evaluation().is_some_and(|e| e.failed) {
                " (failed)"
            } else {
                ""
            };
            eprintln!(
                "  {:2}: α={:.3} γ={:.3} decay={:.4} r_draw={:.2} => {:.3}{failed}",
                ind.id(),
                c.alpha,
                c.gamma,
                c.decay,
                c.reward_draw,
                ind.fitness()
            );
            self.writer
                .serialize(FitnessRow::new(generation, ind))
                .with_context(|| {
                    format!("Failed to write fitness report: {}", self.path.display())
                })?;
        }
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush fitness report: {}", self.path.display()))?;

        eprintln!("  Fitness Stats:");
        eprintln!("    Min:    {:.3}", summary.fitness.min);
        eprintln!("    Max:    {:.3}", summary.fitness.max);
        eprintln!("    Mean:   {:.3}", summary.fitness.mean);
        eprintln!("    Stddev: {:.3}", summary.fitness.std_dev);
        Ok(())
    }
}

pub(crate) fn run(arg: &TuneArg) -> anyhow::Result<()> {
    let TuneArg {
        table,
        training,
        episodes,
        eval_games,
        population,
        generations,
        elites,
        tournament_size,
        mutation_start,
        mutation_end,
        workers,
        max_attempts,
        report,
        output,
        seed,
    } = arg;

    let table = table.load()?;
    let training = training.to_config(*episodes)?;
    let evaluator = QLearningEvaluator::new(table.as_ref(), training, *eval_games);
    let config = GeneticConfig {
        population_size: *population,
        generations: *generations,
        elite_count: *elites,
        tournament_size: *tournament_size,
        mutation: MutationSchedule {
            start_rate: *mutation_start,
            end_rate: *mutation_end,
        },
        ranges: GeneRanges::default(),
        workers: *workers,
        max_attempts: *max_attempts,
    };
    let optimizer = GeneticOptimizer::new(config.clone());

    let mut observer = FitnessReport {
        writer: util::append_csv(report)?,
        path: report.clone(),
    };
    let mut rng = util::make_rng(*seed);
    let result = optimizer.run(&evaluator, &mut observer, &mut rng)?;

    let best = &result.best;
    let c = best.chromosome();
    eprintln!();
    eprintln!("Best individual (generation #{}):", result.best_generation);
    eprintln!("  Fitness: {:.3}", best.fitness());
    eprintln!(
        "  α={:.3} γ={:.3} decay={:.4} r_draw={:.2}",
        c.alpha, c.gamma, c.decay, c.reward_draw
    );
    if let Some(episodes) = best.evaluation().and_then(|e| e.episodes_to_convergence) {
        eprintln!("  Episodes to convergence: {episodes}");
    }

    let tune_result = TuneResult {
        finished_at: Utc::now(),
        config,
        best_generation: result.best_generation,
        best: result.best,
        generations: result.generations,
    };
    Output::save_json(&tune_result, output.clone())?;

    eprintln!();
    eprintln!("Fitness report: {}", report.display());
    if let Some(path) = &output {
        eprintln!("Result saved to {}", path.display());
    }

    Ok(())
}
