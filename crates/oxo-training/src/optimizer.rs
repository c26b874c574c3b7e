//! The generation loop of the hyperparameter search.
//!
//! [`GeneticOptimizer::run`] owns the population for a fixed number of
//! generations. Each generation it:
//!
//! 1. builds one [`EvaluationTask`] per individual that has no evaluation yet
//!    (elites carried from the previous generation keep theirs), seeding each task
//!    from the run's RNG
//! 2. evaluates the tasks on a bounded rayon pool and waits for all of them
//! 3. sorts the population, summarizes it and hands it to the
//!    [`GenerationObserver`]
//! 4. evolves the next generation with the annealed mutation rate
//!
//! Task seeds are drawn before dispatch, so a run is reproducible for a given
//! seed regardless of the number of workers.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use oxo_stats::descriptive::DescriptiveStats;
use rand::Rng;
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    EvaluationError, OptimizerError,
    chromosome::GeneRanges,
    fitness::{EvaluationOutcome, EvaluationTask, FitnessEvaluator},
    genetic::{Individual, MutationSchedule, Population, PopulationEvolver},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Individuals carried unchanged into the next generation.
    pub elite_count: usize,
    pub tournament_size: usize,
    pub mutation: MutationSchedule,
    pub ranges: GeneRanges,
    /// Size of the evaluation thread pool.
    pub workers: usize,
    /// Evaluation attempts per individual before it is marked as failed.
    pub max_attempts: u32,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 30,
            elite_count: 5,
            tournament_size: 15,
            mutation: MutationSchedule::default(),
            ranges: GeneRanges::default(),
            workers: 6,
            max_attempts: 3,
        }
    }
}

impl GeneticConfig {
    pub fn validate(&self) -> Result<(), OptimizerError> {
        let reason = if self.population_size == 0 {
            "population size must be positive"
        } else if self.generations == 0 {
            "generation count must be positive"
        } else if self.tournament_size == 0 {
            "tournament size must be positive"
        } else if self.workers == 0 {
            "worker count must be positive"
        } else if self.max_attempts == 0 {
            "at least one evaluation attempt is required"
        } else {
            return Ok(());
        };
        Err(OptimizerError::InvalidConfig { reason })
    }
}

/// Fitness summary of one evaluated generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub fitness: DescriptiveStats,
    pub best: Individual,
    /// Individuals whose every evaluation attempt failed.
    pub failed: usize,
}

/// An evaluated generation, sorted by fitness, best first.
#[derive(Debug, Clone, Copy)]
pub struct GenerationReport<'a> {
    pub generation: usize,
    pub individuals: &'a [Individual],
    pub summary: &'a GenerationSummary,
}

/// Receives every generation as soon as it is evaluated.
///
/// The run is aborted with the observer's error if it returns one.
pub trait GenerationObserver {
    type Error: From<OptimizerError>;

    fn generation_evaluated(&mut self, report: &GenerationReport<'_>) -> Result<(), Self::Error>;
}

impl GenerationObserver for () {
    type Error = OptimizerError;

    fn generation_evaluated(
        &mut self,
        _report: &GenerationReport<'_>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Fittest individual observed over the whole run.
    pub best: Individual,
    /// Generation `best` was first observed in.
    pub best_generation: usize,
    pub generations: Vec<GenerationSummary>,
}

#[derive(Debug, Clone)]
pub struct GeneticOptimizer {
    config: GeneticConfig,
}

impl GeneticOptimizer {
    #[must_use]
    pub fn new(config: GeneticConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    /// Runs the configured number of generations.
    pub fn run<E, O, R>(
        &self,
        evaluator: &E,
        observer: &mut O,
        rng: &mut R,
    ) -> Result<OptimizationResult, O::Error>
    where
        E: FitnessEvaluator + ?Sized,
        O: GenerationObserver + ?Sized,
        R: Rng + ?Sized,
    {
        let config = &self.config;
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .map_err(OptimizerError::from)?;

        tracing::info!(
            population = config.population_size,
            generations = config.generations,
            workers = config.workers,
            "starting genetic optimization"
        );

        let mut population = Population::random(config.population_size, &config.ranges, rng);
        let mut best: Option<(usize, Individual)> = None;
        let mut summaries = Vec::with_capacity(config.generations);

        for generation in 0..config.generations {
            self.evaluate_population(&pool, evaluator, &mut population, rng);

            let summary = summarize(generation, &population);
            tracing::info!(
                generation,
                best = summary.fitness.max,
                mean = summary.fitness.mean,
                std_dev = summary.fitness.std_dev,
                failed = summary.failed,
                "generation evaluated"
            );
            observer.generation_evaluated(&GenerationReport {
                generation,
                individuals: population.individuals(),
                summary: &summary,
            })?;

            if best
                .as_ref()
                .is_none_or(|(_, b)| summary.best.fitness() > b.fitness())
            {
                best = Some((generation, summary.best.clone()));
            }
            summaries.push(summary);

            if generation + 1 < config.generations {
                let evolver = PopulationEvolver {
                    elite_count: config.elite_count,
                    tournament_size: config.tournament_size,
                    mutation_rate: config.mutation.rate_at(generation, config.generations),
                    ranges: config.ranges,
                };
                population = evolver.evolve(&population, rng);
            }
        }

        let (best_generation, best) = best.expect("at least one generation should always run");
        tracing::info!(
            fitness = best.fitness(),
            generation = best_generation,
            "genetic optimization completed"
        );
        Ok(OptimizationResult {
            best,
            best_generation,
            generations: summaries,
        })
    }

    /// Evaluates every individual without an evaluation, then sorts the population.
    fn evaluate_population<E, R>(
        &self,
        pool: &ThreadPool,
        evaluator: &E,
        population: &mut Population,
        rng: &mut R,
    ) where
        E: FitnessEvaluator + ?Sized,
        R: Rng + ?Sized,
    {
        let tasks: Vec<(usize, EvaluationTask)> = population
            .individuals()
            .iter()
            .enumerate()
            .filter(|(_, ind)| ind.evaluation().is_none())
            .map(|(index, ind)| {
                let task = EvaluationTask {
                    id: ind.id(),
                    chromosome: *ind.chromosome(),
                    seed: rng.random(),
                };
                (index, task)
            })
            .collect();

        let max_attempts = self.config.max_attempts;
        let outcomes: Vec<(usize, EvaluationOutcome)> = pool.install(|| {
            tasks
                .into_par_iter()
                .map(|(index, task)| (index, evaluate_with_retry(evaluator, &task, max_attempts)))
                .collect()
        });

        let individuals = population.individuals_mut();
        for (index, outcome) in outcomes {
            individuals[index].set_evaluation(outcome);
        }
        population.sort_by_fitness();
    }
}

/// Runs `task` until an attempt succeeds, shifting the seed on every retry.
///
/// A panic inside the evaluator counts as a failed attempt.
pub fn evaluate_with_retry<E>(
    evaluator: &E,
    task: &EvaluationTask,
    max_attempts: u32,
) -> EvaluationOutcome
where
    E: FitnessEvaluator + ?Sized,
{
    for attempt in 0..max_attempts {
        let task = EvaluationTask {
            seed: task.seed.wrapping_add(u64::from(attempt)),
            ..*task
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(&task)))
            .unwrap_or_else(|payload| {
                Err(EvaluationError::Panicked {
                    message: panic_message(&*payload),
                })
            });
        match result {
            Ok(outcome) => return outcome,
            Err(err) => tracing::warn!(
                id = task.id,
                attempt = attempt + 1,
                max_attempts,
                %err,
                "evaluation attempt failed"
            ),
        }
    }
    tracing::warn!(id = task.id, "all evaluation attempts failed, assigning minimal fitness");
    EvaluationOutcome::failure()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_owned())
}

fn summarize(generation: usize, population: &Population) -> GenerationSummary {
    let fitness = DescriptiveStats::new(population.individuals().iter().map(Individual::fitness))
        .expect("population should never be empty");
    let best = population
        .best()
        .expect("population should never be empty")
        .clone();
    let failed = population
        .individuals()
        .iter()
        .filter(|ind| ind.evaluation().is_some_and(|e| e.failed))
        .count();
    GenerationSummary {
        generation,
        fitness,
        best,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use oxo_learning::MatchRecord;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use super::*;

    /// Scores a chromosome by its genes alone.
    struct GeneScore;

    impl FitnessEvaluator for GeneScore {
        fn evaluate(&self, task: &EvaluationTask) -> Result<EvaluationOutcome, EvaluationError> {
            let c = task.chromosome;
            Ok(EvaluationOutcome {
                fitness: c.alpha + c.gamma - c.reward_draw,
                record: MatchRecord::default(),
                episodes_to_convergence: Some(0),
                failed: false,
            })
        }
    }

    /// Panics for high learning rates, counting every call.
    struct Fragile {
        calls: AtomicUsize,
    }

    impl FitnessEvaluator for Fragile {
        fn evaluate(&self, task: &EvaluationTask) -> Result<EvaluationOutcome, EvaluationError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            assert!(task.chromosome.alpha < 0.5, "learning rate too high");
            GeneScore.evaluate(task)
        }
    }

    /// Fails every attempt with an even seed.
    struct OddSeedsOnly;

    impl FitnessEvaluator for OddSeedsOnly {
        fn evaluate(&self, task: &EvaluationTask) -> Result<EvaluationOutcome, EvaluationError> {
            if task.seed % 2 == 0 {
                return Err(EvaluationError::Panicked {
                    message: "even seed".to_owned(),
                });
            }
            GeneScore.evaluate(task)
        }
    }

    #[derive(Default)]
    struct Recorder {
        generations: Vec<(usize, Vec<usize>, f64)>,
    }

    impl GenerationObserver for Recorder {
        type Error = OptimizerError;

        fn generation_evaluated(
            &mut self,
            report: &GenerationReport<'_>,
        ) -> Result<(), Self::Error> {
            let ids = report.individuals.iter().map(Individual::id).collect();
            self.generations
                .push((report.generation, ids, report.summary.fitness.max));
            Ok(())
        }
    }

    fn small_config() -> GeneticConfig {
        GeneticConfig {
            population_size: 12,
            generations: 8,
            elite_count: 2,
            tournament_size: 3,
            workers: 2,
            ..GeneticConfig::default()
        }
    }

    #[test]
    fn test_elitism_keeps_best_fitness_monotonic() {
        let optimizer = GeneticOptimizer::new(small_config());
        let mut recorder = Recorder::default();
        let mut rng = Pcg64::seed_from_u64(0);
        let result = optimizer.run(&GeneScore, &mut recorder, &mut rng).unwrap();

        assert_eq!(result.generations.len(), 8);
        let maxima: Vec<_> = result.generations.iter().map(|s| s.fitness.max).collect();
        assert!(maxima.is_sorted());
        assert!((result.best.fitness() - maxima[7]).abs() < f64::EPSILON);
        assert!(result.best_generation < 8);

        assert_eq!(recorder.generations.len(), 8);
        for (generation, (observed, ids, _)) in recorder.generations.iter().enumerate() {
            assert_eq!(*observed, generation);
            assert_eq!(ids.len(), 12);
        }
    }

    #[test]
    fn test_run_is_reproducible() {
        let optimizer = GeneticOptimizer::new(small_config());
        let first = optimizer
            .run(&GeneScore, &mut (), &mut Pcg64::seed_from_u64(9))
            .unwrap();
        let single_worker = GeneticOptimizer::new(GeneticConfig {
            workers: 1,
            ..small_config()
        });
        let second = single_worker
            .run(&GeneScore, &mut (), &mut Pcg64::seed_from_u64(9))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_individuals_are_kept() {
        let evaluator = Fragile {
            calls: AtomicUsize::new(0),
        };
        let optimizer = GeneticOptimizer::new(GeneticConfig {
            population_size: 40,
            generations: 1,
            max_attempts: 2,
            ..small_config()
        });
        let mut recorder = Recorder::default();
        let mut rng = Pcg64::seed_from_u64(4);
        let result = optimizer.run(&evaluator, &mut recorder, &mut rng).unwrap();

        let summary = &result.generations[0];
        assert_eq!(summary.fitness.count, 40);
        assert!(summary.failed > 0);
        assert_eq!(recorder.generations[0].1.len(), 40);
        assert_eq!(evaluator.calls.load(Ordering::Relaxed), 40 + summary.failed);
        assert!(summary.best.chromosome().alpha < 0.5);
        assert!(!summary.best.evaluation().unwrap().failed);
    }

    #[test]
    fn test_retry_shifts_seed() {
        let task = EvaluationTask {
            id: 0,
            chromosome: crate::chromosome::Chromosome::from_genes([0.4, 0.5, 0.001, 0.2]),
            seed: 10,
        };
        let outcome = evaluate_with_retry(&OddSeedsOnly, &task, 2);
        assert!(!outcome.failed);
        assert!((outcome.fitness - 0.7).abs() < 1e-12);

        let outcome = evaluate_with_retry(&OddSeedsOnly, &task, 1);
        assert_eq!(outcome, EvaluationOutcome::failure());
    }

    #[test]
    fn test_panic_is_a_failed_attempt() {
        let evaluator = Fragile {
            calls: AtomicUsize::new(0),
        };
        let task = EvaluationTask {
            id: 5,
            chromosome: crate::chromosome::Chromosome::from_genes([0.9, 0.5, 0.001, 0.2]),
            seed: 0,
        };
        assert_eq!(evaluate_with_retry(&evaluator, &task, 3), EvaluationOutcome::failure());
        assert_eq!(evaluator.calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_invalid_config() {
        let optimizer = GeneticOptimizer::new(GeneticConfig {
            population_size: 0,
            ..GeneticConfig::default()
        });
        let mut rng = Pcg64::seed_from_u64(0);
        let err = optimizer.run(&GeneScore, &mut (), &mut rng).unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidConfig { .. }));
    }
}
