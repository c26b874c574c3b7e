//! Population and reproduction operators of the genetic algorithm.
//!
//! # Key Components
//!
//! - [`Individual`] - a chromosome with its evaluation, once it has one
//! - [`Population`] - one generation of individuals
//! - [`PopulationEvolver`] - builds the next generation (elitism, tournament
//!   selection, crossover and mutation)
//! - [`MutationSchedule`] - linear annealing of the mutation rate
//!
//! # Genetic Operators
//!
//! ## Tournament Selection
//!
//! Draw `tournament_size` individuals uniformly at random (with replacement) and
//! keep the fittest. Larger tournaments mean stronger selection pressure.
//!
//! ## Elitism
//!
//! The top `elite_count` individuals are carried over unchanged, evaluation
//! included, so they are never retrained and the best fitness of a run can only
//! go up from one generation to the next.
//!
//! ## Identifiers
//!
//! Individuals are numbered `0..len` within each generation; ids are reassigned
//! when a new generation is built.

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    chromosome::{Chromosome, GeneRanges},
    fitness::EvaluationOutcome,
};

/// A candidate chromosome within a generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    id: usize,
    chromosome: Chromosome,
    evaluation: Option<EvaluationOutcome>,
}

impl Individual {
    #[must_use]
    pub fn new(id: usize, chromosome: Chromosome) -> Self {
        Self {
            id,
            chromosome,
            evaluation: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    #[must_use]
    pub fn evaluation(&self) -> Option<&EvaluationOutcome> {
        self.evaluation.as_ref()
    }

    /// Returns the fitness score, `f64::MIN` until the individual is evaluated.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.evaluation.as_ref().map_or(f64::MIN, |e| e.fitness)
    }

    pub(crate) fn set_evaluation(&mut self, outcome: EvaluationOutcome) {
        self.evaluation = Some(outcome);
    }
}

/// One generation of individuals.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// Creates `count` unevaluated individuals with random chromosomes.
    #[must_use]
    pub fn random<R>(count: usize, ranges: &GeneRanges, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let individuals = (0..count)
            .map(|id| Individual::new(id, Chromosome::random(ranges, rng)))
            .collect();
        Self { individuals }
    }

    #[must_use]
    pub fn from_individuals(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub(crate) fn individuals_mut(&mut self) -> &mut [Individual] {
        &mut self.individuals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Sorts by fitness, best first. Equal fitness keeps the current order.
    pub fn sort_by_fitness(&mut self) {
        self.individuals
            .sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
    }

    /// The fittest individual, the first one among equals.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .reduce(|best, ind| if ind.fitness() > best.fitness() { ind } else { best })
    }
}

/// Linearly annealed per-gene mutation probability.
///
/// The rate at generation `g` of `G` is
/// `max(end_rate, start_rate - (start_rate - end_rate) * g / G)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationSchedule {
    pub start_rate: f64,
    pub end_rate: f64,
}

impl Default for MutationSchedule {
    fn default() -> Self {
        Self {
            start_rate: 0.10,
            end_rate: 0.01,
        }
    }
}

impl MutationSchedule {
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn rate_at(&self, generation: usize, generations: usize) -> f64 {
        let progress = generation as f64 / generations.max(1) as f64;
        let rate = self.start_rate - (self.start_rate - self.end_rate) * progress;
        rate.max(self.end_rate)
    }
}

/// Builds the next generation from an evaluated one.
#[derive(Debug, Clone)]
pub struct PopulationEvolver {
    /// Number of top individuals preserved unchanged
    pub elite_count: usize,
    /// Tournament size for selection (larger = stronger selection pressure)
    pub tournament_size: usize,
    /// Probability of resampling each gene of a child
    pub mutation_rate: f64,
    pub ranges: GeneRanges,
}

impl PopulationEvolver {
    /// Evolves the population to create the next generation.
    ///
    /// 1. Preserves the top `elite_count` individuals with their evaluations
    /// 2. Fills the remaining slots with mutated crossovers of tournament winners
    /// 3. Renumbers every individual sequentially
    ///
    /// # Panics
    ///
    /// Panics if `population` is empty or not sorted by fitness, best first.
    #[must_use]
    pub fn evolve<R>(&self, population: &Population, rng: &mut R) -> Population
    where
        R: Rng + ?Sized,
    {
        assert!(!population.is_empty(), "cannot evolve an empty population");
        assert!(
            population
                .individuals
                .is_sorted_by(|a, b| a.fitness() >= b.fitness()),
            "population must be sorted by fitness"
        );

        let size = population.len();
        let elite_count = self.elite_count.min(size);
        let mut next_individuals = Vec::with_capacity(size);

        // elite selection
        next_individuals.extend(population.individuals[..elite_count].iter().cloned());

        // generate the rest individuals
        while next_individuals.len() < size {
            let p1 = tournament_select(&population.individuals, self.tournament_size, rng);
            let p2 = tournament_select(&population.individuals, self.tournament_size, rng);
            let mut child = p1.chromosome.crossover(&p2.chromosome, rng);
            child.mutate(&self.ranges, self.mutation_rate, rng);
            next_individuals.push(Individual::new(0, child));
        }

        for (id, ind) in next_individuals.iter_mut().enumerate() {
            ind.id = id;
        }
        Population {
            individuals: next_individuals,
        }
    }
}

/// Draws `tournament_size` individuals uniformly with replacement and returns the
/// fittest, the earliest drawn among equals.
fn tournament_select<'a, R>(
    population: &'a [Individual],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Individual
where
    R: Rng + ?Sized,
{
    let mut best = population
        .choose(rng)
        .expect("tournament population should never be empty");
    for _ in 1..tournament_size {
        let candidate = population
            .choose(rng)
            .expect("tournament population should never be empty");
        if candidate.fitness() > best.fitness() {
            best = candidate;
        }
    }
    best
}
