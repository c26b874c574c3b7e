//! Hyperparameter chromosomes and their genetic operators.
//!
//! A [`Chromosome`] is a fixed vector of [`GENE_COUNT`] real-valued genes, in this
//! order: learning rate α, discount γ, per-episode ε decay, draw reward. Every
//! gene lives in its own closed interval given by [`GeneRanges`], and every
//! operator here keeps it there:
//!
//! - [`Chromosome::random`] samples each gene uniformly in its range
//! - [`Chromosome::crossover`] is single-point: a prefix from one parent and the
//!   suffix from the other, so every gene is copied from an in-range parent
//! - [`Chromosome::mutate`] replaces a gene by a fresh uniform sample in its range

use oxo_learning::{LearningParams, TrainingConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of genes in a [`Chromosome`].
pub const GENE_COUNT: usize = 4;

/// Closed interval a gene is sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneRange {
    pub min: f64,
    pub max: f64,
}

impl GeneRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn sample<R>(&self, rng: &mut R) -> f64
    where
        R: Rng + ?Sized,
    {
        if self.min >= self.max {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }
}

/// Sampling interval of every gene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneRanges {
    pub alpha: GeneRange,
    pub gamma: GeneRange,
    pub decay: GeneRange,
    pub reward_draw: GeneRange,
}

impl Default for GeneRanges {
    fn default() -> Self {
        Self {
            alpha: GeneRange::new(0.01, 0.99),
            gamma: GeneRange::new(0.01, 0.99),
            decay: GeneRange::new(0.0001, 0.01),
            reward_draw: GeneRange::new(0.0, 1.0),
        }
    }
}

impl GeneRanges {
    /// Ranges in gene order.
    #[must_use]
    pub fn to_array(&self) -> [GeneRange; GENE_COUNT] {
        [self.alpha, self.gamma, self.decay, self.reward_draw]
    }

    #[must_use]
    pub fn contains(&self, chromosome: &Chromosome) -> bool {
        self.to_array()
            .iter()
            .zip(chromosome.genes())
            .all(|(range, gene)| range.contains(gene))
    }
}

/// Hyperparameters of one training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    /// Learning rate α.
    pub alpha: f64,
    /// Discount factor γ.
    pub gamma: f64,
    /// Per-episode ε decrement.
    pub decay: f64,
    /// Reward of a drawn game.
    pub reward_draw: f64,
}

impl Chromosome {
    #[must_use]
    pub const fn from_genes(genes: [f64; GENE_COUNT]) -> Self {
        let [alpha, gamma, decay, reward_draw] = genes;
        Self {
            alpha,
            gamma,
            decay,
            reward_draw,
        }
    }

    #[must_use]
    pub const fn genes(&self) -> [f64; GENE_COUNT] {
        [self.alpha, self.gamma, self.decay, self.reward_draw]
    }

    pub fn random<R>(ranges: &GeneRanges, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::from_genes(ranges.to_array().map(|range| range.sample(rng)))
    }

    /// Single-point crossover.
    ///
    /// The cut point is uniform in `1..GENE_COUNT`; genes before it come from
    /// `self`, the rest from `other`.
    pub fn crossover<R>(&self, other: &Self, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let cut = rng.random_range(1..GENE_COUNT);
        let first = self.genes();
        let second = other.genes();
        Self::from_genes(std::array::from_fn(|i| {
            if i < cut { first[i] } else { second[i] }
        }))
    }

    /// Replaces each gene, with probability `rate`, by a fresh sample of its range.
    pub fn mutate<R>(&mut self, ranges: &GeneRanges, rate: f64, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let rate = rate.clamp(0.0, 1.0);
        let mut genes = self.genes();
        for (gene, range) in genes.iter_mut().zip(ranges.to_array()) {
            if rng.random_bool(rate) {
                *gene = range.sample(rng);
            }
        }
        *self = Self::from_genes(genes);
    }

    #[must_use]
    pub fn learning_params(&self) -> LearningParams {
        LearningParams {
            alpha: self.alpha,
            gamma: self.gamma,
        }
    }

    /// `base` with this chromosome's ε decay and draw reward.
    #[must_use]
    pub fn training_config(&self, base: &TrainingConfig) -> TrainingConfig {
        TrainingConfig {
            epsilon_decay: Some(self.decay),
            reward_draw: self.reward_draw,
            ..base.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use super::*;

    #[test]
    fn test_random_within_ranges() {
        let ranges = GeneRanges::default();
        let mut rng = Pcg64::seed_from_u64(0);
        for _ in 0..1000 {
            assert!(ranges.contains(&Chromosome::random(&ranges, &mut rng)));
        }
    }

    #[test]
    fn test_crossover_takes_prefix_and_suffix() {
        let ranges = GeneRanges::default();
        let mut rng = Pcg64::seed_from_u64(1);
        let a = Chromosome::from_genes([0.1, 0.2, 0.001, 0.3]);
        let b = Chromosome::from_genes([0.9, 0.8, 0.009, 0.7]);
        let mut cuts = [false; GENE_COUNT];
        for _ in 0..200 {
            let child = a.crossover(&b, &mut rng);
            assert!(ranges.contains(&child));
            let genes = child.genes();
            let cut = (0..GENE_COUNT)
                .find(|&i| genes[i] == b.genes()[i])
                .unwrap();
            assert!((1..GENE_COUNT).contains(&cut));
            assert_eq!(genes[..cut], a.genes()[..cut]);
            assert_eq!(genes[cut..], b.genes()[cut..]);
            cuts[cut] = true;
        }
        assert_eq!(cuts, [false, true, true, true]);
    }

    #[test]
    fn test_mutation_stays_in_range() {
        let ranges = GeneRanges::default();
        let mut rng = Pcg64::seed_from_u64(2);
        let mut chromosome = Chromosome::random(&ranges, &mut rng);
        for _ in 0..1000 {
            chromosome.mutate(&ranges, 1.0, &mut rng);
            assert!(ranges.contains(&chromosome));
        }
    }

    #[test]
    fn test_zero_rate_never_mutates() {
        let ranges = GeneRanges::default();
        let mut rng = Pcg64::seed_from_u64(3);
        let original = Chromosome::random(&ranges, &mut rng);
        let mut chromosome = original;
        for _ in 0..100 {
            chromosome.mutate(&ranges, 0.0, &mut rng);
        }
        assert_eq!(chromosome, original);
    }

    #[test]
    fn test_training_config_overrides() {
        let chromosome = Chromosome::from_genes([0.3, 0.6, 0.004, 0.25]);
        let base = TrainingConfig::default();
        let config = chromosome.training_config(&base);
        assert_eq!(config.epsilon_decay, Some(0.004));
        assert!((config.reward_draw - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.episodes, base.episodes);
        assert_eq!(
            chromosome.learning_params(),
            LearningParams {
                alpha: 0.3,
                gamma: 0.6
            }
        );
    }
}
