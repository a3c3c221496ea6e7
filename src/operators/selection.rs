//! Selection operators
//!
//! Roulette wheel selection over a distribution computed from the fitness
//! scalars of an evaluated population, taken in iteration order.

use crate::error::{EvoResult, OperatorError};
use crate::fitness::traits::FitnessValue;
use crate::genome::traits::EvolutionaryGenome;
use crate::operators::traits::{RandomSource, SelectionOperator};
use crate::population::population::Population;

/// Normalized cumulative selection distribution
///
/// Entry `k` is the probability mass of individuals `0..=k`; the last entry
/// is 1.0.
#[derive(Clone, Debug, PartialEq)]
pub struct RouletteWheel {
    cumulative: Vec<f64>,
}

impl RouletteWheel {
    /// Build a wheel by accumulating `weights` in order and normalizing
    pub fn from_weights<I>(weights: I) -> Result<Self, OperatorError>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut acc = 0.0;
        let mut cumulative = Vec::new();
        for w in weights {
            if !w.is_finite() || w < 0.0 {
                return Err(OperatorError::InvalidConfiguration(format!(
                    "invalid roulette weight {w}"
                )));
            }
            acc += w;
            cumulative.push(acc);
        }
        if cumulative.is_empty() {
            return Err(OperatorError::SelectionFailed(
                "cannot build a roulette wheel for an empty population".to_string(),
            ));
        }
        if !acc.is_finite() || acc <= 0.0 {
            return Err(OperatorError::SelectionFailed(format!(
                "roulette weights sum to {acc}"
            )));
        }
        for c in &mut cumulative {
            *c /= acc;
        }
        Ok(Self { cumulative })
    }

    /// Wheel giving every one of `n` individuals the same slice
    pub fn uniform(n: usize) -> Result<Self, OperatorError> {
        Self::from_weights(std::iter::repeat(1.0).take(n))
    }

    /// The normalized cumulative array
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Number of slices
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    /// Always false; a wheel has at least one slice
    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Index of the first slice whose cumulative value exceeds `u`
    ///
    /// Falls back to the last index when rounding leaves no entry above `u`.
    pub fn sample(&self, u: f64) -> usize {
        let idx = self.cumulative.partition_point(|&c| c <= u);
        idx.min(self.cumulative.len() - 1)
    }

    /// Draw one index
    pub fn spin<R: RandomSource + ?Sized>(&self, rng: &mut R) -> usize {
        self.sample(rng.next_f64())
    }

    /// Draw `count` indices with replacement
    pub fn spin_many<R: RandomSource + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<usize> {
        (0..count).map(|_| self.spin(rng)).collect()
    }

    /// Per-individual selection probabilities
    pub fn probabilities(&self) -> Vec<f64> {
        let mut prev = 0.0;
        self.cumulative
            .iter()
            .map(|&c| {
                let p = c - prev;
                prev = c;
                p
            })
            .collect()
    }
}

/// Turns fitness scalars into a roulette wheel
pub trait DistributionStrategy: Send + Sync {
    /// Compute the wheel for `fitness`, given in population iteration order
    fn compute_distribution(&self, fitness: &[f64]) -> Result<RouletteWheel, OperatorError>;
}

fn check_finite(fitness: &[f64]) -> Result<(), OperatorError> {
    if fitness.is_empty() {
        return Err(OperatorError::SelectionFailed(
            "no fitness values to select from".to_string(),
        ));
    }
    match fitness.iter().position(|f| !f.is_finite()) {
        Some(k) => Err(OperatorError::SelectionFailed(format!(
            "fitness of individual {k} is {}",
            fitness[k]
        ))),
        None => Ok(()),
    }
}

/// Non-linear hierarchical ranking
///
/// Individual `k` gets the rank of the first sorted position equal to its
/// fitness, so tied values share the lowest rank. Rank `r` weighs
/// `p * (1 - p)^r` with `p = 0.3`; rank 0 is the lowest fitness value.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonLinearRanking;

impl NonLinearRanking {
    /// Precision factor `p`
    pub const PRECISION_FACTOR: f64 = 0.3;

    pub fn new() -> Self {
        Self
    }

    /// Rank of each individual, in iteration order
    pub fn ranks(fitness: &[f64]) -> Vec<usize> {
        let mut sorted = fitness.to_vec();
        sorted.sort_by(f64::total_cmp);
        fitness
            .iter()
            .map(|&f| sorted.partition_point(|&s| s < f))
            .collect()
    }

    /// Weight of `rank`
    pub fn weight(rank: usize) -> f64 {
        let p = Self::PRECISION_FACTOR;
        p * (1.0 - p).powi(rank as i32)
    }
}

impl DistributionStrategy for NonLinearRanking {
    fn compute_distribution(&self, fitness: &[f64]) -> Result<RouletteWheel, OperatorError> {
        check_finite(fitness)?;
        let n = fitness.len() as f64;
        RouletteWheel::from_weights(
            Self::ranks(fitness)
                .into_iter()
                .map(|rank| Self::weight(rank) * n),
        )
    }
}

/// Fitness proportionate distribution
///
/// Negative fitness shifts every value by `1 - min`. Degenerate totals fall
/// back to a uniform wheel.
#[derive(Clone, Copy, Debug, Default)]
pub struct FitnessProportional;

impl FitnessProportional {
    pub fn new() -> Self {
        Self
    }
}

impl DistributionStrategy for FitnessProportional {
    fn compute_distribution(&self, fitness: &[f64]) -> Result<RouletteWheel, OperatorError> {
        check_finite(fitness)?;
        let min = fitness.iter().copied().fold(f64::INFINITY, f64::min);
        let offset = if min < 0.0 { 1.0 - min } else { 0.0 };

        let total: f64 = fitness.iter().map(|f| f + offset).sum();
        if !total.is_finite() || total <= 0.0 {
            return RouletteWheel::uniform(fitness.len());
        }
        RouletteWheel::from_weights(fitness.iter().map(|f| f + offset))
    }
}

/// Roulette wheel selection
///
/// Builds the wheel from the population once per selection event and draws
/// from it with replacement.
#[derive(Clone, Debug, Default)]
pub struct RouletteSelection<D = NonLinearRanking> {
    strategy: D,
}

impl RouletteSelection<NonLinearRanking> {
    /// Rank-based roulette selection
    pub fn ranked() -> Self {
        Self::new(NonLinearRanking)
    }
}

impl<D: DistributionStrategy> RouletteSelection<D> {
    pub fn new(strategy: D) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &D {
        &self.strategy
    }

    /// The wheel for the current population
    pub fn distribution<G, F>(&self, population: &Population<G, F>) -> EvoResult<RouletteWheel>
    where
        G: EvolutionaryGenome,
        F: FitnessValue,
    {
        let fitness = population.fitness_values()?;
        let wheel = self.strategy.compute_distribution(&fitness)?;
        log::trace!("roulette wheel: {:?}", wheel.cumulative());
        Ok(wheel)
    }
}

impl<G, F, D> SelectionOperator<G, F> for RouletteSelection<D>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
    D: DistributionStrategy,
{
    fn select<R: RandomSource + ?Sized>(
        &self,
        population: &Population<G, F>,
        rng: &mut R,
    ) -> EvoResult<usize> {
        Ok(self.distribution(population)?.spin(rng))
    }

    fn select_many<R: RandomSource + ?Sized>(
        &self,
        population: &Population<G, F>,
        count: usize,
        rng: &mut R,
    ) -> EvoResult<Vec<usize>> {
        Ok(self.distribution(population)?.spin_many(count, rng))
    }
}
