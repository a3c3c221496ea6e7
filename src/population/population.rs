//! Population type
//!
//! This module provides the Population container type. Iteration order is
//! significant: rank-based selection builds its roulette wheel in this order.

use crate::error::{EvoResult, EvolutionError};
use crate::fitness::traits::{FitnessComparator, FitnessValue, ValueFitness};
use crate::genome::traits::EvolutionaryGenome;
use crate::population::individual::Individual;

/// A population of individuals
#[derive(Clone, Debug)]
pub struct Population<G, F = ValueFitness>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// The individuals in this population
    individuals: Vec<Individual<G, F>>,
}

impl<G, F> Population<G, F>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// Create an empty population
    pub fn new() -> Self {
        Self {
            individuals: Vec::new(),
        }
    }

    /// Create a population from a vector of individuals
    pub fn from_individuals(individuals: Vec<Individual<G, F>>) -> Self {
        Self { individuals }
    }

    /// Create an unevaluated population from genomes
    pub fn from_genomes(genomes: impl IntoIterator<Item = G>) -> Self {
        genomes.into_iter().map(Individual::new).collect()
    }

    /// Get the population size
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Check if the population is empty
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Get an individual by index
    pub fn get(&self, index: usize) -> Option<&Individual<G, F>> {
        self.individuals.get(index)
    }

    /// Add an individual to the population
    pub fn push(&mut self, individual: Individual<G, F>) {
        self.individuals.push(individual);
    }

    /// Get an iterator over the individuals
    pub fn iter(&self) -> impl Iterator<Item = &Individual<G, F>> {
        self.individuals.iter()
    }

    /// Get a mutable iterator over the individuals
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Individual<G, F>> {
        self.individuals.iter_mut()
    }

    /// Get the underlying slice of individuals
    pub fn individuals(&self) -> &[Individual<G, F>] {
        &self.individuals
    }

    /// Get mutable access to the individuals
    pub fn individuals_mut(&mut self) -> &mut [Individual<G, F>] {
        &mut self.individuals
    }

    /// Check if all individuals have been evaluated
    pub fn all_evaluated(&self) -> bool {
        self.individuals.iter().all(|i| i.is_evaluated())
    }

    /// Count the number of evaluated individuals
    pub fn count_evaluated(&self) -> usize {
        self.individuals.iter().filter(|i| i.is_evaluated()).count()
    }

    /// Fitness scalars in iteration order
    ///
    /// Fails on an empty population or if any individual is unevaluated.
    pub fn fitness_values(&self) -> EvoResult<Vec<f64>> {
        if self.individuals.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }
        self.individuals
            .iter()
            .enumerate()
            .map(|(index, i)| i.fitness_f64().ok_or(EvolutionError::Unevaluated { index }))
            .collect()
    }

    /// Compute mean fitness over evaluated individuals
    pub fn mean_fitness(&self) -> Option<f64> {
        let evaluated: Vec<f64> = self.individuals.iter().filter_map(|i| i.fitness_f64()).collect();

        if evaluated.is_empty() {
            None
        } else {
            Some(evaluated.iter().sum::<f64>() / evaluated.len() as f64)
        }
    }
}

impl<G> Population<G, ValueFitness>
where
    G: EvolutionaryGenome,
{
    /// Get the best individual according to `comparator`
    pub fn best(&self, comparator: &FitnessComparator) -> Option<&Individual<G>> {
        self.individuals
            .iter()
            .filter(|i| i.is_evaluated())
            .max_by(|a, b| comparator.compare_optional(a.fitness(), b.fitness()))
    }

    /// Get the worst evaluated individual according to `comparator`
    pub fn worst(&self, comparator: &FitnessComparator) -> Option<&Individual<G>> {
        self.individuals
            .iter()
            .filter(|i| i.is_evaluated())
            .min_by(|a, b| comparator.compare_optional(a.fitness(), b.fitness()))
    }

    /// Sort the population best first; unevaluated individuals go last
    pub fn sort_by_fitness(&mut self, comparator: &FitnessComparator) {
        self.individuals
            .sort_by(|a, b| comparator.compare_optional(b.fitness(), a.fitness()));
    }

    /// Count individuals carrying the failure sentinel
    pub fn count_sentinel(&self) -> usize {
        self.individuals
            .iter()
            .filter(|i| i.fitness().is_some_and(ValueFitness::is_sentinel))
            .count()
    }
}

impl<G, F> Default for Population<G, F>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<G, F> std::ops::Index<usize> for Population<G, F>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    type Output = Individual<G, F>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.individuals[index]
    }
}

impl<G, F> IntoIterator for Population<G, F>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    type Item = Individual<G, F>;
    type IntoIter = std::vec::IntoIter<Individual<G, F>>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.into_iter()
    }
}

impl<G, F> FromIterator<Individual<G, F>> for Population<G, F>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    fn from_iter<I: IntoIterator<Item = Individual<G, F>>>(iter: I) -> Self {
        Self::from_individuals(iter.into_iter().collect())
    }
}
