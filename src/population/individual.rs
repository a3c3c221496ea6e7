//! Individual wrapper type
//!
//! This module provides the Individual type that wraps a genome with its fitness.

use serde::{Deserialize, Serialize};

use crate::fitness::traits::{FitnessValue, ValueFitness};
use crate::genome::traits::EvolutionaryGenome;

/// An individual in the population
///
/// Wraps a genome with its computed fitness value. Equality looks at the
/// genome only; two individuals with the same genome are equal whatever
/// their fitness.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Individual<G, F = ValueFitness>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// The genome of this individual
    pub genome: G,
    /// The fitness value (None if not yet evaluated)
    pub fitness: Option<F>,
}

impl<G, F> Individual<G, F>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// Create a new individual with an unevaluated genome
    pub fn new(genome: G) -> Self {
        Self {
            genome,
            fitness: None,
        }
    }

    /// Create a new individual with a known fitness
    pub fn with_fitness(genome: G, fitness: F) -> Self {
        Self {
            genome,
            fitness: Some(fitness),
        }
    }

    /// Deep copy of the genome, without the fitness
    ///
    /// Copies re-enter evaluation, so they start unevaluated.
    pub fn copy(&self) -> Self {
        Self::new(self.genome.clone())
    }

    /// Check if this individual has been evaluated
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Get the fitness value, if evaluated
    pub fn fitness(&self) -> Option<&F> {
        self.fitness.as_ref()
    }

    /// Get the fitness as f64, if evaluated
    pub fn fitness_f64(&self) -> Option<f64> {
        self.fitness.as_ref().map(FitnessValue::to_f64)
    }

    /// Set the fitness value
    pub fn set_fitness(&mut self, fitness: F) {
        self.fitness = Some(fitness);
    }

    /// Forget the fitness value
    pub fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    /// Get a reference to the genome
    pub fn genome(&self) -> &G {
        &self.genome
    }

    /// Domain-specific distance to another individual
    pub fn distance(&self, other: &Self) -> f64 {
        self.genome.distance(&other.genome)
    }
}

impl<G, F> PartialEq for Individual<G, F>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    fn eq(&self, other: &Self) -> bool {
        self.genome == other.genome
    }
}
