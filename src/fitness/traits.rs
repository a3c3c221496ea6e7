//! Fitness traits
//!
//! This module defines fitness values, the run-wide comparator, and the
//! objective trait evaluated by the pipeline.

use std::cmp::Ordering;
use std::fmt::Debug;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::EvaluationError;
use crate::genome::traits::EvolutionaryGenome;

/// Optimization direction, fixed for a whole run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Higher values are better
    Maximize,
    /// Lower values are better
    Minimize,
}

impl Direction {
    /// Sentinel value worse than any real score
    ///
    /// Finite so that sentinel fitness survives serialization.
    pub fn worst(self) -> f64 {
        match self {
            Self::Maximize => f64::MIN,
            Self::Minimize => f64::MAX,
        }
    }

    /// Compare two raw scores; `Greater` means `a` is better
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            Self::Maximize => ord,
            Self::Minimize => ord.reverse(),
        }
    }

    /// Check if this is a maximization run
    pub fn is_maximize(self) -> bool {
        matches!(self, Self::Maximize)
    }
}

/// Trait bound for fitness values
///
/// Fitness values must be comparable and convertible to f64 for
/// rank-based selection. They must also be serializable.
pub trait FitnessValue:
    PartialOrd + Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static
{
    /// Convert fitness to f64 for selection
    fn to_f64(&self) -> f64;

    /// Check if this fitness is better than another
    fn is_better_than(&self, other: &Self) -> bool;

    /// Check if this fitness is worse than another
    fn is_worse_than(&self, other: &Self) -> bool {
        other.is_better_than(self)
    }
}

impl FitnessValue for f64 {
    fn to_f64(&self) -> f64 {
        *self
    }

    fn is_better_than(&self, other: &Self) -> bool {
        self > other
    }
}

/// Scalar fitness with an optimization direction
///
/// Two values are equal when their scalars are equal; identity and
/// direction do not take part in equality.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ValueFitness {
    /// The scalar score
    pub value: f64,
    /// Direction the score is compared in
    pub direction: Direction,
}

impl ValueFitness {
    /// Create a new fitness value
    pub fn new(value: f64, direction: Direction) -> Self {
        Self { value, direction }
    }

    /// Create a fitness value, rejecting NaN and infinities
    pub fn try_new(value: f64, direction: Direction) -> Result<Self, EvaluationError> {
        if value.is_finite() {
            Ok(Self::new(value, direction))
        } else {
            Err(EvaluationError::Numerical(format!(
                "fitness must be finite, got {value}"
            )))
        }
    }

    /// Worst possible fitness for the given direction
    pub fn sentinel(direction: Direction) -> Self {
        Self::new(direction.worst(), direction)
    }

    /// Check if this value is the sentinel assigned to failed evaluations
    pub fn is_sentinel(&self) -> bool {
        self.value == self.direction.worst()
    }

    /// Total comparison; `Greater` means `self` is better
    pub fn compare(&self, other: &Self) -> Ordering {
        self.direction.compare(self.value, other.value)
    }
}

impl PartialEq for ValueFitness {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for ValueFitness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl FitnessValue for ValueFitness {
    fn to_f64(&self) -> f64 {
        self.value
    }

    fn is_better_than(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Greater
    }
}

/// Run-wide fitness comparator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitnessComparator {
    direction: Direction,
}

impl FitnessComparator {
    /// Create a comparator for the given direction
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    /// Direction this comparator orders by
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Compare two fitness values; `Greater` means `a` is better
    pub fn compare(&self, a: &ValueFitness, b: &ValueFitness) -> Ordering {
        self.direction.compare(a.value, b.value)
    }

    /// Compare optional fitness values; unevaluated sorts as worst
    pub fn compare_optional(&self, a: Option<&ValueFitness>, b: Option<&ValueFitness>) -> Ordering {
        match (a, b) {
            (Some(fa), Some(fb)) => self.compare(fa, fb),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Fitness evaluation trait
///
/// Defines how to score a genome. Implementations may fail; the evaluator
/// turns failures into sentinel fitness.
pub trait Fitness: Send + Sync {
    /// The genome type being evaluated
    type Genome: EvolutionaryGenome;

    /// Reject genomes this objective cannot score
    ///
    /// Runs before the cache is consulted, so a malformed genome never
    /// picks up the score of a valid one sharing its signature.
    fn validate(&self, _genome: &Self::Genome) -> Result<(), EvaluationError> {
        Ok(())
    }

    /// Compute the raw score of a genome
    fn evaluate(&self, genome: &Self::Genome) -> Result<f64, EvaluationError>;
}

/// A simple function wrapper for fitness evaluation
pub struct FnFitness<G, F>
where
    F: Fn(&G) -> Result<f64, EvaluationError>,
{
    f: F,
    _marker: std::marker::PhantomData<fn(&G)>,
}

impl<G, F> FnFitness<G, F>
where
    F: Fn(&G) -> Result<f64, EvaluationError>,
{
    /// Create a new function-based fitness evaluator
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<G, F> Fitness for FnFitness<G, F>
where
    G: EvolutionaryGenome,
    F: Fn(&G) -> Result<f64, EvaluationError> + Send + Sync,
{
    type Genome = G;

    fn evaluate(&self, genome: &Self::Genome) -> Result<f64, EvaluationError> {
        (self.f)(genome)
    }
}
