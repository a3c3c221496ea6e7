//! Parallel memoized evaluation
//!
//! Scores every individual of a population, consulting the run-wide fitness
//! cache first. Individuals are independent tasks; with the `parallel`
//! feature they are spread over the rayon thread pool.

use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::EnsembleConfig;
use crate::error::{EvaluationError, Signature};
use crate::fitness::cache::{CacheLookup, FitnessCache};
use crate::fitness::traits::{Direction, Fitness, ValueFitness};
use crate::genome::traits::CanonicalSignature;
use crate::population::individual::Individual;
use crate::population::population::Population;

/// A failed evaluation, recorded instead of propagated
#[derive(Clone, Debug, PartialEq)]
pub struct IndividualFailure {
    /// Position of the individual in the population
    pub index: usize,
    /// Canonical signature of its genome
    pub signature: Signature,
    /// What went wrong
    pub error: EvaluationError,
}

/// Summary of one evaluation pass
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluationReport {
    /// Individuals that received a fitness (always the population size)
    pub evaluated: usize,
    /// Scores taken from the cache
    pub cache_hits: usize,
    /// Scores computed in this pass
    pub computed: usize,
    /// Individuals that received the sentinel fitness
    pub failures: Vec<IndividualFailure>,
}

impl EvaluationReport {
    /// Returns true if no individual failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Outcome {
    Scored(CacheLookup<f64>),
    Failed(IndividualFailure),
}

/// Evaluates populations against a cached objective
pub struct ParallelEvaluator<Fit>
where
    Fit: Fitness,
    Fit::Genome: CanonicalSignature,
{
    fitness: Fit,
    cache: Arc<FitnessCache>,
    direction: Direction,
    parallel: bool,
}

impl<Fit> ParallelEvaluator<Fit>
where
    Fit: Fitness,
    Fit::Genome: CanonicalSignature,
{
    /// Create an evaluator sharing `cache` for the lifetime of the run
    pub fn new(fitness: Fit, cache: Arc<FitnessCache>, direction: Direction) -> Self {
        Self {
            fitness,
            cache,
            direction,
            parallel: true,
        }
    }

    /// Create an evaluator using the direction and parallelism of `config`
    pub fn from_config(config: &EnsembleConfig, fitness: Fit, cache: Arc<FitnessCache>) -> Self {
        Self::new(fitness, cache, config.direction).with_parallelism(config.parallel)
    }

    /// Enable or disable parallel evaluation
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The shared fitness cache
    pub fn cache(&self) -> &Arc<FitnessCache> {
        &self.cache
    }

    /// The run's optimization direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The wrapped objective
    pub fn fitness(&self) -> &Fit {
        &self.fitness
    }

    /// Score a single genome through the cache
    pub fn score(&self, genome: &Fit::Genome) -> Result<CacheLookup<f64>, EvaluationError> {
        let signature = genome.signature();
        self.score_with_signature(&signature, genome)
    }

    fn score_with_signature(
        &self,
        signature: &str,
        genome: &Fit::Genome,
    ) -> Result<CacheLookup<f64>, EvaluationError> {
        self.fitness.validate(genome)?;
        self.cache.get_or_try_compute(signature, || {
            let score = self.fitness.evaluate(genome)?;
            ValueFitness::try_new(score, self.direction).map(|f| f.value)
        })
    }

    fn evaluate_individual(&self, index: usize, individual: &mut Individual<Fit::Genome>) -> Outcome {
        let signature = individual.genome.signature();
        match self.score_with_signature(&signature, &individual.genome) {
            Ok(lookup) => {
                individual.set_fitness(ValueFitness::new(*lookup.value(), self.direction));
                Outcome::Scored(lookup)
            }
            Err(error) => {
                log::warn!("evaluation of individual {index} ({signature}) failed: {error}");
                individual.set_fitness(ValueFitness::sentinel(self.direction));
                Outcome::Failed(IndividualFailure {
                    index,
                    signature,
                    error,
                })
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn run(&self, individuals: &mut [Individual<Fit::Genome>]) -> Vec<Outcome> {
        if self.parallel {
            individuals
                .par_iter_mut()
                .enumerate()
                .map(|(index, individual)| self.evaluate_individual(index, individual))
                .collect()
        } else {
            self.run_sequential(individuals)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run(&self, individuals: &mut [Individual<Fit::Genome>]) -> Vec<Outcome> {
        self.run_sequential(individuals)
    }

    fn run_sequential(&self, individuals: &mut [Individual<Fit::Genome>]) -> Vec<Outcome> {
        individuals
            .iter_mut()
            .enumerate()
            .map(|(index, individual)| self.evaluate_individual(index, individual))
            .collect()
    }

    /// Assign a fresh fitness to every individual
    ///
    /// Never fails: an individual whose evaluation fails gets the sentinel
    /// worst fitness and is listed in the report.
    pub fn evaluate(&self, population: &mut Population<Fit::Genome>) -> EvaluationReport {
        let started = Instant::now();
        let outcomes = self.run(population.individuals_mut());

        let mut report = EvaluationReport {
            evaluated: outcomes.len(),
            ..EvaluationReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Scored(CacheLookup::Hit(_)) => report.cache_hits += 1,
                Outcome::Scored(CacheLookup::Computed(_)) => report.computed += 1,
                Outcome::Failed(failure) => report.failures.push(failure),
            }
        }
        report.failures.sort_by_key(|f| f.index);

        log::debug!(
            "fitness cache holds {} signatures after pass ({:?})",
            self.cache.len(),
            self.cache.stats()
        );
        log::info!(
            "evaluated {} individuals in {:.1} ms: {} cached, {} computed, {} failed",
            report.evaluated,
            started.elapsed().as_secs_f64() * 1000.0,
            report.cache_hits,
            report.computed,
            report.failures.len()
        );
        report
    }
}
