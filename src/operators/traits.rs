//! Operator traits
//!
//! This module defines the selection operator trait and the random source
//! shared by all selection draws of a run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::EvoResult;
use crate::fitness::traits::FitnessValue;
use crate::genome::traits::EvolutionaryGenome;
use crate::population::population::Population;

/// Source of uniform draws in `[0, 1)`
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`
    fn next_f64(&mut self) -> f64;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Deterministic random source for reproducible runs
pub fn seeded_source(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Selection operator trait
///
/// Selects individuals from an evaluated population for reproduction.
pub trait SelectionOperator<G, F>: Send + Sync
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// Select a single individual from the population
    ///
    /// Returns the index of the selected individual.
    fn select<R: RandomSource + ?Sized>(
        &self,
        population: &Population<G, F>,
        rng: &mut R,
    ) -> EvoResult<usize>;

    /// Select multiple individuals from the population, with replacement
    fn select_many<R: RandomSource + ?Sized>(
        &self,
        population: &Population<G, F>,
        count: usize,
        rng: &mut R,
    ) -> EvoResult<Vec<usize>> {
        (0..count).map(|_| self.select(population, rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvolutionError;
    use crate::fitness::traits::{Direction, ValueFitness};
    use crate::genome::ensemble_matrix::EnsembleMatrix;
    use crate::population::individual::Individual;

    // Picks the last individual; fails on an empty population
    struct MockSelection;

    impl SelectionOperator<EnsembleMatrix, ValueFitness> for MockSelection {
        fn select<R: RandomSource + ?Sized>(
            &self,
            population: &Population<EnsembleMatrix>,
            _rng: &mut R,
        ) -> EvoResult<usize> {
            population
                .len()
                .checked_sub(1)
                .ok_or(EvolutionError::EmptyPopulation)
        }
    }

    fn create_population(size: usize) -> Population<EnsembleMatrix> {
        (0..size)
            .map(|i| {
                Individual::with_fitness(
                    EnsembleMatrix::new(vec![vec![true]]).unwrap(),
                    ValueFitness::new(i as f64, Direction::Maximize),
                )
            })
            .collect()
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let mut a = seeded_source(42);
        let mut b = seeded_source(42);
        let xs: Vec<f64> = (0..5).map(|_| a.next_f64()).collect();
        let ys: Vec<f64> = (0..5).map(|_| b.next_f64()).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn test_select_many_default() {
        let mut rng = seeded_source(1);
        let pop = create_population(3);
        let picks = MockSelection.select_many(&pop, 4, &mut rng).unwrap();
        assert_eq!(picks, vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_select_many_propagates_errors() {
        let mut rng = seeded_source(1);
        let pop = create_population(0);
        assert!(matches!(
            MockSelection.select_many(&pop, 2, &mut rng),
            Err(EvolutionError::EmptyPopulation)
        ));
    }
}
