//! Ensemble fitness
//!
//! Scores a membership matrix by training the ensemble it describes,
//! measuring its Hamming loss on validation data, and passing `1 - loss`
//! through the composite scorer.

use crate::config::EnsembleConfig;
use crate::error::{EvaluationError, EvoResult, EvolutionError};
use crate::fitness::composite::CompositeScorer;
use crate::fitness::traits::Fitness;
use crate::genome::ensemble_matrix::EnsembleMatrix;
use crate::learning::phi::PhiMatrix;
use crate::learning::traits::{CorrelationProvider, Evaluator, Measure, Trainer};

/// Objective for multi-label classifier ensembles
pub struct EnsembleFitness<T, E, C = PhiMatrix>
where
    T: Trainer,
    E: Evaluator<T::Model>,
    C: CorrelationProvider,
{
    trainer: T,
    evaluator: E,
    training_data: T::Data,
    validation_data: E::Data,
    correlations: Option<C>,
    scorer: CompositeScorer,
    num_members: usize,
    num_labels: usize,
    labels_per_member: Option<usize>,
}

impl<T, E, C> EnsembleFitness<T, E, C>
where
    T: Trainer,
    E: Evaluator<T::Model>,
    C: CorrelationProvider,
{
    /// Start building an ensemble fitness for `config`
    pub fn builder(config: &EnsembleConfig, trainer: T, evaluator: E) -> EnsembleFitnessBuilder<T, E, C> {
        EnsembleFitnessBuilder {
            config: config.clone(),
            trainer,
            evaluator,
            training_data: None,
            validation_data: None,
            correlations: None,
        }
    }

    /// The composite scorer applied after the base quality
    pub fn scorer(&self) -> &CompositeScorer {
        &self.scorer
    }

    /// Base quality `1 - hamming loss` of a trained model
    pub fn base_score(&self, model: &T::Model) -> Result<f64, EvaluationError> {
        let measures = [Measure::HammingLoss];
        let results = self
            .evaluator
            .evaluate(model, &self.validation_data, &measures)?;
        let loss = Measure::HammingLoss
            .find_in(&results)
            .ok_or_else(|| EvaluationError::MissingMeasure(Measure::HammingLoss.name().to_string()))?;
        if !loss.is_finite() {
            return Err(EvaluationError::Numerical(format!("hamming loss is {loss}")));
        }
        Ok(1.0 - loss)
    }
}

impl<T, E, C> Fitness for EnsembleFitness<T, E, C>
where
    T: Trainer,
    E: Evaluator<T::Model>,
    C: CorrelationProvider,
{
    type Genome = EnsembleMatrix;

    fn validate(&self, genome: &EnsembleMatrix) -> Result<(), EvaluationError> {
        genome.validate_shape(self.num_members, self.num_labels, self.labels_per_member)?;
        Ok(())
    }

    fn evaluate(&self, genome: &EnsembleMatrix) -> Result<f64, EvaluationError> {
        self.validate(genome)?;
        let model = self.trainer.build(genome, &self.training_data)?;
        let base = self.base_score(&model)?;
        let correlations = self
            .correlations
            .as_ref()
            .map(|c| c as &dyn CorrelationProvider);
        self.scorer.score(base, genome, &model, correlations)
    }
}

/// Builder for [`EnsembleFitness`]
pub struct EnsembleFitnessBuilder<T, E, C>
where
    T: Trainer,
    E: Evaluator<T::Model>,
    C: CorrelationProvider,
{
    config: EnsembleConfig,
    trainer: T,
    evaluator: E,
    training_data: Option<T::Data>,
    validation_data: Option<E::Data>,
    correlations: Option<C>,
}

impl<T, E, C> EnsembleFitnessBuilder<T, E, C>
where
    T: Trainer,
    E: Evaluator<T::Model>,
    C: CorrelationProvider,
{
    /// Set the data the trainer builds members from
    pub fn training_data(mut self, data: T::Data) -> Self {
        self.training_data = Some(data);
        self
    }

    /// Set the data the evaluator scores models on
    pub fn validation_data(mut self, data: E::Data) -> Self {
        self.validation_data = Some(data);
        self
    }

    /// Set the label correlations used by the phi term
    pub fn correlations(mut self, correlations: C) -> Self {
        self.correlations = Some(correlations);
        self
    }

    /// Build the fitness, rejecting incomplete setups
    pub fn build(self) -> EvoResult<EnsembleFitness<T, E, C>> {
        self.config.validate()?;

        let training_data = self.training_data.ok_or_else(|| {
            EvolutionError::Configuration("Training data must be specified".to_string())
        })?;
        let validation_data = self.validation_data.ok_or_else(|| {
            EvolutionError::Configuration("Validation data must be specified".to_string())
        })?;

        match &self.correlations {
            None if self.config.terms.phi => {
                return Err(EvolutionError::Configuration(
                    "Phi term requires a correlation matrix".to_string(),
                ));
            }
            Some(c) if c.num_labels() < self.config.num_labels => {
                return Err(EvolutionError::Configuration(format!(
                    "Correlation matrix covers {} labels, data set has {}",
                    c.num_labels(),
                    self.config.num_labels
                )));
            }
            _ => {}
        }

        Ok(EnsembleFitness {
            trainer: self.trainer,
            evaluator: self.evaluator,
            training_data,
            validation_data,
            correlations: self.correlations,
            scorer: CompositeScorer::new(
                self.config.terms,
                self.config.labels_per_member,
                self.config.direction,
            ),
            num_members: self.config.num_members,
            num_labels: self.config.num_labels,
            labels_per_member: self.config.fixed_labels_per_member(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::composite::ScoringTerms;
    use crate::fitness::traits::Direction;
    use crate::learning::traits::EnsembleModel;

    struct StubModel;

    impl EnsembleModel for StubModel {
        fn entropy(&self) -> f64 {
            0.0
        }

        fn measure_of_difficulty(&self) -> f64 {
            0.0
        }
    }

    struct StubTrainer;

    impl Trainer for StubTrainer {
        type Model = StubModel;
        type Data = ();

        fn build(&self, descriptor: &EnsembleMatrix, _data: &()) -> Result<StubModel, EvaluationError> {
            if descriptor.is_active(0, 0) {
                Ok(StubModel)
            } else {
                Err(EvaluationError::Training("label 0 unused".to_string()))
            }
        }
    }

    struct StubEvaluator {
        loss: Option<f64>,
    }

    impl Evaluator<StubModel> for StubEvaluator {
        type Data = ();

        fn evaluate(
            &self,
            _model: &StubModel,
            _validation: &(),
            measures: &[Measure],
        ) -> Result<Vec<(String, f64)>, EvaluationError> {
            Ok(self
                .loss
                .map(|l| measures.iter().map(|m| (m.name().to_string(), l)).collect())
                .unwrap_or_default())
        }
    }

    fn config(terms: ScoringTerms) -> EnsembleConfig {
        EnsembleConfig::builder()
            .num_members(2)
            .labels_per_member(2)
            .num_labels(3)
            .direction(Direction::Maximize)
            .terms(terms)
            .build()
            .unwrap()
    }

    fn fitness(loss: Option<f64>) -> EnsembleFitness<StubTrainer, StubEvaluator> {
        EnsembleFitness::builder(&config(ScoringTerms::none()), StubTrainer, StubEvaluator { loss })
            .training_data(())
            .validation_data(())
            .build()
            .unwrap()
    }

    fn genome(rows: Vec<Vec<bool>>) -> EnsembleMatrix {
        EnsembleMatrix::new(rows).unwrap()
    }

    #[test]
    fn test_base_score_from_hamming_loss() {
        let f = fitness(Some(0.2));
        let g = genome(vec![vec![true, true, false], vec![false, true, true]]);
        assert_eq!(f.evaluate(&g), Ok(0.8));
    }

    #[test]
    fn test_shape_mismatch_is_invalid_genotype() {
        let f = fitness(Some(0.2));
        let g = genome(vec![vec![true, true, true], vec![false, true, true]]);
        assert!(matches!(f.evaluate(&g), Err(EvaluationError::InvalidGenotype(_))));
    }

    #[test]
    fn test_training_failure_propagates() {
        let f = fitness(Some(0.2));
        let g = genome(vec![vec![false, true, true], vec![false, true, true]]);
        assert!(matches!(f.evaluate(&g), Err(EvaluationError::Training(_))));
    }

    #[test]
    fn test_missing_measure() {
        let f = fitness(None);
        let g = genome(vec![vec![true, true, false], vec![false, true, true]]);
        assert_eq!(
            f.evaluate(&g),
            Err(EvaluationError::MissingMeasure("Hamming Loss".to_string()))
        );
    }

    #[test]
    fn test_missing_data_is_configuration_error() {
        let result: EvoResult<EnsembleFitness<StubTrainer, StubEvaluator>> = EnsembleFitness::builder(
            &config(ScoringTerms::none()),
            StubTrainer,
            StubEvaluator { loss: Some(0.1) },
        )
        .training_data(())
        .build();
        assert!(matches!(result, Err(EvolutionError::Configuration(_))));
    }

    #[test]
    fn test_phi_without_matrix_is_configuration_error() {
        let terms = ScoringTerms {
            phi: true,
            ..ScoringTerms::none()
        };
        let result: EvoResult<EnsembleFitness<StubTrainer, StubEvaluator>> =
            EnsembleFitness::builder(&config(terms), StubTrainer, StubEvaluator { loss: Some(0.1) })
                .training_data(())
                .validation_data(())
                .build();
        assert!(matches!(result, Err(EvolutionError::Configuration(_))));
    }

    #[test]
    fn test_small_phi_matrix_is_configuration_error() {
        let terms = ScoringTerms {
            phi: true,
            ..ScoringTerms::none()
        };
        let result = EnsembleFitness::builder(&config(terms), StubTrainer, StubEvaluator { loss: Some(0.1) })
            .training_data(())
            .validation_data(())
            .correlations(PhiMatrix::zeros(2))
            .build();
        assert!(matches!(result, Err(EvolutionError::Configuration(_))));
    }
}
