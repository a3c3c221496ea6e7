//! Collaborator traits
//!
//! The evaluation pipeline does not train or score classifiers itself. It
//! drives these traits, which callers implement on top of their learning
//! library of choice.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;
use crate::fitness::cache::SignatureCache;
use crate::genome::ensemble_matrix::EnsembleMatrix;

/// Quality measures an evaluator can be asked for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    /// Fraction of misclassified instance-label pairs (lower is better)
    HammingLoss,
    /// Fraction of instances with an exactly predicted label set
    SubsetAccuracy,
    /// Example-based F1 score
    ExampleBasedF1,
}

impl Measure {
    /// Name reported alongside the measured value
    pub fn name(&self) -> &'static str {
        match self {
            Self::HammingLoss => "Hamming Loss",
            Self::SubsetAccuracy => "Subset Accuracy",
            Self::ExampleBasedF1 => "Example-Based F Measure",
        }
    }

    /// Find this measure in an ordered `(name, value)` result list
    pub fn find_in(&self, results: &[(String, f64)]) -> Option<f64> {
        results
            .iter()
            .find(|(name, _)| name == self.name())
            .map(|(_, value)| *value)
    }
}

/// A trained ensemble, as seen by the scorer
pub trait EnsembleModel: Send {
    /// Diversity entropy of the ensemble's predictions
    fn entropy(&self) -> f64;

    /// Measure of difficulty of the ensemble's predictions
    fn measure_of_difficulty(&self) -> f64;
}

/// Builds an ensemble model from a membership matrix
pub trait Trainer: Send + Sync {
    /// Trained model handle
    type Model: EnsembleModel;
    /// Training data set
    type Data: Send + Sync;

    /// Train one model per member on that member's label subset
    fn build(&self, descriptor: &EnsembleMatrix, data: &Self::Data)
        -> Result<Self::Model, EvaluationError>;
}

/// Scores a trained model against validation data
pub trait Evaluator<M>: Send + Sync {
    /// Validation data set
    type Data: Send + Sync;

    /// Compute the requested measures, in order, as `(name, value)` pairs
    fn evaluate(
        &self,
        model: &M,
        validation: &Self::Data,
        measures: &[Measure],
    ) -> Result<Vec<(String, f64)>, EvaluationError>;
}

/// Read-only pairwise label correlations
pub trait CorrelationProvider: Send + Sync {
    /// Number of labels covered by the matrix
    fn num_labels(&self) -> usize;

    /// Phi correlation between labels `i` and `j`
    fn phi(&self, i: usize, j: usize) -> f64;
}

/// Shared store of trained per-member models, keyed by member row signature
///
/// Trainers use it to avoid retraining a base classifier for a label subset
/// that some earlier ensemble already used.
pub type MemberCache<M> = SignatureCache<Arc<M>>;
