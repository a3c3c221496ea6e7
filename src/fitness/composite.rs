//! Composite fitness scoring
//!
//! Blends the base quality of an ensemble (`1 - hamming loss`) with optional
//! auxiliary terms. Terms are applied in a fixed order:
//!
//! 1. phi: `+ avg_members( Σ_{i<j active} |phi(i, j)| / labels_per_member )`
//! 2. entropy: `+ model.entropy()`
//! 3. difficulty: `- model.measure_of_difficulty()`
//! 4. coverage: `- sqrt( Σ_l (expected - votes_l)² ) / num_labels`
//! 5. diversity: `score·0.6 + d·0.4` (maximize) or `score·0.6 + (1-d)·0.4`
//!    (minimize), with `d = 1 - max_label_repeat / num_members`

use serde::{Deserialize, Serialize};

use crate::error::{EvaluationError, GenomeError};
use crate::fitness::traits::Direction;
use crate::genome::ensemble_matrix::EnsembleMatrix;
use crate::learning::traits::{CorrelationProvider, EnsembleModel};

/// Weight of the accumulated score in the diversity blend
pub const SCORE_WEIGHT: f64 = 0.6;
/// Weight of the diversity term in the diversity blend
pub const DIVERSITY_WEIGHT: f64 = 0.4;

/// Independent switches for the auxiliary scoring terms
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTerms {
    /// Reward correlated labels sharing a member
    pub phi: bool,
    /// Reward ensemble entropy
    pub entropy: bool,
    /// Penalize measure of difficulty
    pub difficulty: bool,
    /// Penalize uneven label coverage
    pub coverage: bool,
    /// Blend in label-repeat diversity
    pub diversity: bool,
}

impl ScoringTerms {
    /// No auxiliary terms: the score is the base quality
    pub fn none() -> Self {
        Self::default()
    }

    /// Every auxiliary term enabled
    pub fn all() -> Self {
        Self {
            phi: true,
            entropy: true,
            difficulty: true,
            coverage: true,
            diversity: true,
        }
    }
}

/// Combines the base quality with the enabled auxiliary terms
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeScorer {
    terms: ScoringTerms,
    labels_per_member: usize,
    direction: Direction,
}

impl CompositeScorer {
    /// Create a scorer
    ///
    /// `labels_per_member` is the configured subset size; it normalizes the
    /// phi and coverage terms even when members carry a variable number of
    /// labels.
    pub fn new(terms: ScoringTerms, labels_per_member: usize, direction: Direction) -> Self {
        Self {
            terms,
            labels_per_member,
            direction,
        }
    }

    /// Enabled terms
    pub fn terms(&self) -> ScoringTerms {
        self.terms
    }

    /// Final score from a base quality
    pub fn score<M>(
        &self,
        base: f64,
        descriptor: &EnsembleMatrix,
        model: &M,
        correlations: Option<&dyn CorrelationProvider>,
    ) -> Result<f64, EvaluationError>
    where
        M: EnsembleModel + ?Sized,
    {
        let mut score = base;

        if self.terms.phi {
            let provider = correlations.ok_or_else(|| {
                EvaluationError::Evaluation("phi term enabled without correlations".to_string())
            })?;
            score += phi_term(descriptor, provider, self.labels_per_member)?;
        }
        if self.terms.entropy {
            score += model.entropy();
        }
        if self.terms.difficulty {
            score -= model.measure_of_difficulty();
        }
        if self.terms.coverage {
            score -= coverage_term(descriptor, self.labels_per_member);
        }
        if self.terms.diversity {
            let d = diversity(descriptor);
            score = match self.direction {
                Direction::Maximize => score * SCORE_WEIGHT + d * DIVERSITY_WEIGHT,
                Direction::Minimize => score * SCORE_WEIGHT + (1.0 - d) * DIVERSITY_WEIGHT,
            };
        }

        if score.is_finite() {
            Ok(score)
        } else {
            Err(EvaluationError::Numerical(format!(
                "composite score is {score}"
            )))
        }
    }
}

/// Average over members of the summed |phi| between co-active label pairs
pub fn phi_term(
    descriptor: &EnsembleMatrix,
    correlations: &dyn CorrelationProvider,
    labels_per_member: usize,
) -> Result<f64, EvaluationError> {
    let labels = descriptor.num_labels();
    if correlations.num_labels() < labels {
        return Err(GenomeError::DimensionMismatch {
            expected: correlations.num_labels(),
            actual: labels,
        }
        .into());
    }
    if labels_per_member == 0 {
        return Err(EvaluationError::Numerical(
            "labels per member must be positive".to_string(),
        ));
    }

    let members = descriptor.num_members();
    let mut total = 0.0;
    for member in 0..members {
        let active = descriptor.active_labels(member);
        let mut sum = 0.0;
        for (a, &i) in active.iter().enumerate() {
            for &j in &active[a + 1..] {
                sum += correlations.phi(i, j).abs();
            }
        }
        total += sum / labels_per_member as f64;
    }
    Ok(total / members as f64)
}

/// Distance between actual and expected votes per label, scaled by label count
///
/// The expected vote count uses integer division.
pub fn coverage_term(descriptor: &EnsembleMatrix, labels_per_member: usize) -> f64 {
    let labels = descriptor.num_labels();
    let expected = ((descriptor.num_members() * labels_per_member) / labels) as f64;
    let squared: f64 = descriptor
        .votes_per_label()
        .into_iter()
        .map(|v| (expected - v as f64).powi(2))
        .sum();
    squared.sqrt() / labels as f64
}

/// `1 - max_label_repeat / num_members`
pub fn diversity(descriptor: &EnsembleMatrix) -> f64 {
    1.0 - descriptor.max_label_repeat() as f64 / descriptor.num_members() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::phi::PhiMatrix;

    struct FixedModel {
        entropy: f64,
        difficulty: f64,
    }

    impl EnsembleModel for FixedModel {
        fn entropy(&self) -> f64 {
            self.entropy
        }

        fn measure_of_difficulty(&self) -> f64 {
            self.difficulty
        }
    }

    fn model() -> FixedModel {
        FixedModel {
            entropy: 0.3,
            difficulty: 0.1,
        }
    }

    // Members {0,1}, {1,2}, {1,3} over 4 labels
    fn descriptor() -> EnsembleMatrix {
        EnsembleMatrix::new(vec![
            vec![true, true, false, false],
            vec![false, true, true, false],
            vec![false, true, false, true],
        ])
        .unwrap()
    }

    fn phi() -> PhiMatrix {
        PhiMatrix::new(vec![
            vec![1.0, 0.5, 0.0, 0.0],
            vec![0.5, 1.0, -0.2, 0.1],
            vec![0.0, -0.2, 1.0, 0.0],
            vec![0.0, 0.1, 0.0, 1.0],
        ])
        .unwrap()
    }

    fn scorer(terms: ScoringTerms, direction: Direction) -> CompositeScorer {
        CompositeScorer::new(terms, 2, direction)
    }

    #[test]
    fn test_base_only() {
        let s = scorer(ScoringTerms::none(), Direction::Maximize);
        let score = s.score(1.0 - 0.2, &descriptor(), &model(), None).unwrap();
        assert_eq!(score, 0.8);
    }

    #[test]
    fn test_phi_term() {
        // (0.5/2 + 0.2/2 + 0.1/2) / 3 = 0.4 / 3
        let value = phi_term(&descriptor(), &phi(), 2).unwrap();
        assert!((value - 0.4 / 3.0).abs() < 1e-12);

        let terms = ScoringTerms {
            phi: true,
            ..ScoringTerms::none()
        };
        let p = phi();
        let score = scorer(terms, Direction::Maximize)
            .score(0.8, &descriptor(), &model(), Some(&p))
            .unwrap();
        assert!((score - (0.8 + 0.4 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_phi_without_correlations_fails() {
        let terms = ScoringTerms {
            phi: true,
            ..ScoringTerms::none()
        };
        let result = scorer(terms, Direction::Maximize).score(0.8, &descriptor(), &model(), None);
        assert!(matches!(result, Err(EvaluationError::Evaluation(_))));
    }

    #[test]
    fn test_phi_matrix_too_small() {
        let small = PhiMatrix::zeros(2);
        let result = phi_term(&descriptor(), &small, 2);
        assert!(matches!(result, Err(EvaluationError::InvalidGenotype(_))));
    }

    #[test]
    fn test_entropy_and_difficulty() {
        let terms = ScoringTerms {
            entropy: true,
            difficulty: true,
            ..ScoringTerms::none()
        };
        let score = scorer(terms, Direction::Maximize)
            .score(0.5, &descriptor(), &model(), None)
            .unwrap();
        assert!((score - (0.5 + 0.3 - 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_coverage_term() {
        // votes = [1, 3, 1, 1], expected = (3 * 2) / 4 = 1 (integer division)
        // sqrt(0 + 4 + 0 + 0) / 4 = 0.5
        assert!((coverage_term(&descriptor(), 2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_diversity_blend_maximize() {
        // max repeat = 3 of 3 members -> diversity 0
        assert_eq!(diversity(&descriptor()), 0.0);
        let terms = ScoringTerms {
            diversity: true,
            ..ScoringTerms::none()
        };
        let score = scorer(terms, Direction::Maximize)
            .score(0.8, &descriptor(), &model(), None)
            .unwrap();
        assert!((score - 0.8 * 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_diversity_blend_minimize() {
        let terms = ScoringTerms {
            diversity: true,
            ..ScoringTerms::none()
        };
        let score = scorer(terms, Direction::Minimize)
            .score(0.8, &descriptor(), &model(), None)
            .unwrap();
        assert!((score - (0.8 * 0.6 + 0.4)).abs() < 1e-12);
    }

    #[test]
    fn test_all_terms_in_order() {
        let p = phi();
        let score = scorer(ScoringTerms::all(), Direction::Maximize)
            .score(0.8, &descriptor(), &model(), Some(&p))
            .unwrap();
        let accumulated = 0.8 + 0.4 / 3.0 + 0.3 - 0.1 - 0.5;
        let expected = accumulated * 0.6 + 0.0 * 0.4;
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_score_rejected() {
        let bad = FixedModel {
            entropy: f64::NAN,
            difficulty: 0.0,
        };
        let terms = ScoringTerms {
            entropy: true,
            ..ScoringTerms::none()
        };
        let result = scorer(terms, Direction::Maximize).score(0.8, &descriptor(), &bad, None);
        assert!(matches!(result, Err(EvaluationError::Numerical(_))));
    }
}
