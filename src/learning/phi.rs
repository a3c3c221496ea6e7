//! Phi correlation matrix
//!
//! A concrete, precomputed `CorrelationProvider` built from label data.

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::learning::traits::CorrelationProvider;

const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Symmetric matrix of pairwise phi coefficients between labels
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhiMatrix {
    values: Vec<Vec<f64>>,
}

impl PhiMatrix {
    /// Wrap a precomputed matrix, checking that it is square and symmetric
    pub fn new(values: Vec<Vec<f64>>) -> EvoResult<Self> {
        let n = values.len();
        if let Some(row) = values.iter().position(|r| r.len() != n) {
            return Err(EvolutionError::Configuration(format!(
                "phi matrix row {row} has {} entries, expected {n}",
                values[row].len()
            )));
        }
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (values[i][j], values[j][i]);
                if !a.is_finite() || !b.is_finite() || (a - b).abs() > SYMMETRY_TOLERANCE {
                    return Err(EvolutionError::Configuration(format!(
                        "phi matrix is not symmetric at ({i}, {j}): {a} vs {b}"
                    )));
                }
            }
        }
        Ok(Self { values })
    }

    /// All-zero correlations for `n` labels
    pub fn zeros(n: usize) -> Self {
        Self {
            values: vec![vec![0.0; n]; n],
        }
    }

    /// Compute phi coefficients from instance × label data
    ///
    /// Each inner vector holds the label relevance of one instance. For a
    /// pair of labels the 2×2 contingency table gives
    /// `phi = (n11·n00 − n10·n01) / sqrt(n1·  n0·  n·1  n·0)`, taken as 0
    /// when any margin is empty. The diagonal is 1.
    pub fn from_label_columns(instances: &[Vec<bool>]) -> EvoResult<Self> {
        let n = match instances.first() {
            Some(first) => first.len(),
            None => {
                return Err(EvolutionError::Configuration(
                    "cannot compute phi correlations without instances".to_string(),
                ))
            }
        };
        if instances.iter().any(|inst| inst.len() != n) {
            return Err(EvolutionError::Configuration(
                "instances have differing label counts".to_string(),
            ));
        }

        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                let phi = phi_coefficient(instances, i, j);
                values[i][j] = phi;
                values[j][i] = phi;
            }
        }
        Ok(Self { values })
    }

    /// Get the raw matrix
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }
}

fn phi_coefficient(instances: &[Vec<bool>], i: usize, j: usize) -> f64 {
    let (mut n11, mut n10, mut n01, mut n00) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for inst in instances {
        match (inst[i], inst[j]) {
            (true, true) => n11 += 1.0,
            (true, false) => n10 += 1.0,
            (false, true) => n01 += 1.0,
            (false, false) => n00 += 1.0,
        }
    }
    let denominator = ((n11 + n10) * (n01 + n00) * (n11 + n01) * (n10 + n00)).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        (n11 * n00 - n10 * n01) / denominator
    }
}

impl CorrelationProvider for PhiMatrix {
    fn num_labels(&self) -> usize {
        self.values.len()
    }

    fn phi(&self, i: usize, j: usize) -> f64 {
        self.values
            .get(i)
            .and_then(|row| row.get(j))
            .copied()
            .unwrap_or(0.0)
    }
}
