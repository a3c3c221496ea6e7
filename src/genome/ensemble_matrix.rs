//! Ensemble membership matrix genome
//!
//! This module provides the binary member × label matrix that describes which
//! labels each base classifier of a multi-label ensemble is trained on.

use serde::{Deserialize, Serialize};

use crate::error::{GenomeError, Signature};
use crate::genome::traits::{CanonicalSignature, EvolutionaryGenome};

/// Binary membership matrix for a classifier ensemble
///
/// Row `m` describes ensemble member `m`; column `l` is set when label `l`
/// is in that member's label subset. Rows are kept in creation order, but
/// the canonical signature is independent of it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnsembleMatrix {
    rows: Vec<Vec<bool>>,
}

impl EnsembleMatrix {
    /// Create a matrix from its rows
    ///
    /// All rows must be non-empty and share the same length.
    pub fn new(rows: Vec<Vec<bool>>) -> Result<Self, GenomeError> {
        let labels = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(GenomeError::EmptyGenotype),
        };
        if let Some(bad) = rows.iter().find(|r| r.len() != labels) {
            return Err(GenomeError::DimensionMismatch {
                expected: labels,
                actual: bad.len(),
            });
        }
        Ok(Self { rows })
    }

    /// Create a matrix from a flat bit array
    ///
    /// Bit `label + member * labels` marks `label` as active in `member`,
    /// the layout used by binary-array genotypes.
    pub fn from_flat(bits: &[bool], members: usize, labels: usize) -> Result<Self, GenomeError> {
        if members == 0 || labels == 0 {
            return Err(GenomeError::EmptyGenotype);
        }
        if bits.len() != members * labels {
            return Err(GenomeError::DimensionMismatch {
                expected: members * labels,
                actual: bits.len(),
            });
        }
        let rows = bits.chunks(labels).map(|chunk| chunk.to_vec()).collect();
        Ok(Self { rows })
    }

    /// Number of ensemble members (rows)
    pub fn num_members(&self) -> usize {
        self.rows.len()
    }

    /// Number of labels (columns)
    pub fn num_labels(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Get the rows of the matrix
    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    /// Get a single member row
    pub fn row(&self, member: usize) -> Option<&[bool]> {
        self.rows.get(member).map(Vec::as_slice)
    }

    /// Check whether `label` is active in `member`
    pub fn is_active(&self, member: usize, label: usize) -> bool {
        self.rows
            .get(member)
            .and_then(|r| r.get(label))
            .copied()
            .unwrap_or(false)
    }

    /// Flip a single membership bit
    ///
    /// For variation operators working on their own copy; out-of-range
    /// positions are ignored.
    pub fn flip(&mut self, member: usize, label: usize) {
        if let Some(bit) = self.rows.get_mut(member).and_then(|r| r.get_mut(label)) {
            *bit = !*bit;
        }
    }

    /// Indices of the labels active in `member`
    pub fn active_labels(&self, member: usize) -> Vec<usize> {
        self.row(member)
            .map(|r| {
                r.iter()
                    .enumerate()
                    .filter_map(|(l, &active)| active.then_some(l))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of members voting for each label
    pub fn votes_per_label(&self) -> Vec<usize> {
        let mut votes = vec![0; self.num_labels()];
        for row in &self.rows {
            for (l, &active) in row.iter().enumerate() {
                if active {
                    votes[l] += 1;
                }
            }
        }
        votes
    }

    /// Highest number of members sharing any single label
    pub fn max_label_repeat(&self) -> usize {
        self.votes_per_label().into_iter().max().unwrap_or(0)
    }

    /// Flatten back into the `label + member * labels` layout
    pub fn to_flat(&self) -> Vec<bool> {
        self.rows.iter().flatten().copied().collect()
    }

    /// Render one row as a `0`/`1` string
    pub fn row_signature(&self, member: usize) -> Option<Signature> {
        self.row(member).map(render_bits)
    }

    /// Check the matrix against an expected ensemble shape
    ///
    /// When `labels_per_member` is given every member must have exactly that
    /// many active labels; otherwise every member needs at least one.
    pub fn validate_shape(
        &self,
        members: usize,
        labels: usize,
        labels_per_member: Option<usize>,
    ) -> Result<(), GenomeError> {
        if self.num_members() != members {
            return Err(GenomeError::DimensionMismatch {
                expected: members,
                actual: self.num_members(),
            });
        }
        if self.num_labels() != labels {
            return Err(GenomeError::DimensionMismatch {
                expected: labels,
                actual: self.num_labels(),
            });
        }
        for (m, row) in self.rows.iter().enumerate() {
            let active = row.iter().filter(|&&b| b).count();
            match labels_per_member {
                Some(k) if active != k => {
                    return Err(GenomeError::InvalidStructure(format!(
                        "member {m} has {active} active labels, expected {k}"
                    )));
                }
                None if active == 0 => {
                    return Err(GenomeError::InvalidStructure(format!(
                        "member {m} has no active labels"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn sorted_rows(&self) -> Vec<&Vec<bool>> {
        let mut sorted: Vec<&Vec<bool>> = self.rows.iter().collect();
        sorted.sort();
        sorted
    }
}

fn render_bits(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

impl EvolutionaryGenome for EnsembleMatrix {
    fn dimension(&self) -> usize {
        self.num_members() * self.num_labels()
    }

    /// Hamming distance between the row-sorted matrices
    fn distance(&self, other: &Self) -> f64 {
        if self.num_members() != other.num_members() || self.num_labels() != other.num_labels() {
            return self.dimension().max(other.dimension()) as f64;
        }
        self.sorted_rows()
            .into_iter()
            .zip(other.sorted_rows())
            .map(|(a, b)| a.iter().zip(b.iter()).filter(|(x, y)| x != y).count())
            .sum::<usize>() as f64
    }
}

impl CanonicalSignature for EnsembleMatrix {
    fn signature(&self) -> Signature {
        let mut rendered: Vec<String> = self.rows.iter().map(|r| render_bits(r)).collect();
        rendered.sort();
        rendered.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&str]) -> EnsembleMatrix {
        EnsembleMatrix::new(
            rows.iter()
                .map(|r| r.chars().map(|c| c == '1').collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let result = EnsembleMatrix::new(vec![vec![true, false], vec![true]]);
        assert_eq!(
            result,
            Err(GenomeError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_new_rejects_empty() {
        assert_eq!(EnsembleMatrix::new(vec![]), Err(GenomeError::EmptyGenotype));
        assert_eq!(
            EnsembleMatrix::new(vec![vec![]]),
            Err(GenomeError::EmptyGenotype)
        );
    }

    #[test]
    fn test_from_flat_layout() {
        // member 0 -> labels {0, 2}, member 1 -> labels {1}
        let bits = [true, false, true, false, true, false];
        let m = EnsembleMatrix::from_flat(&bits, 2, 3).unwrap();
        assert_eq!(m.active_labels(0), vec![0, 2]);
        assert_eq!(m.active_labels(1), vec![1]);
        assert_eq!(m.to_flat(), bits.to_vec());
    }

    #[test]
    fn test_from_flat_length_mismatch() {
        let result = EnsembleMatrix::from_flat(&[true; 5], 2, 3);
        assert_eq!(
            result,
            Err(GenomeError::DimensionMismatch {
                expected: 6,
                actual: 5
            })
        );
    }

    #[test]
    fn test_signature_is_row_order_independent() {
        let a = matrix(&["110", "011", "101"]);
        let b = matrix(&["101", "110", "011"]);
        assert_ne!(a, b);
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.signature(), "011101110");
    }

    #[test]
    fn test_votes_and_max_repeat() {
        let m = matrix(&["110", "011", "010"]);
        assert_eq!(m.votes_per_label(), vec![1, 3, 1]);
        assert_eq!(m.max_label_repeat(), 3);
    }

    #[test]
    fn test_validate_shape() {
        let m = matrix(&["110", "011"]);
        assert!(m.validate_shape(2, 3, Some(2)).is_ok());
        assert!(m.validate_shape(2, 3, None).is_ok());
        assert!(matches!(
            m.validate_shape(3, 3, Some(2)),
            Err(GenomeError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            m.validate_shape(2, 3, Some(1)),
            Err(GenomeError::InvalidStructure(_))
        ));

        let empty_member = matrix(&["110", "000"]);
        assert!(matches!(
            empty_member.validate_shape(2, 3, None),
            Err(GenomeError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_distance_ignores_row_order() {
        let a = matrix(&["110", "011"]);
        let b = matrix(&["011", "110"]);
        let c = matrix(&["111", "011"]);
        assert_eq!(a.distance(&b), 0.0);
        assert_eq!(a.distance(&c), 1.0);
    }

    #[test]
    fn test_row_signature() {
        let m = matrix(&["100", "011"]);
        assert_eq!(m.row_signature(1).as_deref(), Some("011"));
        assert_eq!(m.row_signature(2), None);
    }

    #[test]
    fn test_serde_roundtrip() {
        let m = matrix(&["100", "011"]);
        let json = serde_json::to_string(&m).unwrap();
        let back: EnsembleMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
