//! Core genome traits
//!
//! This module defines the `EvolutionaryGenome` trait and the capability
//! traits the evaluation pipeline resolves at compile time.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Signature;

/// Core genome abstraction for evolutionary algorithms.
///
/// Genomes are treated as immutable once created: the library clones them,
/// compares them, and scores them, but never edits them in place. Deep
/// copies come from `Clone`, so implementors must not share interior state
/// between clones.
pub trait EvolutionaryGenome:
    Clone + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Compute dimensionality of the genome
    fn dimension(&self) -> usize;

    /// Distance metric between two genomes (default: 0.0)
    ///
    /// Extension point for domain-specific metrics. Nothing in the
    /// evaluation or selection pipeline depends on it.
    fn distance(&self, _other: &Self) -> f64 {
        0.0
    }
}

/// Genomes with an order-independent identity.
///
/// Two genomes that encode the same solution must produce the same
/// signature, even if their internal layout differs.
pub trait CanonicalSignature {
    /// Canonical string identity of this genome
    fn signature(&self) -> Signature;
}
