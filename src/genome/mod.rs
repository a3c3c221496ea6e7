//! Genome abstractions and implementations
//!
//! This module provides the core `EvolutionaryGenome` trait and the ensemble
//! membership matrix genome.

pub mod ensemble_matrix;
pub mod traits;

pub mod prelude {
    pub use super::ensemble_matrix::*;
    pub use super::traits::*;
}
