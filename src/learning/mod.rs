//! Learning collaborators
//!
//! This module defines the trainer, evaluator and correlation interfaces the
//! ensemble fitness consumes, plus a concrete phi correlation matrix.

pub mod phi;
pub mod traits;

pub mod prelude {
    pub use super::phi::*;
    pub use super::traits::*;
}
