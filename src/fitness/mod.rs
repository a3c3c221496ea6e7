//! Fitness evaluation
//!
//! This module provides the fitness abstraction, the signature-keyed score
//! cache and the composite ensemble objective.

pub mod cache;
pub mod composite;
pub mod ensemble;
pub mod traits;

pub mod prelude {
    pub use super::cache::*;
    pub use super::composite::*;
    pub use super::ensemble::*;
    pub use super::traits::*;
}
