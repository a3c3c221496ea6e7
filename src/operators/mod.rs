//! Genetic operators
//!
//! This module provides roulette wheel selection and the random source
//! shared by selection draws.

pub mod selection;
pub mod traits;

pub mod prelude {
    pub use super::selection::*;
    pub use super::traits::*;
}
