//! Population evaluation
//!
//! This module provides the parallel, memoized evaluator.

pub mod parallel;

pub mod prelude {
    pub use super::parallel::*;
}
