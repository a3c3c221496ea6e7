//! Population management
//!
//! Individuals own one genome and at most one fitness value; populations keep
//! them in a significant order.

pub mod individual;
#[allow(clippy::module_inception)]
pub mod population;

pub mod prelude {
    pub use super::individual::*;
    pub use super::population::*;
}
