//! # ensemble-evo
//!
//! Evolutionary search over multi-label classifier ensembles.
//!
//! A candidate ensemble is a binary member × label matrix. Candidates are
//! scored by training and validating the ensemble through pluggable
//! collaborators, blended with structural quality terms, and selected for
//! reproduction through a rank-based roulette wheel.
//!
//! ## Core Concepts
//!
//! - **Individuals**: a genome plus an optional fitness; copies are deep
//! - **Memoized evaluation**: equivalent genomes share one canonical
//!   signature and are scored at most once per run, in parallel
//! - **Rank-based selection**: non-linear hierarchical ranking with ties
//!   collapsed onto the lowest rank
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ensemble_evo::prelude::*;
//! use std::sync::Arc;
//!
//! let config = EnsembleConfig::from_toml_str(r#"
//!     num_members = 10
//!     labels_per_member = 3
//!     num_labels = 6
//!     direction = "maximize"
//!
//!     [terms]
//!     phi = true
//!     diversity = true
//! "#)?;
//! let fitness = EnsembleFitness::builder(&config, trainer, evaluator)
//!     .training_data(train)
//!     .validation_data(validation)
//!     .correlations(PhiMatrix::from_label_columns(&label_columns)?)
//!     .build()?;
//!
//! let evaluator = ParallelEvaluator::from_config(&config, fitness, Arc::new(FitnessCache::new()));
//! let report = evaluator.evaluate(&mut population);
//!
//! let mut rng = seeded_source(42);
//! let parents = RouletteSelection::ranked().select_many(&population, 10, &mut rng)?;
//! ```

pub mod config;
pub mod error;
pub mod evaluation;
pub mod fitness;
pub mod genome;
pub mod learning;
pub mod operators;
pub mod population;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::evaluation::prelude::*;
    pub use crate::fitness::prelude::*;
    pub use crate::genome::prelude::*;
    pub use crate::learning::prelude::*;
    pub use crate::operators::prelude::*;
    pub use crate::population::prelude::*;
}
