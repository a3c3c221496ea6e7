//! Run configuration
//!
//! Everything the evaluation pipeline needs to know before the first
//! individual is scored. Invalid configurations are rejected here, never
//! during evaluation.

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::fitness::composite::ScoringTerms;
use crate::fitness::traits::Direction;

fn default_parallel() -> bool {
    true
}

/// Configuration for ensemble evaluation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Number of base classifiers in each ensemble
    pub num_members: usize,
    /// Number of active labels per base classifier
    pub labels_per_member: usize,
    /// Number of labels in the data set
    pub num_labels: usize,
    /// Optimization direction for the whole run
    pub direction: Direction,
    /// Allow members to carry a variable number of active labels
    #[serde(default)]
    pub variable_labels: bool,
    /// Auxiliary scoring terms
    #[serde(default)]
    pub terms: ScoringTerms,
    /// Whether to evaluate in parallel
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl EnsembleConfig {
    /// Start building a configuration
    pub fn builder() -> EnsembleConfigBuilder {
        EnsembleConfigBuilder::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> EvoResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EvolutionError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> EvoResult<()> {
        if self.num_members == 0 {
            return Err(EvolutionError::Configuration(
                "num_members must be positive".to_string(),
            ));
        }
        if self.num_labels == 0 {
            return Err(EvolutionError::Configuration(
                "num_labels must be positive".to_string(),
            ));
        }
        if self.labels_per_member == 0 || self.labels_per_member > self.num_labels {
            return Err(EvolutionError::Configuration(format!(
                "labels_per_member must be in 1..={}, got {}",
                self.num_labels, self.labels_per_member
            )));
        }
        Ok(())
    }

    /// Exact active-label count required per member, if fixed
    pub fn fixed_labels_per_member(&self) -> Option<usize> {
        (!self.variable_labels).then_some(self.labels_per_member)
    }
}

/// Builder for [`EnsembleConfig`]
#[derive(Clone, Debug, Default)]
pub struct EnsembleConfigBuilder {
    num_members: Option<usize>,
    labels_per_member: Option<usize>,
    num_labels: Option<usize>,
    direction: Option<Direction>,
    variable_labels: bool,
    terms: ScoringTerms,
    parallel: Option<bool>,
}

impl EnsembleConfigBuilder {
    /// Set the number of ensemble members
    pub fn num_members(mut self, n: usize) -> Self {
        self.num_members = Some(n);
        self
    }

    /// Set the number of active labels per member
    pub fn labels_per_member(mut self, k: usize) -> Self {
        self.labels_per_member = Some(k);
        self
    }

    /// Set the number of labels in the data set
    pub fn num_labels(mut self, n: usize) -> Self {
        self.num_labels = Some(n);
        self
    }

    /// Set the optimization direction
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Allow a variable number of active labels per member
    pub fn variable_labels(mut self, enabled: bool) -> Self {
        self.variable_labels = enabled;
        self
    }

    /// Set the auxiliary scoring terms
    pub fn terms(mut self, terms: ScoringTerms) -> Self {
        self.terms = terms;
        self
    }

    /// Enable or disable parallel evaluation
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = Some(enabled);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> EvoResult<EnsembleConfig> {
        let num_members = self.num_members.ok_or_else(|| {
            EvolutionError::Configuration("num_members must be specified".to_string())
        })?;
        let labels_per_member = self.labels_per_member.ok_or_else(|| {
            EvolutionError::Configuration("labels_per_member must be specified".to_string())
        })?;
        let num_labels = self.num_labels.ok_or_else(|| {
            EvolutionError::Configuration("num_labels must be specified".to_string())
        })?;
        let direction = self.direction.ok_or_else(|| {
            EvolutionError::Configuration("direction must be specified".to_string())
        })?;

        let config = EnsembleConfig {
            num_members,
            labels_per_member,
            num_labels,
            direction,
            variable_labels: self.variable_labels,
            terms: self.terms,
            parallel: self.parallel.unwrap_or_else(default_parallel),
        };
        config.validate()?;
        Ok(config)
    }
}
