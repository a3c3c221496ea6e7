//! Error types for ensemble-evo
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Canonical signature of a genotype, used as a cache key
pub type Signature = String;

/// Error type for genome operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenomeError {
    /// Invalid genome structure
    #[error("Invalid genome structure: {0}")]
    InvalidStructure(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Genotype with no members or no labels
    #[error("Empty genotype")]
    EmptyGenotype,
}

/// Error type for the evaluation of a single individual
///
/// These never escape a population evaluation pass: the evaluator records
/// them and assigns the sentinel fitness instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    /// Genotype has the wrong shape for the configured ensemble
    #[error("Invalid genotype: {0}")]
    InvalidGenotype(#[from] GenomeError),

    /// The external trainer failed to build a model
    #[error("Training failed: {0}")]
    Training(String),

    /// The external evaluator failed to score a model
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// The evaluator did not report a required measure
    #[error("Missing measure in evaluation results: {0}")]
    MissingMeasure(String),

    /// Score is NaN or infinite
    #[error("Numerical failure: {0}")]
    Numerical(String),
}

/// Error type for operator failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperatorError {
    /// Selection operation failed
    #[error("Selection failed: {0}")]
    SelectionFailed(String),

    /// Invalid operator configuration
    #[error("Invalid operator configuration: {0}")]
    InvalidConfiguration(String),
}

/// Error type for fitness cache persistence
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error while reading or writing a cache file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// A persisted score could not be parsed
    #[error("Invalid score for signature {signature}: {value}")]
    InvalidScore { signature: Signature, value: String },
}

/// Top-level error type for evolution operations
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Genome error
    #[error("Genome error: {0}")]
    Genome(#[from] GenomeError),

    /// Operator error
    #[error("Operator error: {0}")]
    Operator(#[from] OperatorError),

    /// Fitness evaluation failed
    #[error("Fitness evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Fitness cache error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Empty population
    #[error("Empty population")]
    EmptyPopulation,

    /// An individual reached selection without a fitness value
    #[error("Individual {index} has not been evaluated")]
    Unevaluated { index: usize },
}

/// Result type alias for evolution operations
pub type EvoResult<T> = Result<T, EvolutionError>;
