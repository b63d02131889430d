//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// All learning and query operations detect their failure conditions
/// synchronously and never retry internally; retry is a driver concern
/// since learning steps are not idempotent.
#[derive(Error, Debug)]
pub enum UomError {
    /// Shape mismatch between a feature vector and a learned operator.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    Dimension {
        /// Number of features the operator was built for.
        expected: usize,
        /// Length of the offending input.
        got: usize,
    },

    /// State index outside the approximator's domain.
    #[error("State index {index} out of range [0, {n})")]
    OutOfRange {
        /// The offending state index.
        index: i64,
        /// Number of states the approximator covers.
        n: usize,
    },

    /// Invalid learning-rate, discount or exploration parameters.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Non-finite entries in a feature or reward vector.
    #[error("Non-finite input: {0}")]
    InvalidInput(String),

    /// An operator's entries grew past the configured magnitude bound
    /// during learning.
    #[error("Operator magnitude {magnitude} exceeded bound {bound}")]
    Divergence {
        /// Largest entry magnitude observed after the update.
        magnitude: f32,
        /// The configured bound.
        bound: f32,
    },
}
