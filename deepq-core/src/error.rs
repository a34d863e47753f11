//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Public functions return [`anyhow::Result`]; use `downcast_ref::<DqnError>()`
/// to inspect which of these conditions occurred.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DqnError {
    /// The replay memory holds fewer transitions than requested.
    #[error("Insufficient memory: {required} transitions required, {available} available")]
    InsufficientMemory {
        /// Number of transitions requested.
        required: usize,
        /// Number of transitions stored.
        available: usize,
    },

    /// Epsilon of epsilon-greedy selection is not in `[0, 1]`.
    #[error("Epsilon must be in [0, 1], got {0}")]
    InvalidEpsilon(f64),

    /// Action does not index an output of the value function.
    #[error("Action {0} is not a legal action")]
    IllegalAction(usize),

    /// Frames or tensors have unexpected shapes.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        actual: Vec<usize>,
    },

    /// Configuration rejected at construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),
}
