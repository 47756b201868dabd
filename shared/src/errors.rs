//! Error types shared across the AppFitness crates

use thiserror::Error;

/// A rule that must hold before a mutation is applied.
///
/// Precondition failures are detected before any state changes, so the
/// caller can show the message and leave everything as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreconditionError {
    #[error("Enter at least one measurement or add a photo")]
    EmptyProgressEntry,

    #[error("An exercise must keep at least one set")]
    LastSet,

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
    },

    #[error("No exercise at position {0}")]
    NoSuchExercise(usize),

    #[error("No set at position {set} for exercise {exercise}")]
    NoSuchSet { exercise: usize, set: usize },

    #[error("No workout in progress")]
    NoActiveSession,
}

/// Catalog loading errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate exercise id: {0}")]
    DuplicateExercise(String),

    #[error("Duplicate template id: {0}")]
    DuplicateTemplate(String),
}
