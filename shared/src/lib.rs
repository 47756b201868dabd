//! AppFitness Shared Library
//!
//! This crate contains the data model, the bundled exercise catalog and the
//! pure workout logic (rest timer, input parsing, progress aggregation) used
//! by the application engine and the WASM bindings.

pub mod catalog;
pub mod errors;
pub mod format;
pub mod models;
pub mod stats;
pub mod timer;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use catalog::{Catalog, ExerciseFilter};
pub use errors::*;
pub use format::*;
pub use models::*;
pub use timer::{RestTimer, TickOutcome, TimerPhase};
pub use types::*;
