//! Application error handling
//!
//! This module provides unified error handling for the engine, converting
//! internal errors to user-facing notices the UI layer can show.

use crate::repositories::StoreError;
use appfitness_shared::validation::ValidationError;
use appfitness_shared::PreconditionError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Engine error type that can be converted to a user-facing notice
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("Could not save your data")]
    Persistence(#[source] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Sign-in required")]
    AuthRequired,

    #[error("Sign-in failed: {0}")]
    Identity(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Configuration error")]
    Config(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what),
            StoreError::Unauthorized => AppError::AuthRequired,
            other => AppError::Persistence(other),
        }
    }
}

/// Message shown to the user for a failed operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorNotice {
    pub code: &'static str,
    pub title: String,
    pub message: String,
    /// The same action may succeed if tried again
    pub retryable: bool,
}

impl AppError {
    /// Convert to the notice shown to the user. Failures the user did not
    /// cause are logged here, once.
    pub fn notice(&self) -> ErrorNotice {
        let (code, title, message, retryable) = match self {
            AppError::Validation(err) => {
                ("VALIDATION_ERROR", "Check your input", err.user_message(), false)
            }
            AppError::Precondition(err) => {
                ("PRECONDITION_FAILED", precondition_title(err), err.to_string(), false)
            }
            AppError::NotFound(msg) => ("NOT_FOUND", "Not found", msg.clone(), false),
            AppError::AuthRequired => (
                "AUTH_REQUIRED",
                "Signed out",
                "Please sign in again to keep saving your data.".to_string(),
                false,
            ),
            AppError::Identity(msg) => {
                warn!("Sign-in failed: {}", msg);
                (
                    "SIGN_IN_FAILED",
                    "Sign-in failed",
                    "We could not sign you in. Please try again.".to_string(),
                    true,
                )
            }
            AppError::Persistence(err) => {
                error!("Persistence error: {:?}", err);
                (
                    "PERSISTENCE_ERROR",
                    "Could not save",
                    "Something went wrong while saving. Your changes are still here, please try again."
                        .to_string(),
                    true,
                )
            }
            AppError::Export(msg) => {
                error!("Export failed: {}", msg);
                (
                    "EXPORT_FAILED",
                    "Export failed",
                    "Your data could not be exported. Please try again.".to_string(),
                    true,
                )
            }
            AppError::Config(err) => {
                error!("Configuration error: {:?}", err);
                (
                    "CONFIG_ERROR",
                    "Setup problem",
                    "The app is not configured correctly.".to_string(),
                    false,
                )
            }
        };

        ErrorNotice {
            code,
            title: title.to_string(),
            message,
            retryable,
        }
    }
}

fn precondition_title(err: &PreconditionError) -> &'static str {
    match err {
        PreconditionError::EmptyProgressEntry => "Nothing to save",
        PreconditionError::LastSet => "Can't remove set",
        PreconditionError::OutOfRange { .. } => "Check your input",
        PreconditionError::NoSuchExercise(_) | PreconditionError::NoSuchSet { .. } => {
            "Item no longer exists"
        }
        PreconditionError::NoActiveSession => "No workout in progress",
    }
}

/// Result type alias for engine operations
pub type AppResult<T> = Result<T, AppError>;
