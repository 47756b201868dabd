//! Document stores
//!
//! Every backend keeps two collections per user, workouts and progress
//! entries, and lists them newest first by the creation time the store
//! assigned on write.

pub mod cloud;
pub mod memory;
pub mod sqlite;

pub use cloud::CloudStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use appfitness_shared::{ProgressEntry, WorkoutRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use thiserror::Error;

/// Store-level failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Remote store returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Credentials rejected by the store")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored documents are never overwritten
    #[error("Document already exists: {0}")]
    AlreadyExists(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The two per-user collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Workouts,
    Progress,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Workouts => "workouts",
            Collection::Progress => "progress",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted document type and the collection it lives in
pub(crate) trait Document: Serialize + DeserializeOwned + Clone + Send + Sync {
    const COLLECTION: Collection;
    fn id(&self) -> &str;
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn set_created_at(&mut self, at: Option<DateTime<Utc>>);
}

impl Document for WorkoutRecord {
    const COLLECTION: Collection = Collection::Workouts;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn set_created_at(&mut self, at: Option<DateTime<Utc>>) {
        self.created_at = at;
    }
}

impl Document for ProgressEntry {
    const COLLECTION: Collection = Collection::Progress;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn set_created_at(&mut self, at: Option<DateTime<Utc>>) {
        self.created_at = at;
    }
}

/// Owner of the documents an operation touches
#[derive(Debug, Clone)]
pub struct UserScope {
    pub user_id: String,
    /// Bearer token for remote stores; local stores ignore it
    pub id_token: Option<SecretString>,
}

impl UserScope {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            id_token: None,
        }
    }

    pub fn with_token(user_id: impl Into<String>, id_token: SecretString) -> Self {
        Self {
            user_id: user_id.into(),
            id_token: Some(id_token),
        }
    }
}

/// Persistence for workout records and progress entries
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// All workout records of the user, newest first
    async fn list_workouts(&self, scope: &UserScope) -> StoreResult<Vec<WorkoutRecord>>;

    /// Store a record; the returned copy carries the assigned `created_at`
    async fn add_workout(
        &self,
        scope: &UserScope,
        record: &WorkoutRecord,
    ) -> StoreResult<WorkoutRecord>;

    /// Returns false if no such record existed
    async fn delete_workout(&self, scope: &UserScope, id: &str) -> StoreResult<bool>;

    /// All progress entries of the user, newest first
    async fn list_progress(&self, scope: &UserScope) -> StoreResult<Vec<ProgressEntry>>;

    async fn add_progress(
        &self,
        scope: &UserScope,
        entry: &ProgressEntry,
    ) -> StoreResult<ProgressEntry>;

    /// Returns false if no such entry existed
    async fn delete_progress(&self, scope: &UserScope, id: &str) -> StoreResult<bool>;

    /// Replace the photo list of one entry in a single write
    async fn update_progress_photos(
        &self,
        scope: &UserScope,
        id: &str,
        photos: &[String],
    ) -> StoreResult<ProgressEntry>;

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
