//! In-process store, used when nothing should outlive the process

use super::{Collection, StoreError, StoreResult, UserScope, WorkoutStore};
use appfitness_shared::{ProgressEntry, WorkoutRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Documents {
    // newest first
    workouts: HashMap<String, Vec<WorkoutRecord>>,
    progress: HashMap<String, Vec<ProgressEntry>>,
}

/// Store backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<Documents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(collection: Collection, id: &str) -> StoreError {
    StoreError::NotFound(format!("{} document {}", collection, id))
}

#[async_trait]
impl WorkoutStore for MemoryStore {
    async fn list_workouts(&self, scope: &UserScope) -> StoreResult<Vec<WorkoutRecord>> {
        let docs = self.documents.read().await;
        Ok(docs.workouts.get(&scope.user_id).cloned().unwrap_or_default())
    }

    async fn add_workout(
        &self,
        scope: &UserScope,
        record: &WorkoutRecord,
    ) -> StoreResult<WorkoutRecord> {
        let mut stored = record.clone();
        stored.created_at = Some(Utc::now());

        let mut docs = self.documents.write().await;
        let list = docs.workouts.entry(scope.user_id.clone()).or_default();
        if list.iter().any(|w| w.id == stored.id) {
            return Err(StoreError::AlreadyExists(format!("workouts/{}", stored.id)));
        }
        list.insert(0, stored.clone());
        Ok(stored)
    }

    async fn delete_workout(&self, scope: &UserScope, id: &str) -> StoreResult<bool> {
        let mut docs = self.documents.write().await;
        let Some(list) = docs.workouts.get_mut(&scope.user_id) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|w| w.id != id);
        Ok(list.len() != before)
    }

    async fn list_progress(&self, scope: &UserScope) -> StoreResult<Vec<ProgressEntry>> {
        let docs = self.documents.read().await;
        Ok(docs.progress.get(&scope.user_id).cloned().unwrap_or_default())
    }

    async fn add_progress(
        &self,
        scope: &UserScope,
        entry: &ProgressEntry,
    ) -> StoreResult<ProgressEntry> {
        let mut stored = entry.clone();
        stored.created_at = Some(Utc::now());

        let mut docs = self.documents.write().await;
        let list = docs.progress.entry(scope.user_id.clone()).or_default();
        if list.iter().any(|p| p.id == stored.id) {
            return Err(StoreError::AlreadyExists(format!("progress/{}", stored.id)));
        }
        list.insert(0, stored.clone());
        Ok(stored)
    }

    async fn delete_progress(&self, scope: &UserScope, id: &str) -> StoreResult<bool> {
        let mut docs = self.documents.write().await;
        let Some(list) = docs.progress.get_mut(&scope.user_id) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|p| p.id != id);
        Ok(list.len() != before)
    }

    async fn update_progress_photos(
        &self,
        scope: &UserScope,
        id: &str,
        photos: &[String],
    ) -> StoreResult<ProgressEntry> {
        let mut docs = self.documents.write().await;
        let entry = docs
            .progress
            .get_mut(&scope.user_id)
            .and_then(|list| list.iter_mut().find(|p| p.id == id))
            .ok_or_else(|| not_found(Collection::Progress, id))?;
        entry.photos = photos.to_vec();
        Ok(entry.clone())
    }
}
