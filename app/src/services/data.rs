//! Data access facade
//!
//! The only way the engine reads or writes persisted data. Every operation
//! is scoped to one user; with no signed-in user reads are empty and writes
//! do nothing. Subscribers receive the user's full, newest-first list after
//! every change and must treat each emission as replacing the last.

use crate::error::AppResult;
use crate::repositories::{UserScope, WorkoutStore};
use appfitness_shared::{ProgressEntry, WorkoutRecord};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Replace-all snapshot of a collection
pub type Snapshot<T> = Arc<Vec<T>>;

pub struct DataFacade {
    store: Arc<dyn WorkoutStore>,
    workouts: watch::Sender<Snapshot<WorkoutRecord>>,
    progress: watch::Sender<Snapshot<ProgressEntry>>,
}

impl DataFacade {
    pub fn new(store: Arc<dyn WorkoutStore>) -> Self {
        let (workouts, _) = watch::channel(Arc::new(Vec::new()));
        let (progress, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            store,
            workouts,
            progress,
        }
    }

    /// Workout history stream, newest first
    pub fn subscribe_workouts(&self) -> watch::Receiver<Snapshot<WorkoutRecord>> {
        self.workouts.subscribe()
    }

    /// Progress entry stream, newest first
    pub fn subscribe_progress(&self) -> watch::Receiver<Snapshot<ProgressEntry>> {
        self.progress.subscribe()
    }

    pub fn workouts(&self) -> Snapshot<WorkoutRecord> {
        self.workouts.borrow().clone()
    }

    pub fn progress(&self) -> Snapshot<ProgressEntry> {
        self.progress.borrow().clone()
    }

    /// Reload both collections for the user, or publish empty lists
    pub async fn refresh(&self, scope: Option<&UserScope>) -> AppResult<()> {
        let Some(scope) = scope else {
            self.clear();
            return Ok(());
        };

        let workouts = self.store.list_workouts(scope).await?;
        let progress = self.store.list_progress(scope).await?;
        debug!(
            user_id = %scope.user_id,
            workouts = workouts.len(),
            progress = progress.len(),
            "Snapshots refreshed"
        );
        self.workouts.send_replace(Arc::new(workouts));
        self.progress.send_replace(Arc::new(progress));
        Ok(())
    }

    /// Check that the backing store is reachable
    pub async fn health_check(&self) -> AppResult<()> {
        self.store.health_check().await?;
        Ok(())
    }

    /// Publish empty snapshots
    pub fn clear(&self) {
        self.workouts.send_replace(Arc::new(Vec::new()));
        self.progress.send_replace(Arc::new(Vec::new()));
    }

    /// Store a finished workout. Returns the stored copy, or None when no
    /// user is signed in.
    pub async fn add_workout(
        &self,
        scope: Option<&UserScope>,
        record: &WorkoutRecord,
    ) -> AppResult<Option<WorkoutRecord>> {
        let Some(scope) = scope else {
            debug!("No signed-in user; workout not stored");
            return Ok(None);
        };

        let stored = self.store.add_workout(scope, record).await?;
        self.republish_workouts(scope, |list| list.insert(0, stored.clone()))
            .await;
        Ok(Some(stored))
    }

    /// Returns whether a record was removed
    pub async fn delete_workout(&self, scope: Option<&UserScope>, id: &str) -> AppResult<bool> {
        let Some(scope) = scope else {
            return Ok(false);
        };

        let deleted = self.store.delete_workout(scope, id).await?;
        if deleted {
            self.republish_workouts(scope, |list| list.retain(|w| w.id != id))
                .await;
        }
        Ok(deleted)
    }

    pub async fn add_progress_entry(
        &self,
        scope: Option<&UserScope>,
        entry: &ProgressEntry,
    ) -> AppResult<Option<ProgressEntry>> {
        let Some(scope) = scope else {
            debug!("No signed-in user; progress entry not stored");
            return Ok(None);
        };

        let stored = self.store.add_progress(scope, entry).await?;
        self.republish_progress(scope, |list| list.insert(0, stored.clone()))
            .await;
        Ok(Some(stored))
    }

    pub async fn delete_progress_entry(
        &self,
        scope: Option<&UserScope>,
        id: &str,
    ) -> AppResult<bool> {
        let Some(scope) = scope else {
            return Ok(false);
        };

        let deleted = self.store.delete_progress(scope, id).await?;
        if deleted {
            self.republish_progress(scope, |list| list.retain(|p| p.id != id))
                .await;
        }
        Ok(deleted)
    }

    /// Replace one entry's photo list in a single store write
    pub async fn update_progress_photos(
        &self,
        scope: Option<&UserScope>,
        id: &str,
        photos: &[String],
    ) -> AppResult<Option<ProgressEntry>> {
        let Some(scope) = scope else {
            return Ok(None);
        };

        let updated = self.store.update_progress_photos(scope, id, photos).await?;
        self.republish_progress(scope, |list| {
            if let Some(entry) = list.iter_mut().find(|p| p.id == updated.id) {
                *entry = updated.clone();
            }
        })
        .await;
        Ok(Some(updated))
    }

    /// Re-list after a write. If the re-list fails the write still stands,
    /// so the local snapshot is patched instead.
    async fn republish_workouts(
        &self,
        scope: &UserScope,
        patch: impl FnOnce(&mut Vec<WorkoutRecord>),
    ) {
        match self.store.list_workouts(scope).await {
            Ok(list) => {
                self.workouts.send_replace(Arc::new(list));
            }
            Err(e) => {
                warn!(error = %e, "Could not re-list workouts after write");
                let mut list = self.workouts().as_ref().clone();
                patch(&mut list);
                self.workouts.send_replace(Arc::new(list));
            }
        }
    }

    async fn republish_progress(
        &self,
        scope: &UserScope,
        patch: impl FnOnce(&mut Vec<ProgressEntry>),
    ) {
        match self.store.list_progress(scope).await {
            Ok(list) => {
                self.progress.send_replace(Arc::new(list));
            }
            Err(e) => {
                warn!(error = %e, "Could not re-list progress after write");
                let mut list = self.progress().as_ref().clone();
                patch(&mut list);
                self.progress.send_replace(Arc::new(list));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryStore;
    use chrono::NaiveDate;

    fn record(id: &str) -> WorkoutRecord {
        WorkoutRecord {
            id: id.to_string(),
            name: "Legs".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            duration_minutes: 30,
            total_sets: 3,
            total_volume: 900.0,
            template_name: None,
            exercises: vec![],
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_reads_empty_and_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let facade = DataFacade::new(store.clone());

        assert!(facade.add_workout(None, &record("w1")).await.unwrap().is_none());
        assert!(!facade.delete_workout(None, "w1").await.unwrap());
        facade.refresh(None).await.unwrap();
        assert!(facade.workouts().is_empty());
        assert!(store
            .list_workouts(&UserScope::new("anyone"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_write_publishes_full_snapshot() {
        let facade = DataFacade::new(Arc::new(MemoryStore::new()));
        let scope = UserScope::new("u1");
        let mut rx = facade.subscribe_workouts();

        facade.add_workout(Some(&scope), &record("w1")).await.unwrap();
        facade.add_workout(Some(&scope), &record("w2")).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let ids: Vec<String> = rx.borrow_and_update().iter().map(|w| w.id.clone()).collect();
        assert_eq!(ids, vec!["w2", "w1"]);
    }

    #[tokio::test]
    async fn test_clear_empties_snapshots() {
        let facade = DataFacade::new(Arc::new(MemoryStore::new()));
        let scope = UserScope::new("u1");
        facade.add_workout(Some(&scope), &record("w1")).await.unwrap();

        facade.clear();
        assert!(facade.workouts().is_empty());
        assert!(facade.progress().is_empty());
    }
}
