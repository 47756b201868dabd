//! Body progress entries: saving, deleting and photo removal

use crate::error::{AppError, AppResult};
use crate::repositories::UserScope;
use crate::services::clock::Clock;
use crate::services::data::DataFacade;
use crate::services::ids::IdGenerator;
use appfitness_shared::validation::{check_progress_entry, BodyMeasurements};
use appfitness_shared::ProgressEntry;
use std::sync::Arc;
use tracing::{debug, info};

/// Text fields and photos of the progress form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressDraft {
    pub weight: String,
    pub waist: String,
    pub chest: String,
    pub hip: String,
    /// Opaque photo URIs
    pub photos: Vec<String>,
}

impl ProgressDraft {
    pub fn measurements(&self) -> BodyMeasurements {
        BodyMeasurements::parse(&self.weight, &self.waist, &self.chest, &self.hip)
    }

    pub fn add_photo(&mut self, uri: impl Into<String>) {
        self.photos.push(uri.into());
    }

    pub fn remove_photo(&mut self, index: usize) -> Option<String> {
        (index < self.photos.len()).then(|| self.photos.remove(index))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What happened to an entry when one of its photos was removed
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoRemoval {
    Updated(ProgressEntry),
    /// The entry had nothing left and was deleted
    EntryDeleted,
    /// No user signed in; nothing changed
    Skipped,
}

pub struct ProgressService {
    data: Arc<DataFacade>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl ProgressService {
    pub fn new(data: Arc<DataFacade>, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { data, ids, clock }
    }

    /// Save the draft as a new entry dated today and clear it.
    ///
    /// The save precondition is checked before any store call. On any
    /// failure the draft is left as it was.
    pub async fn save(
        &self,
        scope: Option<&UserScope>,
        draft: &mut ProgressDraft,
    ) -> AppResult<Option<ProgressEntry>> {
        let measurements = draft.measurements();
        check_progress_entry(&measurements, draft.photos.len())?;

        let entry = ProgressEntry {
            id: self.ids.next_id("progress"),
            date: self.clock.today(),
            weight: measurements.weight,
            waist: measurements.waist,
            chest: measurements.chest,
            hip: measurements.hip,
            photos: draft.photos.clone(),
            created_at: None,
        };

        let stored = self.data.add_progress_entry(scope, &entry).await?;
        if let Some(stored) = &stored {
            info!(
                entry_id = %stored.id,
                photos = stored.photos.len(),
                "Progress entry saved"
            );
        }
        draft.clear();
        Ok(stored)
    }

    pub async fn delete(&self, scope: Option<&UserScope>, entry_id: &str) -> AppResult<bool> {
        let deleted = self.data.delete_progress_entry(scope, entry_id).await?;
        if deleted {
            info!(entry_id, "Progress entry deleted");
        }
        Ok(deleted)
    }

    /// Remove one photo from an entry in a single write. An entry left with
    /// no photos and no metrics is deleted instead.
    pub async fn remove_photo(
        &self,
        scope: Option<&UserScope>,
        entry_id: &str,
        uri: &str,
    ) -> AppResult<PhotoRemoval> {
        if scope.is_none() {
            return Ok(PhotoRemoval::Skipped);
        }

        let snapshot = self.data.progress();
        let entry = snapshot
            .iter()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| AppError::NotFound(format!("progress entry {}", entry_id)))?;

        if !entry.photos.iter().any(|p| p == uri) {
            debug!(entry_id, "Photo already gone");
            return Ok(PhotoRemoval::Updated(entry.clone()));
        }

        let remaining: Vec<String> = entry.photos.iter().filter(|p| *p != uri).cloned().collect();

        if remaining.is_empty() && !entry.has_metrics() {
            self.data.delete_progress_entry(scope, entry_id).await?;
            info!(entry_id, "Removed last photo; entry deleted");
            return Ok(PhotoRemoval::EntryDeleted);
        }

        match self.data.update_progress_photos(scope, entry_id, &remaining).await? {
            Some(updated) => {
                info!(entry_id, photos = updated.photos.len(), "Photo removed");
                Ok(PhotoRemoval::Updated(updated))
            }
            None => Ok(PhotoRemoval::Skipped),
        }
    }
}
