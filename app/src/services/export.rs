//! Data export for a user's workouts and progress entries
//!
//! Supports two formats:
//! - JSON: full versioned document
//! - CSV: one table per collection for spreadsheets

use crate::error::{AppError, AppResult};
use crate::services::clock::Clock;
use appfitness_shared::validation::ValidationError;
use appfitness_shared::{ProgressEntry, WorkoutRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const EXPORT_VERSION: &str = "1.0";

/// Complete user data export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataExport {
    pub export_version: String,
    pub exported_at: DateTime<Utc>,
    pub user_id: String,
    pub workouts: Vec<WorkoutRecord>,
    pub progress: Vec<ProgressEntry>,
}

impl DataExport {
    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Export(format!("JSON serialization error: {}", e)))
    }

    pub fn from_json(text: &str) -> AppResult<Self> {
        serde_json::from_str(text).map_err(|e| {
            ValidationError::new("export", &format!("not a valid export ({})", e)).into()
        })
    }
}

/// One row per set of every workout
#[derive(Debug, Serialize)]
pub struct WorkoutCsvRow {
    pub date: String,
    pub workout: String,
    pub template: String,
    pub duration_minutes: u32,
    pub exercise: String,
    pub muscle_group: String,
    pub set_number: u32,
    pub reps: u32,
    pub weight_kg: f64,
    pub completed: bool,
}

/// Unrecorded metrics are left blank
#[derive(Debug, Serialize)]
pub struct ProgressCsvRow {
    pub date: String,
    pub weight_kg: Option<f64>,
    pub waist_cm: Option<f64>,
    pub chest_cm: Option<f64>,
    pub hip_cm: Option<f64>,
    pub photos: usize,
}

pub struct ExportService {
    clock: Arc<dyn Clock>,
}

impl ExportService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Export everything as one JSON document
    pub fn export_json(
        &self,
        user_id: &str,
        workouts: &[WorkoutRecord],
        progress: &[ProgressEntry],
    ) -> DataExport {
        info!(
            user_id,
            workouts = workouts.len(),
            progress = progress.len(),
            "Exporting user data"
        );
        DataExport {
            export_version: EXPORT_VERSION.to_string(),
            exported_at: self.clock.now(),
            user_id: user_id.to_string(),
            workouts: workouts.to_vec(),
            progress: progress.to_vec(),
        }
    }

    /// Export workout history as CSV
    pub fn workouts_csv(&self, workouts: &[WorkoutRecord]) -> AppResult<String> {
        let rows: Vec<WorkoutCsvRow> = workouts
            .iter()
            .flat_map(|w| {
                w.exercises.iter().flat_map(move |exercise| {
                    exercise.sets.iter().map(move |set| WorkoutCsvRow {
                        date: w.date.format("%Y-%m-%d").to_string(),
                        workout: w.name.clone(),
                        template: w.template_name.clone().unwrap_or_default(),
                        duration_minutes: w.duration_minutes,
                        exercise: exercise.name.clone(),
                        muscle_group: exercise.muscle_group.clone(),
                        set_number: set.set_number,
                        reps: set.reps,
                        weight_kg: set.weight,
                        completed: set.completed,
                    })
                })
            })
            .collect();

        Self::to_csv(&rows)
    }

    /// Export progress entries as CSV
    pub fn progress_csv(&self, entries: &[ProgressEntry]) -> AppResult<String> {
        let recorded = |v: f64| (v != 0.0).then_some(v);
        let rows: Vec<ProgressCsvRow> = entries
            .iter()
            .map(|e| ProgressCsvRow {
                date: e.date.format("%Y-%m-%d").to_string(),
                weight_kg: recorded(e.weight),
                waist_cm: recorded(e.waist),
                chest_cm: recorded(e.chest),
                hip_cm: recorded(e.hip),
                photos: e.photos.len(),
            })
            .collect();

        Self::to_csv(&rows)
    }

    /// Convert rows to a CSV string with a header line
    fn to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Export(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Export(format!("CSV flush error: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Export(format!("CSV encoding error: {}", e)))
    }
}
