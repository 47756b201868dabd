//! Data models for the AppFitness application
//!
//! Catalog types (`Exercise`, `WorkoutTemplate`) are read-only and loaded from
//! the bundled catalog. Session types (`WorkoutSet`, `ExerciseInstance`) live
//! only while a workout is being edited. `WorkoutRecord` and `ProgressEntry`
//! are the persisted documents; their JSON field names are camelCase so the
//! same documents can be read by every backend.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Catalog
// ============================================================================

/// Experience level of a catalog exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 3] = [
        ExperienceLevel::Beginner,
        ExperienceLevel::Intermediate,
        ExperienceLevel::Advanced,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "Beginner",
            ExperienceLevel::Intermediate => "Intermediate",
            ExperienceLevel::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Exercise library entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    pub equipment: String,
    pub level: ExperienceLevel,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub primary_muscles: Vec<String>,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
}

/// Target reps and weight for one set of a template
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrescribedSet {
    pub reps: u32,
    /// Weight in kg
    pub weight: f64,
}

/// One exercise of a template with its prescribed sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateExercise {
    pub exercise_id: String,
    pub sets: Vec<PrescribedSet>,
}

/// Named, reusable prescription used to seed a new session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    pub exercises: Vec<TemplateExercise>,
}

impl WorkoutTemplate {
    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

// ============================================================================
// Active session
// ============================================================================

/// A set inside an active session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: String,
    /// 1-based, contiguous within its exercise
    pub set_number: u32,
    pub reps: u32,
    /// Weight in kg
    pub weight: f64,
    pub completed: bool,
}

impl WorkoutSet {
    pub fn volume(&self) -> f64 {
        self.reps as f64 * self.weight
    }
}

/// One exercise as used within a specific session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseInstance {
    /// Unique per session; the same catalog exercise may be added twice
    pub instance_id: String,
    pub exercise_id: String,
    pub name: String,
    pub muscle_group: String,
    pub equipment: String,
    pub sets: Vec<WorkoutSet>,
}

impl ExerciseInstance {
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(WorkoutSet::volume).sum()
    }

    /// Re-assign set numbers so they read 1..N in list order
    pub fn renumber_sets(&mut self) {
        for (i, set) in self.sets.iter_mut().enumerate() {
            set.set_number = i as u32 + 1;
        }
    }
}

// ============================================================================
// Persisted documents
// ============================================================================

/// Frozen copy of a set inside a finished workout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedSet {
    pub set_number: u32,
    pub reps: u32,
    pub weight: f64,
    pub completed: bool,
}

impl RecordedSet {
    pub fn volume(&self) -> f64 {
        self.reps as f64 * self.weight
    }
}

impl From<&WorkoutSet> for RecordedSet {
    fn from(set: &WorkoutSet) -> Self {
        Self {
            set_number: set.set_number,
            reps: set.reps,
            weight: set.weight,
            completed: set.completed,
        }
    }
}

/// Frozen copy of an exercise inside a finished workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedExercise {
    pub name: String,
    pub muscle_group: String,
    pub sets: Vec<RecordedSet>,
}

impl From<&ExerciseInstance> for RecordedExercise {
    fn from(instance: &ExerciseInstance) -> Self {
        Self {
            name: instance.name.clone(),
            muscle_group: instance.muscle_group.clone(),
            sets: instance.sets.iter().map(RecordedSet::from).collect(),
        }
    }
}

/// Immutable summary of a finished workout session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    /// Always at least 1
    pub duration_minutes: u32,
    pub total_sets: u32,
    /// Sum of reps x weight across every set, completed or not
    pub total_volume: f64,
    #[serde(default)]
    pub template_name: Option<String>,
    pub exercises: Vec<RecordedExercise>,
    /// Assigned by the store when the record is written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body metric tracked by progress entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMetric {
    Weight,
    Waist,
    Chest,
    Hip,
}

impl BodyMetric {
    pub const ALL: [BodyMetric; 4] = [
        BodyMetric::Weight,
        BodyMetric::Waist,
        BodyMetric::Chest,
        BodyMetric::Hip,
    ];

    pub fn unit(&self) -> &'static str {
        match self {
            BodyMetric::Weight => "kg",
            BodyMetric::Waist | BodyMetric::Chest | BodyMetric::Hip => "cm",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BodyMetric::Weight => "Weight",
            BodyMetric::Waist => "Waist",
            BodyMetric::Chest => "Chest",
            BodyMetric::Hip => "Hip",
        }
    }
}

impl fmt::Display for BodyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Dated snapshot of body metrics and/or photos
///
/// A metric value of 0 means "not recorded".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub waist: f64,
    #[serde(default)]
    pub chest: f64,
    #[serde(default)]
    pub hip: f64,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProgressEntry {
    pub fn metric(&self, metric: BodyMetric) -> f64 {
        match metric {
            BodyMetric::Weight => self.weight,
            BodyMetric::Waist => self.waist,
            BodyMetric::Chest => self.chest,
            BodyMetric::Hip => self.hip,
        }
    }

    pub fn has_metrics(&self) -> bool {
        BodyMetric::ALL.iter().any(|m| self.metric(*m) != 0.0)
    }

    /// True when the entry carries at least one metric or photo
    pub fn has_data(&self) -> bool {
        self.has_metrics() || !self.photos.is_empty()
    }
}

/// Signed-in user as exposed by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}
