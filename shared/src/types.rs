//! Derived view types produced by the progress aggregator

use crate::models::{RecordedSet, WorkoutRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Workouts in the current Monday-based week
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub count: usize,
    pub volume: f64,
}

/// One point of a body-metric chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A progress photo together with the entry that owns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    pub uri: String,
    pub date: NaiveDate,
    pub entry_id: String,
}

/// Lifetime totals shown above the workout history
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryTotals {
    pub workouts: usize,
    pub minutes: u64,
    pub volume: f64,
}

/// Per-exercise summary of a finished workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseBreakdown {
    pub name: String,
    pub muscle_group: String,
    pub volume: f64,
    /// Set with the largest reps x weight; the first one wins on ties
    pub best_set: Option<RecordedSet>,
}

/// Greeting bucket for the home screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

impl DayPeriod {
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            DayPeriod::Morning
        } else if hour < 20 {
            DayPeriod::Afternoon
        } else {
            DayPeriod::Evening
        }
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "Good morning",
            DayPeriod::Afternoon => "Good afternoon",
            DayPeriod::Evening => "Good evening",
        }
    }
}

/// Everything the home screen shows, recomputed on every data snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub weekly: WeeklyStats,
    pub streak: u32,
    pub last_workout: Option<WorkoutRecord>,
    pub recent_exercises: Vec<String>,
    pub latest_weight: Option<f64>,
    pub has_history: bool,
}
