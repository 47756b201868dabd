//! Progress aggregation
//!
//! Pure derivations over the workout history and progress entries: weekly
//! volume, training streak, recently used exercises, body-metric chart
//! series and the photo gallery.
//!
//! Inputs are the full lists as delivered by the data store, newest first.
//! Every function is deterministic and takes "today" explicitly, so callers
//! can recompute everything from scratch whenever a new snapshot arrives.

use crate::models::{BodyMetric, ProgressEntry, RecordedSet, WorkoutRecord};
use crate::types::{ChartPoint, ExerciseBreakdown, HistoryTotals, PhotoRef, WeeklyStats};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeSet;

/// Charts need at least this many points to draw a line
pub const MIN_CHART_POINTS: usize = 2;

/// Default number of names returned by [`recent_exercise_names`]
pub const RECENT_EXERCISE_LIMIT: usize = 4;

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(days_from_monday)
}

/// Count and summed volume of the workouts dated in the current week
pub fn weekly_stats(history: &[WorkoutRecord], today: NaiveDate) -> WeeklyStats {
    let start = week_start(today);
    let end = start + Duration::days(7);

    history
        .iter()
        .filter(|w| w.date >= start && w.date < end)
        .fold(WeeklyStats::default(), |mut acc, w| {
            acc.count += 1;
            acc.volume += w.total_volume;
            acc
        })
}

/// Consecutive training days ending today or yesterday.
///
/// Distinct workout dates are walked newest first. If the newest is older
/// than yesterday the streak is 0; otherwise each date exactly one day
/// before the previous one extends it, and the first gap ends it.
pub fn streak(history: &[WorkoutRecord], today: NaiveDate) -> u32 {
    let dates: BTreeSet<NaiveDate> = history.iter().map(|w| w.date).collect();
    let mut newest_first = dates.into_iter().rev();

    let Some(mut previous) = newest_first.next() else {
        return 0;
    };
    let yesterday = today - Duration::days(1);
    if previous < yesterday {
        return 0;
    }

    let mut streak = 1;
    for date in newest_first {
        if previous - date == Duration::days(1) {
            streak += 1;
            previous = date;
        } else {
            break;
        }
    }
    streak
}

/// First-seen exercise names walking the history newest first
pub fn recent_exercise_names(history: &[WorkoutRecord], limit: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(limit);
    if limit == 0 {
        return names;
    }

    for workout in history {
        for exercise in &workout.exercises {
            if !names.contains(&exercise.name) {
                names.push(exercise.name.clone());
                if names.len() >= limit {
                    return names;
                }
            }
        }
    }
    names
}

/// Chronological (date, value) points for one metric, skipping entries
/// where the metric was not recorded
pub fn chart_series(entries: &[ProgressEntry], metric: BodyMetric) -> Vec<ChartPoint> {
    entries
        .iter()
        .rev()
        .filter(|e| e.metric(metric) != 0.0)
        .map(|e| ChartPoint {
            date: e.date,
            value: e.metric(metric),
        })
        .collect()
}

/// True when a series has enough points to chart
pub fn has_enough_points(series: &[ChartPoint]) -> bool {
    series.len() >= MIN_CHART_POINTS
}

/// Change between the first and the last point of a series
pub fn chart_delta(series: &[ChartPoint]) -> Option<f64> {
    if !has_enough_points(series) {
        return None;
    }
    let first = series.first()?.value;
    let last = series.last()?.value;
    Some(last - first)
}

/// Smallest and largest value of a series
pub fn chart_bounds(series: &[ChartPoint]) -> Option<(f64, f64)> {
    let first = series.first()?.value;
    Some(series.iter().fold((first, first), |(min, max), p| {
        (min.min(p.value), max.max(p.value))
    }))
}

/// Every photo of every entry, in entry order
pub fn all_photos(entries: &[ProgressEntry]) -> Vec<PhotoRef> {
    entries
        .iter()
        .flat_map(|entry| {
            entry.photos.iter().map(move |uri| PhotoRef {
                uri: uri.clone(),
                date: entry.date,
                entry_id: entry.id.clone(),
            })
        })
        .collect()
}

/// Most recent progress entry
pub fn latest_entry(entries: &[ProgressEntry]) -> Option<&ProgressEntry> {
    entries.first()
}

/// Workout count, minutes and volume over the whole history
pub fn history_totals(history: &[WorkoutRecord]) -> HistoryTotals {
    history.iter().fold(HistoryTotals::default(), |mut acc, w| {
        acc.workouts += 1;
        acc.minutes += w.duration_minutes as u64;
        acc.volume += w.total_volume;
        acc
    })
}

/// Per-exercise volume and best set of a finished workout
pub fn exercise_breakdown(record: &WorkoutRecord) -> Vec<ExerciseBreakdown> {
    record
        .exercises
        .iter()
        .map(|exercise| {
            let best_set = exercise
                .sets
                .iter()
                .fold(None::<RecordedSet>, |best, set| match best {
                    Some(b) if set.volume() <= b.volume() => Some(b),
                    _ => Some(*set),
                });
            ExerciseBreakdown {
                name: exercise.name.clone(),
                muscle_group: exercise.muscle_group.clone(),
                volume: exercise.sets.iter().map(|s| s.volume()).sum(),
                best_set,
            }
        })
        .collect()
}
