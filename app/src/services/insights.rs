//! Home screen and progress screen derivations
//!
//! [`Dashboard`] watches the workout and progress snapshots and rebuilds its
//! summary from scratch on every call. Nothing is cached or updated
//! incrementally, so a snapshot that replaces the whole list (including one
//! that shrinks it) and a date change at midnight are always reflected.

use crate::services::clock::Clock;
use crate::services::data::{DataFacade, Snapshot};
use appfitness_shared::stats::{
    all_photos, chart_bounds, chart_delta, chart_series, has_enough_points, history_totals,
    recent_exercise_names, streak, weekly_stats,
};
use appfitness_shared::{
    BodyMetric, ChartPoint, DashboardSummary, DayPeriod, HistoryTotals, PhotoRef, ProgressEntry,
    WorkoutRecord,
};
use std::sync::Arc;
use tokio::sync::watch;

/// A body-metric chart ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct MetricChart {
    pub metric: BodyMetric,
    pub points: Vec<ChartPoint>,
    /// Last minus first value
    pub delta: Option<f64>,
    pub bounds: Option<(f64, f64)>,
}

impl MetricChart {
    pub fn is_drawable(&self) -> bool {
        has_enough_points(&self.points)
    }
}

pub struct Dashboard {
    workouts: watch::Receiver<Snapshot<WorkoutRecord>>,
    progress: watch::Receiver<Snapshot<ProgressEntry>>,
    clock: Arc<dyn Clock>,
    recent_limit: usize,
}

impl Dashboard {
    pub fn new(data: &DataFacade, clock: Arc<dyn Clock>, recent_limit: usize) -> Self {
        Self {
            workouts: data.subscribe_workouts(),
            progress: data.subscribe_progress(),
            clock,
            recent_limit,
        }
    }

    /// Summary of the latest snapshots as of today
    pub fn summary(&self) -> DashboardSummary {
        let workouts = self.workouts.borrow().clone();
        let progress = self.progress.borrow().clone();
        let today = self.clock.today();

        DashboardSummary {
            weekly: weekly_stats(&workouts, today),
            streak: streak(&workouts, today),
            last_workout: workouts.first().cloned(),
            recent_exercises: recent_exercise_names(&workouts, self.recent_limit),
            latest_weight: progress.iter().map(|e| e.weight).find(|w| *w != 0.0),
            has_history: !workouts.is_empty(),
        }
    }

    /// Wait for the next snapshot of either collection, then call
    /// [`summary`](Self::summary) again. Returns false once the data facade
    /// is gone.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            res = self.workouts.changed() => res.is_ok(),
            res = self.progress.changed() => res.is_ok(),
        }
    }

    pub fn greeting(&self) -> DayPeriod {
        DayPeriod::from_hour(self.clock.local_hour())
    }

    pub fn chart(&self, metric: BodyMetric) -> MetricChart {
        let entries = self.progress.borrow().clone();
        let points = chart_series(&entries, metric);
        MetricChart {
            metric,
            delta: chart_delta(&points),
            bounds: chart_bounds(&points),
            points,
        }
    }

    /// Photo gallery, newest entry first
    pub fn photos(&self) -> Vec<PhotoRef> {
        all_photos(&self.progress.borrow())
    }

    pub fn history_totals(&self) -> HistoryTotals {
        history_totals(&self.workouts.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MemoryStore, UserScope};
    use crate::services::clock::FixedClock;
    use appfitness_shared::{RecordedExercise, RecordedSet};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn workout(id: &str, date: NaiveDate, exercise: &str) -> WorkoutRecord {
        WorkoutRecord {
            id: id.to_string(),
            name: "Push".to_string(),
            date,
            duration_minutes: 40,
            total_sets: 1,
            total_volume: 800.0,
            template_name: None,
            exercises: vec![RecordedExercise {
                name: exercise.to_string(),
                muscle_group: "Chest".to_string(),
                sets: vec![RecordedSet {
                    set_number: 1,
                    reps: 10,
                    weight: 80.0,
                    completed: true,
                }],
            }],
            created_at: None,
        }
    }

    fn progress(id: &str, date: NaiveDate, weight: f64) -> ProgressEntry {
        ProgressEntry {
            id: id.to_string(),
            date,
            weight,
            waist: 0.0,
            chest: 0.0,
            hip: 0.0,
            photos: vec![format!("file://{}.jpg", id)],
            created_at: None,
        }
    }

    async fn setup() -> (Arc<DataFacade>, Dashboard, UserScope) {
        let (data, dashboard, scope, _) = setup_with_clock().await;
        (data, dashboard, scope)
    }

    async fn setup_with_clock() -> (Arc<DataFacade>, Dashboard, UserScope, Arc<FixedClock>) {
        let data = Arc::new(DataFacade::new(Arc::new(MemoryStore::new())));
        // Wednesday
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 12, 18, 0, 0).unwrap(),
        ));
        let dashboard = Dashboard::new(&data, clock.clone(), 4);
        (data, dashboard, UserScope::new("u1"), clock)
    }

    #[tokio::test]
    async fn test_empty_history() {
        let (_, dashboard, _) = setup().await;
        let summary = dashboard.summary();
        assert_eq!(summary, DashboardSummary::default());
        assert!(!summary.has_history);
    }

    #[tokio::test]
    async fn test_summary_follows_snapshots() {
        let (data, dashboard, scope) = setup().await;
        data.add_workout(Some(&scope), &workout("w1", day(10), "Squat"))
            .await
            .unwrap();
        data.add_workout(Some(&scope), &workout("w2", day(11), "Bench Press"))
            .await
            .unwrap();

        let summary = dashboard.summary();
        assert_eq!(summary.weekly.count, 2);
        assert_eq!(summary.weekly.volume, 1600.0);
        assert_eq!(summary.streak, 2);
        assert_eq!(summary.last_workout.map(|w| w.id), Some("w2".to_string()));
        assert_eq!(summary.recent_exercises, vec!["Bench Press", "Squat"]);

        data.delete_workout(Some(&scope), "w2").await.unwrap();
        let summary = dashboard.summary();
        assert_eq!(summary.weekly.count, 1);
        assert_eq!(summary.recent_exercises, vec!["Squat"]);
    }

    #[tokio::test]
    async fn test_cleared_snapshot_resets_summary() {
        let (data, dashboard, scope) = setup().await;
        data.add_workout(Some(&scope), &workout("w1", day(12), "Squat"))
            .await
            .unwrap();
        assert!(dashboard.summary().has_history);

        data.clear();
        assert_eq!(dashboard.summary(), DashboardSummary::default());
    }

    #[tokio::test]
    async fn test_chart_and_latest_weight() {
        let (data, dashboard, scope) = setup().await;
        data.add_progress_entry(Some(&scope), &progress("p1", day(1), 82.0))
            .await
            .unwrap();
        data.add_progress_entry(Some(&scope), &progress("p2", day(8), 0.0))
            .await
            .unwrap();
        data.add_progress_entry(Some(&scope), &progress("p3", day(12), 80.5))
            .await
            .unwrap();

        assert_eq!(dashboard.summary().latest_weight, Some(80.5));

        let chart = dashboard.chart(BodyMetric::Weight);
        assert!(chart.is_drawable());
        assert_eq!(chart.points.len(), 2);
        assert_eq!(chart.points[0].date, day(1));
        assert_eq!(chart.delta, Some(-1.5));
        assert_eq!(chart.bounds, Some((80.5, 82.0)));

        assert!(!dashboard.chart(BodyMetric::Waist).is_drawable());
        assert_eq!(dashboard.photos().len(), 3);
        assert_eq!(dashboard.photos()[0].entry_id, "p3");
    }

    #[tokio::test]
    async fn test_changed_wakes_on_write() {
        let (data, mut dashboard, scope) = setup().await;
        dashboard.summary();

        let writer = {
            let data = data.clone();
            tokio::spawn(async move {
                data.add_workout(Some(&scope), &workout("w1", day(12), "Row"))
                    .await
                    .unwrap();
            })
        };
        assert!(dashboard.changed().await);
        writer.await.unwrap();
        assert_eq!(dashboard.summary().streak, 1);
    }

    #[tokio::test]
    async fn test_greeting_uses_local_hour() {
        let (_, dashboard, _) = setup().await;
        assert_eq!(dashboard.greeting(), DayPeriod::Afternoon);
        assert_eq!(dashboard.greeting().greeting(), "Good afternoon");
    }

    #[tokio::test]
    async fn test_summary_follows_the_calendar() {
        let (data, dashboard, scope, clock) = setup_with_clock().await;
        data.add_workout(Some(&scope), &workout("w1", day(12), "Squat"))
            .await
            .unwrap();
        let summary = dashboard.summary();
        assert_eq!(summary.streak, 1);
        assert_eq!(summary.weekly.count, 1);

        clock.advance(chrono::Duration::days(3));
        let summary = dashboard.summary();
        assert_eq!(summary.streak, 0);
        // Saturday, same week
        assert_eq!(summary.weekly.count, 1);

        clock.advance(chrono::Duration::days(2));
        assert_eq!(dashboard.summary().weekly.count, 0);
        assert!(dashboard.summary().has_history);
    }
}
