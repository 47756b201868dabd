//! Integration tests for the workout session lifecycle

mod common;

use appfitness_app::error::AppError;
use appfitness_app::repositories::{SqliteStore, UserScope, WorkoutStore};
use appfitness_app::services::FinishOutcome;
use appfitness_shared::PreconditionError;
use chrono::Duration;

#[tokio::test]
async fn test_template_workout_is_saved_and_summarized() {
    let app = common::TestApp::signed_in("ana").await;
    let template = app.state.catalog.template("push-day").unwrap().clone();

    {
        let mut editor = app.state.session.lock().await;
        editor.start_from_template(&template);
        assert_eq!(editor.total_sets(), 10);
        assert_eq!(editor.total_volume(), 2520.0);

        editor.toggle_set_completed(0, 0).unwrap();
        editor.update_set_weight(0, 0, "42,5").unwrap();
        editor.rename("Monday push").unwrap();
    }
    app.clock.advance(Duration::minutes(47));

    let outcome = app.state.finish_workout().await.unwrap();
    let FinishOutcome::Saved(record) = outcome else {
        panic!("expected the workout to be saved");
    };
    assert_eq!(record.name, "Monday push");
    assert_eq!(record.template_name.as_deref(), Some("Push Day"));
    assert_eq!(record.duration_minutes, 47);
    assert_eq!(record.total_sets, 10);
    assert_eq!(record.total_volume, 2545.0);
    assert!(record.exercises[0].sets[0].completed);
    assert!(!app.state.session.lock().await.is_active());

    let history = app.state.data.workouts();
    assert_eq!(history.len(), 1);
    assert!(history[0].created_at.is_some());

    let summary = app.state.dashboard().summary();
    assert_eq!(summary.weekly.count, 1);
    assert_eq!(summary.streak, 1);
    assert_eq!(summary.recent_exercises.len(), 4);
    assert_eq!(summary.recent_exercises[0], "Bench Press");
}

#[tokio::test]
async fn test_saved_workout_survives_in_the_database() {
    let app = common::TestApp::signed_in("ana").await;
    {
        let mut editor = app.state.session.lock().await;
        editor.start_empty();
        let squat = app.state.catalog.get("squat").unwrap().clone();
        editor.add_exercises(1, &[squat]).unwrap();
        editor.update_set_reps(0, 0, "5").unwrap();
        editor.update_set_weight(0, 0, "100").unwrap();
    }
    app.state.finish_workout().await.unwrap();

    let store = SqliteStore::new(app.pool().clone());
    let stored = store
        .list_workouts(&UserScope::new("uid-ana"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "New workout");
    assert_eq!(stored[0].duration_minutes, 1);
    assert_eq!(stored[0].total_volume, 500.0);
}

#[tokio::test]
async fn test_empty_session_closes_without_saving() {
    let app = common::TestApp::signed_in("ana").await;
    app.state.session.lock().await.start_empty();

    let outcome = app.state.finish_workout().await.unwrap();
    assert_eq!(outcome, FinishOutcome::Closed);
    assert_eq!(app.stored_count("workouts").await, 0);
}

#[tokio::test]
async fn test_finish_without_session_is_a_precondition_error() {
    let app = common::TestApp::signed_in("ana").await;
    let err = app.state.finish_workout().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Precondition(PreconditionError::NoActiveSession)
    ));
    assert_eq!(err.notice().code, "PRECONDITION_FAILED");
}

#[tokio::test]
async fn test_signed_out_finish_stores_nothing() {
    let app = common::TestApp::new().await;
    {
        let mut editor = app.state.session.lock().await;
        editor.start_empty();
        let plank = app.state.catalog.get("plank").unwrap().clone();
        editor.add_exercises(1, &[plank]).unwrap();
    }

    let outcome = app.state.finish_workout().await.unwrap();
    assert!(matches!(outcome, FinishOutcome::Saved(_)));
    assert_eq!(app.stored_count("workouts").await, 0);
    assert!(app.state.data.workouts().is_empty());
}

#[tokio::test]
async fn test_history_is_isolated_per_user() {
    let app = common::TestApp::signed_in("ana").await;
    {
        let mut editor = app.state.session.lock().await;
        editor.start_empty();
        let row = app.state.catalog.get("barbell-row").unwrap().clone();
        editor.add_exercises(1, &[row]).unwrap();
    }
    app.state.finish_workout().await.unwrap();
    assert_eq!(app.state.data.workouts().len(), 1);

    app.state.sign_out().await;
    assert!(app.state.data.workouts().is_empty());

    app.sign_in("ben").await;
    assert!(app.state.data.workouts().is_empty());

    app.state.sign_out().await;
    app.sign_in("ana").await;
    assert_eq!(app.state.data.workouts().len(), 1);
}

#[tokio::test]
async fn test_delete_workout_updates_history() {
    let app = common::TestApp::signed_in("ana").await;
    for (token, name) in [(1, "First"), (2, "Second")] {
        let mut editor = app.state.session.lock().await;
        editor.start_empty();
        let curl = app.state.catalog.get("biceps-curl").unwrap().clone();
        editor.add_exercises(token, &[curl]).unwrap();
        editor.rename(name).unwrap();
        drop(editor);
        app.state.finish_workout().await.unwrap();
    }

    let history = app.state.data.workouts();
    assert_eq!(history[0].name, "Second");
    let first_id = history[1].id.clone();

    assert!(app.state.delete_workout(&first_id).await.unwrap());
    assert!(!app.state.delete_workout(&first_id).await.unwrap());
    let names: Vec<String> = app
        .state
        .data
        .workouts()
        .iter()
        .map(|w| w.name.clone())
        .collect();
    assert_eq!(names, vec!["Second"]);
}
