//! Active workout session editing
//!
//! At most one session is active at a time. Totals are derived from the
//! current sets on every call and never cached. Index-based operations
//! check their indices first and leave the session untouched on failure.

use crate::config::SessionConfig;
use crate::error::{AppError, AppResult};
use crate::repositories::UserScope;
use crate::services::clock::Clock;
use crate::services::data::DataFacade;
use crate::services::ids::IdGenerator;
use appfitness_shared::validation::{parse_reps, parse_weight};
use appfitness_shared::{
    Catalog, Exercise, ExerciseInstance, PreconditionError, RecordedExercise, WorkoutRecord,
    WorkoutSet, WorkoutTemplate,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The in-progress, unsaved workout
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    pub name: String,
    /// Name of the template the session was started from
    pub template_name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub exercises: Vec<ExerciseInstance>,
}

impl WorkoutSession {
    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets.len() as u32).sum()
    }

    /// Sum of reps x weight over every set, completed or not
    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(ExerciseInstance::volume).sum()
    }

    pub fn completed_sets(&self) -> u32 {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .filter(|s| s.completed)
            .count() as u32
    }
}

/// Result of finishing a session
#[derive(Debug, Clone, PartialEq)]
pub enum FinishOutcome {
    /// The record that was written
    Saved(WorkoutRecord),
    /// The session had no exercises and was closed without saving
    Closed,
}

/// Owns the active session and every mutation on it
pub struct SessionEditor {
    catalog: Arc<Catalog>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    active: Option<WorkoutSession>,
    last_pick_token: Option<u64>,
}

impl SessionEditor {
    pub fn new(
        catalog: Arc<Catalog>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            catalog,
            ids,
            clock,
            config,
            active: None,
            last_pick_token: None,
        }
    }

    pub fn session(&self) -> Option<&WorkoutSession> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start a blank session, replacing any unsaved one
    pub fn start_empty(&mut self) -> &WorkoutSession {
        info!("Starting empty workout session");
        self.active.insert(WorkoutSession {
            name: self.config.default_name.clone(),
            template_name: None,
            started_at: self.clock.now(),
            exercises: Vec::new(),
        })
    }

    /// Start a session seeded from a template's prescription. Exercises the
    /// catalog does not know are skipped.
    pub fn start_from_template(&mut self, template: &WorkoutTemplate) -> &WorkoutSession {
        let mut exercises = Vec::with_capacity(template.exercises.len());
        for prescribed in &template.exercises {
            let Some(exercise) = self.catalog.get(&prescribed.exercise_id) else {
                debug!(
                    template = %template.id,
                    exercise_id = %prescribed.exercise_id,
                    "Skipping unknown exercise in template"
                );
                continue;
            };

            let sets = prescribed
                .sets
                .iter()
                .enumerate()
                .map(|(i, set)| WorkoutSet {
                    id: self.ids.next_id("set"),
                    set_number: i as u32 + 1,
                    reps: set.reps,
                    weight: set.weight,
                    completed: false,
                })
                .collect();
            exercises.push(self.instance(exercise, sets));
        }

        info!(
            template = %template.id,
            exercises = exercises.len(),
            "Starting workout session from template"
        );
        self.active.insert(WorkoutSession {
            name: template.name.clone(),
            template_name: Some(template.name.clone()),
            started_at: self.clock.now(),
            exercises,
        })
    }

    /// Append picked exercises, each with one empty set.
    ///
    /// `token` identifies the picking interaction; a token at or below the
    /// last one applied is a re-delivery and is ignored. An empty pick does
    /// not consume its token. Returns how many exercises were added.
    pub fn add_exercises(
        &mut self,
        token: u64,
        picked: &[Exercise],
    ) -> Result<usize, PreconditionError> {
        if self.active.is_none() {
            return Err(PreconditionError::NoActiveSession);
        }
        if picked.is_empty() {
            return Ok(0);
        }
        if self.last_pick_token.is_some_and(|last| token <= last) {
            debug!(token, "Ignoring re-delivered exercise pick");
            return Ok(0);
        }

        let instances: Vec<ExerciseInstance> = picked
            .iter()
            .map(|exercise| {
                let set = WorkoutSet {
                    id: self.ids.next_id("set"),
                    set_number: 1,
                    reps: 0,
                    weight: 0.0,
                    completed: false,
                };
                self.instance(exercise, vec![set])
            })
            .collect();

        self.last_pick_token = Some(token);
        let session = self.active_mut()?;
        session.exercises.extend(instances);
        Ok(picked.len())
    }

    /// Flip a set's completed flag; returns the new value
    pub fn toggle_set_completed(
        &mut self,
        exercise_index: usize,
        set_index: usize,
    ) -> Result<bool, PreconditionError> {
        let set = self.set_mut(exercise_index, set_index)?;
        set.completed = !set.completed;
        Ok(set.completed)
    }

    /// Parse and store reps; unparsable text stores 0
    pub fn update_set_reps(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        text: &str,
    ) -> Result<u32, PreconditionError> {
        let set = self.set_mut(exercise_index, set_index)?;
        set.reps = parse_reps(text);
        Ok(set.reps)
    }

    /// Parse and store weight; accepts a comma decimal separator
    pub fn update_set_weight(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        text: &str,
    ) -> Result<f64, PreconditionError> {
        let set = self.set_mut(exercise_index, set_index)?;
        set.weight = parse_weight(text);
        Ok(set.weight)
    }

    /// Append a set carrying forward the last set's reps and weight
    pub fn add_set(&mut self, exercise_index: usize) -> Result<&WorkoutSet, PreconditionError> {
        let id = self.ids.next_id("set");
        let exercise = self.exercise_mut(exercise_index)?;
        let (reps, weight) = exercise
            .sets
            .last()
            .map_or((0, 0.0), |last| (last.reps, last.weight));

        exercise.sets.push(WorkoutSet {
            id,
            set_number: exercise.sets.len() as u32 + 1,
            reps,
            weight,
            completed: false,
        });
        exercise.renumber_sets();
        Ok(&exercise.sets[exercise.sets.len() - 1])
    }

    /// Remove a set and renumber the rest. The last remaining set of an
    /// exercise cannot be removed.
    pub fn remove_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
    ) -> Result<WorkoutSet, PreconditionError> {
        let exercise = self.exercise_mut(exercise_index)?;
        if set_index >= exercise.sets.len() {
            return Err(PreconditionError::NoSuchSet {
                exercise: exercise_index,
                set: set_index,
            });
        }
        if exercise.sets.len() <= 1 {
            return Err(PreconditionError::LastSet);
        }

        let removed = exercise.sets.remove(set_index);
        exercise.renumber_sets();
        Ok(removed)
    }

    /// Remove an exercise instance; the caller confirms with the user first
    pub fn remove_exercise(
        &mut self,
        exercise_index: usize,
    ) -> Result<ExerciseInstance, PreconditionError> {
        let session = self.active_mut()?;
        if exercise_index >= session.exercises.len() {
            return Err(PreconditionError::NoSuchExercise(exercise_index));
        }
        Ok(session.exercises.remove(exercise_index))
    }

    pub fn rename(&mut self, name: &str) -> Result<(), PreconditionError> {
        self.active_mut()?.name = name.to_string();
        Ok(())
    }

    pub fn total_sets(&self) -> u32 {
        self.active.as_ref().map_or(0, WorkoutSession::total_sets)
    }

    pub fn total_volume(&self) -> f64 {
        self.active.as_ref().map_or(0.0, WorkoutSession::total_volume)
    }

    pub fn completed_sets(&self) -> u32 {
        self.active.as_ref().map_or(0, WorkoutSession::completed_sets)
    }

    /// Whole minutes since the session started
    pub fn elapsed_minutes(&self) -> i64 {
        self.active.as_ref().map_or(0, |s| {
            (self.clock.now() - s.started_at).num_minutes().max(0)
        })
    }

    /// The record `finish` would write right now
    pub fn build_record(&self) -> Option<WorkoutRecord> {
        let session = self.active.as_ref()?;
        let now = self.clock.now();
        let elapsed_ms = (now - session.started_at).num_milliseconds() as f64;
        let duration_minutes = ((elapsed_ms / 60_000.0).round() as i64).max(1) as u32;

        let name = session.name.trim();
        let name = if name.is_empty() {
            self.config.fallback_name.clone()
        } else {
            name.to_string()
        };

        Some(WorkoutRecord {
            id: self.ids.next_id("workout"),
            name,
            date: self.clock.today(),
            duration_minutes,
            total_sets: session.total_sets(),
            total_volume: session.total_volume(),
            template_name: session.template_name.clone(),
            exercises: session.exercises.iter().map(RecordedExercise::from).collect(),
            created_at: None,
        })
    }

    /// Persist the session as a workout record and close it.
    ///
    /// A session without exercises is closed without saving. If the write
    /// fails the session stays active so the user can retry.
    pub async fn finish(
        &mut self,
        data: &DataFacade,
        scope: Option<&UserScope>,
    ) -> AppResult<FinishOutcome> {
        let session = self
            .active
            .as_ref()
            .ok_or(AppError::Precondition(PreconditionError::NoActiveSession))?;

        if session.exercises.is_empty() {
            info!("Closing empty workout session without saving");
            self.active = None;
            return Ok(FinishOutcome::Closed);
        }

        let record = self
            .build_record()
            .ok_or(AppError::Precondition(PreconditionError::NoActiveSession))?;

        match data.add_workout(scope, &record).await {
            Ok(stored) => {
                let record = stored.unwrap_or(record);
                info!(
                    workout_id = %record.id,
                    sets = record.total_sets,
                    volume = record.total_volume,
                    minutes = record.duration_minutes,
                    "Workout finished"
                );
                self.active = None;
                Ok(FinishOutcome::Saved(record))
            }
            Err(e) => {
                warn!(error = %e, "Saving workout failed; session kept for retry");
                Err(e)
            }
        }
    }

    /// Drop the session without saving; the caller confirms first
    pub fn discard(&mut self) {
        if self.active.take().is_some() {
            info!("Workout session discarded");
        }
    }

    fn instance(&self, exercise: &Exercise, sets: Vec<WorkoutSet>) -> ExerciseInstance {
        ExerciseInstance {
            instance_id: self.ids.next_id("ex"),
            exercise_id: exercise.id.clone(),
            name: exercise.name.clone(),
            muscle_group: exercise.muscle_group.clone(),
            equipment: exercise.equipment.clone(),
            sets,
        }
    }

    fn active_mut(&mut self) -> Result<&mut WorkoutSession, PreconditionError> {
        self.active
            .as_mut()
            .ok_or(PreconditionError::NoActiveSession)
    }

    fn exercise_mut(&mut self, index: usize) -> Result<&mut ExerciseInstance, PreconditionError> {
        self.active_mut()?
            .exercises
            .get_mut(index)
            .ok_or(PreconditionError::NoSuchExercise(index))
    }

    fn set_mut(
        &mut self,
        exercise_index: usize,
        set_index: usize,
    ) -> Result<&mut WorkoutSet, PreconditionError> {
        self.exercise_mut(exercise_index)?
            .sets
            .get_mut(set_index)
            .ok_or(PreconditionError::NoSuchSet {
                exercise: exercise_index,
                set: set_index,
            })
    }
}
