//! Workout state machine.
//!
//! ```text
//! Idle ──preview──▶ Previewed ──begin──▶ Active ──finish──▶ FinishRequested
//!  │                                       ▲                  │        │
//!  └──────────────resume───────────────────┘◀─────cancel──────┘        │
//!  ▲                                                                   │
//!  └────────────────────────────confirm────────────────────────────────┘
//! ```
//!
//! The state is a plain value owned by the caller and passed into each
//! transition. Transitions only replace it after every store call succeeded,
//! so a failed transition leaves the previous state intact.

use crate::catalog::next_session_index;
use crate::identity::Identity;
use crate::progression::{plan_session, DEFAULT_INCREMENT};
use crate::store::LogStore;
use crate::types::*;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A previewed session that has not been written to the log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StagedSession {
    pub session_index: u32,
    pub session_name: String,
    pub exercises: Vec<PlannedExercise>,
}

/// A workout attempt being logged
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActiveWorkout {
    pub session_index: u32,
    pub workout_id: WorkoutId,
    pub exercise_attempt_ids: BTreeMap<String, ExerciseAttemptId>,
    pub exercises: Vec<PlannedExercise>,
}

impl ActiveWorkout {
    fn exercise(&self, name: &str) -> Result<(&PlannedExercise, ExerciseAttemptId)> {
        let planned = self
            .exercises
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| {
                Error::Validation(format!("'{}' is not part of this workout", name))
            })?;
        let id = self.exercise_attempt_ids.get(name).copied().ok_or_else(|| {
            Error::State(format!("no exercise attempt recorded for '{}'", name))
        })?;
        Ok((planned, id))
    }
}

/// Lifecycle state of the current workout
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkoutState {
    #[default]
    Idle,
    Previewed(StagedSession),
    Active(ActiveWorkout),
    FinishRequested {
        workout: ActiveWorkout,
        incomplete: Vec<IncompleteExercise>,
    },
}

impl WorkoutState {
    /// Short state name for messages
    pub fn name(&self) -> &'static str {
        match self {
            WorkoutState::Idle => "idle",
            WorkoutState::Previewed(_) => "previewed",
            WorkoutState::Active(_) => "active",
            WorkoutState::FinishRequested { .. } => "finish requested",
        }
    }

    /// The workout being logged, if any
    pub fn active_workout(&self) -> Option<&ActiveWorkout> {
        match self {
            WorkoutState::Active(workout) | WorkoutState::FinishRequested { workout, .. } => {
                Some(workout)
            }
            _ => None,
        }
    }

    fn wrong_state(&self, action: &str) -> Error {
        Error::State(format!("cannot {} while {}", action, self.name()))
    }

    /// FinishRequested → Idle. The log already holds every entered set, so
    /// nothing is written. Returns the workout that was closed.
    pub fn confirm(&mut self) -> Result<ActiveWorkout> {
        let workout = match self {
            WorkoutState::FinishRequested { workout, .. } => workout.clone(),
            other => return Err(other.wrong_state("confirm")),
        };
        *self = WorkoutState::Idle;
        tracing::info!("Confirmed workout {}", workout.workout_id);
        Ok(workout)
    }

    /// FinishRequested → Active, so logging can continue
    pub fn cancel_finish(&mut self) -> Result<()> {
        let workout = match self {
            WorkoutState::FinishRequested { workout, .. } => workout.clone(),
            other => return Err(other.wrong_state("cancel")),
        };
        *self = WorkoutState::Active(workout);
        Ok(())
    }
}

/// Outcome of submitting a weight for one set
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SetWrite {
    /// Weight was `0`, the unset value; nothing written
    Skipped,
    /// The set already holds this weight; nothing written
    Unchanged,
    /// The set was written
    Recorded { previous: Option<f64> },
}

/// Logged sets of one exercise in the active workout
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseProgress {
    pub exercise: PlannedExercise,
    pub sets: Vec<SetResult>,
}

impl ExerciseProgress {
    pub fn is_complete(&self) -> bool {
        self.sets.len() as u32 >= self.exercise.target_sets
    }
}

/// Parse a weight typed by the user.
///
/// Rejects anything that is not a finite, non-negative number.
pub fn parse_weight(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    let weight: f64 = trimmed
        .parse()
        .map_err(|_| Error::Validation(format!("'{}' is not a number", trimmed)))?;
    check_weight(weight)?;
    Ok(weight)
}

fn check_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(Error::Validation(format!(
            "weight must be a non-negative number, got {}",
            weight
        )));
    }
    Ok(())
}

/// Runs workout transitions for one user against the log store
pub struct WorkoutEngine<'a> {
    store: &'a LogStore,
    username: &'a str,
    today: NaiveDate,
    increment: f64,
}

impl<'a> WorkoutEngine<'a> {
    /// Create an engine for an authenticated identity
    pub fn new(store: &'a LogStore, identity: &'a Identity, today: NaiveDate) -> Result<Self> {
        let username = identity.require_authenticated()?;
        Ok(Self {
            store,
            username,
            today,
            increment: DEFAULT_INCREMENT,
        })
    }

    /// Override the progression step
    pub fn with_increment(mut self, increment: f64) -> Self {
        self.increment = increment;
        self
    }

    pub fn username(&self) -> &str {
        self.username
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Session index the next preview would pick
    pub fn next_session_index(&self) -> Result<u32> {
        let attempts = self.store.count_attempts(self.username)?;
        let sessions = self.store.session_count()?;
        next_session_index(attempts, sessions)
            .ok_or_else(|| Error::NotFound("the program catalog has no sessions".into()))
    }

    /// Today's newest attempt that still has unlogged sets
    pub fn find_resumable(&self) -> Result<Option<WorkoutAttempt>> {
        self.store.find_incomplete_attempt(self.username, self.today)
    }

    /// Idle/Previewed → Previewed: stage the next session in the rotation.
    ///
    /// Nothing is written to the log.
    pub fn preview(&self, state: &mut WorkoutState) -> Result<StagedSession> {
        if !matches!(state, WorkoutState::Idle | WorkoutState::Previewed(_)) {
            return Err(state.wrong_state("preview"));
        }

        let index = self.next_session_index()?;
        let session = self.store.load_session(index)?.ok_or_else(|| {
            Error::NotFound(format!("no catalog session at rotation index {}", index))
        })?;

        let exercises = plan_session(
            self.store,
            self.username,
            &session,
            PriorLookup::AnyDate,
            self.today,
            self.increment,
        )?;

        let staged = StagedSession {
            session_index: session.index,
            session_name: session.name,
            exercises,
        };

        tracing::info!("Previewed session {} for {}", staged.session_index, self.username);
        *state = WorkoutState::Previewed(staged.clone());
        Ok(staged)
    }

    /// Previewed → Active: write the attempt and one row per exercise
    pub fn begin(&self, state: &mut WorkoutState) -> Result<ActiveWorkout> {
        let staged = match state {
            WorkoutState::Previewed(staged) => staged.clone(),
            other => return Err(other.wrong_state("begin")),
        };

        let names: Vec<String> = staged.exercises.iter().map(|e| e.name.clone()).collect();
        let (workout_id, exercise_attempt_ids) =
            self.store
                .begin_attempt(self.username, staged.session_index, self.today, &names)?;

        let active = ActiveWorkout {
            session_index: staged.session_index,
            workout_id,
            exercise_attempt_ids,
            exercises: staged.exercises,
        };

        *state = WorkoutState::Active(active.clone());
        Ok(active)
    }

    /// Idle/Previewed → Active: pick up today's incomplete attempt.
    ///
    /// The attempt and its exercise rows already exist, so nothing is
    /// inserted. Suggestions only consider attempts before today.
    pub fn resume(&self, state: &mut WorkoutState) -> Result<ActiveWorkout> {
        if !matches!(state, WorkoutState::Idle | WorkoutState::Previewed(_)) {
            return Err(state.wrong_state("resume"));
        }

        let attempt = self
            .find_resumable()?
            .ok_or_else(|| Error::NotFound("no incomplete workout from today".into()))?;

        let exercise_attempt_ids = self.store.exercise_attempt_ids(attempt.id)?;
        let mut session = self.store.load_session(attempt.session_index)?.ok_or_else(|| {
            Error::NotFound(format!(
                "no catalog session at index {}",
                attempt.session_index
            ))
        })?;
        session
            .exercises
            .retain(|e| exercise_attempt_ids.contains_key(&e.name));

        let exercises = plan_session(
            self.store,
            self.username,
            &session,
            PriorLookup::BeforeToday,
            self.today,
            self.increment,
        )?;

        let active = ActiveWorkout {
            session_index: attempt.session_index,
            workout_id: attempt.id,
            exercise_attempt_ids,
            exercises,
        };

        tracing::info!("Resumed workout {} for {}", attempt.id, self.username);
        *state = WorkoutState::Active(active.clone());
        Ok(active)
    }

    /// Submit a weight for one set of the active workout.
    ///
    /// `0` is the unset value and never written. Resubmitting the stored
    /// weight writes nothing.
    pub fn record_set(
        &self,
        state: &WorkoutState,
        exercise_name: &str,
        set_number: u32,
        weight: f64,
    ) -> Result<SetWrite> {
        let WorkoutState::Active(workout) = state else {
            return Err(state.wrong_state("log a set"));
        };

        check_weight(weight)?;
        let (planned, exercise_attempt_id) = workout.exercise(exercise_name)?;
        if set_number == 0 || set_number > planned.target_sets {
            return Err(Error::Validation(format!(
                "{} has sets 1-{}, got set {}",
                planned.name, planned.target_sets, set_number
            )));
        }

        if weight == 0.0 {
            return Ok(SetWrite::Skipped);
        }

        let previous = self.store.set_weight(exercise_attempt_id, set_number)?;
        if previous == Some(weight) {
            return Ok(SetWrite::Unchanged);
        }

        self.store.upsert_set(exercise_attempt_id, set_number, weight)?;
        Ok(SetWrite::Recorded { previous })
    }

    /// Active → FinishRequested.
    ///
    /// Returns the exercises short of their target sets. The shortfall is
    /// advisory; the transition always happens.
    pub fn finish(&self, state: &mut WorkoutState) -> Result<Vec<IncompleteExercise>> {
        let workout = match state {
            WorkoutState::Active(workout) => workout.clone(),
            other => return Err(other.wrong_state("finish")),
        };

        let mut incomplete = Vec::new();
        for ex in &workout.exercises {
            let (_, id) = workout.exercise(&ex.name)?;
            let logged = self.store.logged_set_count(id)?;
            if logged < ex.target_sets {
                incomplete.push(IncompleteExercise {
                    exercise_name: ex.name.clone(),
                    logged,
                    target: ex.target_sets,
                });
            }
        }

        if !incomplete.is_empty() {
            tracing::warn!(
                "Workout {} finishing with {} incomplete exercises",
                workout.workout_id,
                incomplete.len()
            );
        }

        *state = WorkoutState::FinishRequested {
            workout,
            incomplete: incomplete.clone(),
        };
        Ok(incomplete)
    }

    /// Logged sets per exercise of the active (or finishing) workout
    pub fn progress(&self, state: &WorkoutState) -> Result<Vec<ExerciseProgress>> {
        let workout = state
            .active_workout()
            .ok_or_else(|| state.wrong_state("show progress"))?;

        workout
            .exercises
            .iter()
            .map(|ex| {
                let (_, id) = workout.exercise(&ex.name)?;
                Ok(ExerciseProgress {
                    exercise: ex.clone(),
                    sets: self.store.set_results(id)?,
                })
            })
            .collect()
    }
}
