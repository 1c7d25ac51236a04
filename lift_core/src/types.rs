//! Core domain types for the lift log.
//!
//! This module defines the fundamental types used throughout the system:
//! - Program catalog (sessions and their prescribed exercises)
//! - Log records (workout attempts, exercise attempts, set results)
//! - Progression output (planned exercises and suggestion kinds)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Row id of a `workout_logs` entry
pub type WorkoutId = i64;

/// Row id of an `exercise_logs` entry
pub type ExerciseAttemptId = i64;

// ============================================================================
// Catalog Types
// ============================================================================

/// One exercise prescribed by a catalog session.
///
/// The name is the join key against the log tables, so it must be unique
/// within its session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionExercise {
    pub name: String,
    pub target_sets: u32,
    pub target_reps: u32,
}

/// A fixed training-day template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// 1-based position in the rotation
    pub index: u32,
    pub name: String,
    pub exercises: Vec<SessionExercise>,
}

impl Session {
    /// Look up an exercise by name
    pub fn exercise(&self, name: &str) -> Option<&SessionExercise> {
        self.exercises.iter().find(|e| e.name == name)
    }

    /// Total number of sets this session prescribes
    pub fn total_target_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.target_sets).sum()
    }
}

/// The complete training program, ordered by session index
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    pub sessions: Vec<Session>,
}

// ============================================================================
// Log Types
// ============================================================================

/// One concrete performance of a catalog session on a date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutAttempt {
    pub id: WorkoutId,
    pub username: String,
    pub session_index: u32,
    pub date: NaiveDate,
}

/// One logged set within an exercise attempt
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetResult {
    pub set_number: u32,
    pub weight: f64,
    pub completed: bool,
}

/// Best completed weight for an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonalBest {
    pub exercise_name: String,
    pub weight: f64,
}

/// An exercise that fell short of its target sets when a workout finished
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncompleteExercise {
    pub exercise_name: String,
    pub logged: u32,
    pub target: u32,
}

// ============================================================================
// Progression Types
// ============================================================================

/// Which prior attempts a progression lookup may consider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriorLookup {
    /// Any prior attempt, including ones dated today (preview path)
    AnyDate,
    /// Only attempts dated strictly before today (resume path)
    BeforeToday,
}

/// How a suggested weight relates to the previous attempt
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// No usable prior attempt; the user picks a starting weight
    New,
    /// Prior attempt was fully logged; weight goes up by one step
    Increase,
    /// Prior attempt was partially logged; repeat its lowest weight
    Repeat,
}

/// A catalog exercise together with its suggested working weight
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlannedExercise {
    pub name: String,
    pub target_sets: u32,
    pub target_reps: u32,
    /// `0.0` when there is nothing to suggest
    pub suggested_weight: f64,
    pub suggestion: SuggestionKind,
}
