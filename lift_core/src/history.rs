//! Workout history: grouped listing, bulk weight edits, and CSV export.

use crate::store::{HistoryRow, LogStore};
use crate::types::*;
use crate::workout::parse_weight;
use crate::{Error, Result};
use chrono::NaiveDate;
use std::path::Path;

/// One stored set as shown in history
#[derive(Clone, Debug, PartialEq)]
pub struct LoggedSet {
    pub set_id: i64,
    pub set_number: u32,
    pub weight: f64,
    pub completed: bool,
}

/// One exercise of a past workout
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseHistory {
    pub exercise_attempt_id: ExerciseAttemptId,
    pub exercise_name: String,
    /// `(sets, reps)` from the catalog, if the exercise is still listed there
    pub target: Option<(u32, u32)>,
    pub sets: Vec<LoggedSet>,
}

impl ExerciseHistory {
    /// Comma-separated weights by set number, the format bulk edits accept
    pub fn weights_text(&self) -> String {
        self.sets
            .iter()
            .map(|s| s.weight.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A past workout attempt with everything logged for it
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutHistory {
    pub workout_id: WorkoutId,
    pub date: NaiveDate,
    pub session_index: u32,
    pub exercises: Vec<ExerciseHistory>,
}

impl WorkoutHistory {
    pub fn logged_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

/// Load a user's workouts, newest first
pub fn load_history(store: &LogStore, username: &str, catalog: &Catalog) -> Result<Vec<WorkoutHistory>> {
    let rows = store.history_rows(username)?;
    Ok(group_rows(rows, catalog))
}

fn group_rows(rows: Vec<HistoryRow>, catalog: &Catalog) -> Vec<WorkoutHistory> {
    let mut workouts: Vec<WorkoutHistory> = Vec::new();

    for row in rows {
        if workouts.last().map(|w| w.workout_id) != Some(row.workout_id) {
            workouts.push(WorkoutHistory {
                workout_id: row.workout_id,
                date: row.date,
                session_index: row.session_index,
                exercises: Vec::new(),
            });
        }
        let Some(workout) = workouts.last_mut() else {
            continue;
        };

        if workout.exercises.last().map(|e| e.exercise_attempt_id) != Some(row.exercise_attempt_id)
        {
            let target = catalog
                .session(row.session_index)
                .and_then(|s| s.exercise(&row.exercise_name))
                .map(|e| (e.target_sets, e.target_reps));
            workout.exercises.push(ExerciseHistory {
                exercise_attempt_id: row.exercise_attempt_id,
                exercise_name: row.exercise_name.clone(),
                target,
                sets: Vec::new(),
            });
        }

        if let (Some(set_id), Some(set_number), Some(weight), Some(exercise)) = (
            row.set_id,
            row.set_number,
            row.weight,
            workout.exercises.last_mut(),
        ) {
            exercise.sets.push(LoggedSet {
                set_id,
                set_number,
                weight,
                completed: row.completed.unwrap_or(false),
            });
        }
    }

    workouts
}

// ============================================================================
// Bulk edits
// ============================================================================

/// Replacement weights for every logged set of one exercise
#[derive(Clone, Debug, PartialEq)]
pub struct WeightEdit {
    pub exercise_name: String,
    /// Comma-separated weights in set order, e.g. `"100, 105, 105"`
    pub weights: String,
}

impl WeightEdit {
    /// Parse `EXERCISE=w1,w2,...`
    pub fn parse(arg: &str) -> Result<Self> {
        let (name, weights) = arg.split_once('=').ok_or_else(|| {
            Error::Validation(format!("expected EXERCISE=w1,w2,..., got '{}'", arg))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation(format!("missing exercise name in '{}'", arg)));
        }
        Ok(Self {
            exercise_name: name.to_string(),
            weights: weights.to_string(),
        })
    }
}

/// An exercise whose edit was not applied
#[derive(Clone, Debug, PartialEq)]
pub struct EditRejection {
    pub exercise_name: String,
    pub reason: String,
}

/// Result of a bulk weight edit
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditReport {
    pub updated_sets: usize,
    pub applied: Vec<String>,
    pub rejected: Vec<EditRejection>,
}

/// Parse a comma-separated weight list. Zero is the unset value and is not
/// accepted as a logged weight.
pub fn parse_weight_list(text: &str) -> Result<Vec<f64>> {
    text.split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(|w| {
            let weight = parse_weight(w)?;
            if weight == 0.0 {
                return Err(Error::Validation("0 is not a loggable weight".into()));
            }
            Ok(weight)
        })
        .collect()
}

/// Overwrite logged weights of a past workout.
///
/// Each exercise is all-or-nothing: if its weight list doesn't parse or its
/// length differs from the number of logged sets, that exercise is rejected
/// and reported while the others still apply.
pub fn edit_workout_weights(
    store: &LogStore,
    username: &str,
    workout_id: WorkoutId,
    edits: &[WeightEdit],
) -> Result<EditReport> {
    let attempt = store
        .workout_attempt(workout_id)?
        .filter(|a| a.username == username)
        .ok_or_else(|| Error::NotFound(format!("workout {}", workout_id)))?;
    let exercise_ids = store.exercise_attempt_ids(attempt.id)?;

    let mut report = EditReport::default();
    let mut updates = Vec::new();

    for edit in edits {
        let reject = |reason: String| EditRejection {
            exercise_name: edit.exercise_name.clone(),
            reason,
        };

        let Some(&exercise_attempt_id) = exercise_ids.get(&edit.exercise_name) else {
            report
                .rejected
                .push(reject("not part of this workout".into()));
            continue;
        };

        let weights = match parse_weight_list(&edit.weights) {
            Ok(weights) => weights,
            Err(e) => {
                report.rejected.push(reject(e.to_string()));
                continue;
            }
        };

        let rows = store.set_rows(exercise_attempt_id)?;
        if weights.len() != rows.len() {
            report.rejected.push(reject(format!(
                "{} weights supplied for {} logged sets",
                weights.len(),
                rows.len()
            )));
            continue;
        }

        updates.extend(rows.iter().map(|(id, _)| *id).zip(weights));
        report.applied.push(edit.exercise_name.clone());
    }

    for rejection in &report.rejected {
        tracing::warn!(
            "Rejected edit for {} in workout {}: {}",
            rejection.exercise_name,
            workout_id,
            rejection.reason
        );
    }

    if !updates.is_empty() {
        report.updated_sets = store.update_set_weights(&updates)?;
    }
    Ok(report)
}

// ============================================================================
// CSV export
// ============================================================================

/// A row in the CSV export
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    workout_id: WorkoutId,
    date: String,
    session_index: u32,
    exercise: &'a str,
    set_number: u32,
    weight: f64,
    completed: bool,
}

/// Write every logged set of a user to `csv_path`, replacing the file.
///
/// Returns the number of set rows written.
pub fn export_history_csv(store: &LogStore, username: &str, csv_path: &Path) -> Result<usize> {
    let rows = store.history_rows(username)?;

    if let Some(parent) = csv_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(csv_path)?;
    let mut count = 0;
    for row in &rows {
        let (Some(set_number), Some(weight)) = (row.set_number, row.weight) else {
            continue;
        };
        writer.serialize(CsvRow {
            workout_id: row.workout_id,
            date: row.date.to_string(),
            session_index: row.session_index,
            exercise: &row.exercise_name,
            set_number,
            weight,
            completed: row.completed.unwrap_or(false),
        })?;
        count += 1;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} sets to {:?}", count, csv_path);
    Ok(count)
}
