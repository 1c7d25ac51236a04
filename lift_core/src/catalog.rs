//! Program catalog: the fixed rotation of training sessions.
//!
//! The catalog is read-only once seeded. A built-in default program is
//! provided for first runs without an external program file.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default program - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default program
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default program
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for tests that mutate a catalog.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn exercise(name: &str, target_sets: u32, target_reps: u32) -> SessionExercise {
    SessionExercise {
        name: name.into(),
        target_sets,
        target_reps,
    }
}

fn build_default_catalog_internal() -> Catalog {
    let sessions = vec![
        vec![
            exercise("Squat", 5, 5),
            exercise("Bench Press", 5, 5),
            exercise("Barbell Row", 5, 5),
        ],
        vec![
            exercise("Squat", 5, 5),
            exercise("Overhead Press", 5, 5),
            exercise("Deadlift", 1, 5),
        ],
        vec![
            exercise("Front Squat", 3, 8),
            exercise("Incline Bench Press", 3, 8),
            exercise("Chin-up", 3, 8),
        ],
        vec![
            exercise("Romanian Deadlift", 3, 8),
            exercise("Dumbbell Press", 3, 8),
            exercise("Pendlay Row", 3, 8),
        ],
    ];

    Catalog {
        sessions: sessions
            .into_iter()
            .enumerate()
            .map(|(i, exercises)| Session {
                index: i as u32 + 1,
                name: format!("Session {}", i + 1),
                exercises,
            })
            .collect(),
    }
}

impl Catalog {
    /// Number of sessions in the rotation
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Look up a session by its 1-based index
    pub fn session(&self, index: u32) -> Option<&Session> {
        self.sessions.iter().find(|s| s.index == index)
    }

    /// Session index that follows `attempts` prior workout attempts.
    ///
    /// Rotation is strictly cyclic over `1..=N` and ignores whether earlier
    /// attempts were finished. Returns None for an empty catalog.
    pub fn rotation_index(&self, attempts: u64) -> Option<u32> {
        next_session_index(attempts, self.sessions.len() as u32)
    }

    /// Validate the catalog structure
    ///
    /// Returns a list of validation errors (empty if valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sessions.is_empty() {
            errors.push("Catalog has no sessions".to_string());
            return errors;
        }

        // Rotation arithmetic needs indices 1..=N with no gaps
        for (pos, session) in self.sessions.iter().enumerate() {
            let expected = pos as u32 + 1;
            if session.index != expected {
                errors.push(format!(
                    "Session '{}' has index {}, expected {}",
                    session.name, session.index, expected
                ));
            }

            if session.exercises.is_empty() {
                errors.push(format!("Session {} has no exercises", session.index));
            }

            let mut seen = HashSet::new();
            for ex in &session.exercises {
                if ex.name.trim().is_empty() {
                    errors.push(format!(
                        "Session {} has an exercise with a blank name",
                        session.index
                    ));
                }
                if !seen.insert(ex.name.as_str()) {
                    errors.push(format!(
                        "Session {} lists exercise '{}' more than once",
                        session.index, ex.name
                    ));
                }
                if ex.target_sets == 0 || ex.target_reps == 0 {
                    errors.push(format!(
                        "Exercise '{}' in session {} must have positive sets and reps",
                        ex.name, session.index
                    ));
                }
            }
        }

        errors
    }
}

/// `(attempts mod sessions) + 1`, or None when there are no sessions
pub fn next_session_index(attempts: u64, sessions: u32) -> Option<u32> {
    if sessions == 0 {
        return None;
    }
    Some((attempts % sessions as u64) as u32 + 1)
}
