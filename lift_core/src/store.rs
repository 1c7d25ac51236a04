//! SQLite log store.
//!
//! Every operation opens its own connection, executes, commits when it
//! writes, and closes again. Nothing here deletes log rows; only the catalog
//! tables are ever replaced (by seeding).

use crate::types::*;
use crate::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_index INTEGER UNIQUE,
    name TEXT
);

CREATE TABLE IF NOT EXISTS session_exercises (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER,
    exercise_name TEXT,
    sets INTEGER,
    reps INTEGER,
    FOREIGN KEY (session_id) REFERENCES sessions(id)
);

CREATE TABLE IF NOT EXISTS workout_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_index INTEGER,
    username TEXT,
    date TEXT
);

CREATE TABLE IF NOT EXISTS exercise_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    workout_log_id INTEGER,
    exercise_name TEXT,
    FOREIGN KEY (workout_log_id) REFERENCES workout_logs(id)
);

CREATE TABLE IF NOT EXISTS set_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    exercise_log_id INTEGER,
    set_number INTEGER,
    weight REAL,
    completed BOOLEAN,
    FOREIGN KEY (exercise_log_id) REFERENCES exercise_logs(id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_set_logs_exercise_set
    ON set_logs(exercise_log_id, set_number);
CREATE INDEX IF NOT EXISTS idx_workout_logs_user_date
    ON workout_logs(username, date);
CREATE INDEX IF NOT EXISTS idx_exercise_logs_workout
    ON exercise_logs(workout_log_id);
";

const PRIOR_ATTEMPT_ANY_DATE: &str = "
    SELECT el.id FROM workout_logs wl
    JOIN exercise_logs el ON wl.id = el.workout_log_id
    WHERE wl.username = ?1 AND wl.session_index = ?2 AND el.exercise_name = ?3
    ORDER BY wl.date DESC, wl.id DESC LIMIT 1";

const PRIOR_ATTEMPT_BEFORE_TODAY: &str = "
    SELECT el.id FROM workout_logs wl
    JOIN exercise_logs el ON wl.id = el.workout_log_id
    WHERE wl.username = ?1 AND wl.session_index = ?2 AND el.exercise_name = ?3
      AND wl.date < ?4
    ORDER BY wl.date DESC, wl.id DESC LIMIT 1";

// Logged sets vs. the target sets of the exercises the attempt actually holds,
// matched to the catalog by session index and exercise name.
const INCOMPLETE_ON_DATE: &str = "
    SELECT wl.id, wl.username, wl.session_index, wl.date
    FROM workout_logs wl
    WHERE wl.username = ?1 AND wl.date = ?2
      AND (SELECT COUNT(*) FROM set_logs sl
           JOIN exercise_logs el ON sl.exercise_log_id = el.id
           WHERE el.workout_log_id = wl.id)
        < (SELECT COALESCE(SUM(se.sets), 0) FROM exercise_logs el
           JOIN sessions s ON s.session_index = wl.session_index
           JOIN session_exercises se
             ON se.session_id = s.id AND se.exercise_name = el.exercise_name
           WHERE el.workout_log_id = wl.id)
    ORDER BY wl.id DESC LIMIT 1";

/// One row of a user's flattened set history.
///
/// Exercises with nothing logged appear once with the set columns empty.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryRow {
    pub workout_id: WorkoutId,
    pub date: NaiveDate,
    pub session_index: u32,
    pub exercise_attempt_id: ExerciseAttemptId,
    pub exercise_name: String,
    pub set_id: Option<i64>,
    pub set_number: Option<u32>,
    pub weight: Option<f64>,
    pub completed: Option<bool>,
}

/// Relational workout log backed by a SQLite file
#[derive(Clone, Debug)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    /// Create a store for the database at `path`. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    /// Create any missing tables and indexes
    pub fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("Initialized log store at {:?}", self.path);
        Ok(())
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Replace the catalog tables with `catalog` in one transaction.
    ///
    /// Log tables are untouched.
    pub fn replace_catalog(&self, catalog: &Catalog) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM session_exercises", [])?;
        tx.execute("DELETE FROM sessions", [])?;

        for session in &catalog.sessions {
            tx.execute(
                "INSERT INTO sessions (session_index, name) VALUES (?1, ?2)",
                params![session.index, session.name],
            )?;
            let session_id = tx.last_insert_rowid();

            for ex in &session.exercises {
                tx.execute(
                    "INSERT INTO session_exercises (session_id, exercise_name, sets, reps)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![session_id, ex.name, ex.target_sets, ex.target_reps],
                )?;
            }
        }

        tx.commit()?;
        tracing::info!("Seeded catalog with {} sessions", catalog.sessions.len());
        Ok(())
    }

    /// Load the full catalog ordered by session index
    pub fn load_catalog(&self) -> Result<Catalog> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT s.session_index, s.name, se.exercise_name, se.sets, se.reps
             FROM sessions s
             LEFT JOIN session_exercises se ON se.session_id = s.id
             ORDER BY s.session_index, se.id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<u32>>(3)?,
                row.get::<_, Option<u32>>(4)?,
            ))
        })?;

        let mut sessions: Vec<Session> = Vec::new();
        for row in rows {
            let (index, name, exercise_name, sets, reps) = row?;
            if sessions.last().map(|s| s.index) != Some(index) {
                sessions.push(Session {
                    index,
                    name: name.unwrap_or_else(|| format!("Session {}", index)),
                    exercises: Vec::new(),
                });
            }
            if let (Some(name), Some(target_sets), Some(target_reps)) = (exercise_name, sets, reps)
            {
                if let Some(session) = sessions.last_mut() {
                    session.exercises.push(SessionExercise {
                        name,
                        target_sets,
                        target_reps,
                    });
                }
            }
        }

        Ok(Catalog { sessions })
    }

    /// Number of sessions in the stored catalog
    pub fn session_count(&self) -> Result<u32> {
        let conn = self.connect()?;
        let count: u32 = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Load one catalog session with its exercises
    pub fn load_session(&self, index: u32) -> Result<Option<Session>> {
        let conn = self.connect()?;
        let header = conn
            .query_row(
                "SELECT id, name FROM sessions WHERE session_index = ?1",
                params![index],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;

        let Some((session_id, name)) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT exercise_name, sets, reps FROM session_exercises
             WHERE session_id = ?1 ORDER BY id",
        )?;
        let exercises = stmt
            .query_map(params![session_id], |row| {
                Ok(SessionExercise {
                    name: row.get(0)?,
                    target_sets: row.get(1)?,
                    target_reps: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(Session {
            index,
            name: name.unwrap_or_else(|| format!("Session {}", index)),
            exercises,
        }))
    }

    // ========================================================================
    // Workout attempts
    // ========================================================================

    /// Number of workout attempts the user has ever begun
    pub fn count_attempts(&self, username: &str) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM workout_logs WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Insert a workout attempt and one exercise attempt per name, atomically
    pub fn begin_attempt(
        &self,
        username: &str,
        session_index: u32,
        date: NaiveDate,
        exercise_names: &[String],
    ) -> Result<(WorkoutId, BTreeMap<String, ExerciseAttemptId>)> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO workout_logs (session_index, username, date) VALUES (?1, ?2, ?3)",
            params![session_index, username, date],
        )?;
        let workout_id = tx.last_insert_rowid();

        let mut exercise_ids = BTreeMap::new();
        for name in exercise_names {
            tx.execute(
                "INSERT INTO exercise_logs (workout_log_id, exercise_name) VALUES (?1, ?2)",
                params![workout_id, name],
            )?;
            exercise_ids.insert(name.clone(), tx.last_insert_rowid());
        }

        tx.commit()?;
        tracing::info!(
            "Began workout {} (session {}) for {}",
            workout_id,
            session_index,
            username
        );
        Ok((workout_id, exercise_ids))
    }

    /// Fetch a workout attempt by id
    pub fn workout_attempt(&self, id: WorkoutId) -> Result<Option<WorkoutAttempt>> {
        let conn = self.connect()?;
        let attempt = conn
            .query_row(
                "SELECT id, username, session_index, date FROM workout_logs WHERE id = ?1",
                params![id],
                attempt_from_row,
            )
            .optional()?;
        Ok(attempt)
    }

    /// Newest attempt on `date` with fewer logged sets than its target
    pub fn find_incomplete_attempt(
        &self,
        username: &str,
        date: NaiveDate,
    ) -> Result<Option<WorkoutAttempt>> {
        let conn = self.connect()?;
        let attempt = conn
            .query_row(INCOMPLETE_ON_DATE, params![username, date], attempt_from_row)
            .optional()?;
        Ok(attempt)
    }

    /// Exercise attempt ids of a workout, keyed by exercise name
    pub fn exercise_attempt_ids(
        &self,
        workout_id: WorkoutId,
    ) -> Result<BTreeMap<String, ExerciseAttemptId>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, exercise_name FROM exercise_logs WHERE workout_log_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![workout_id], |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, i64>(0)?))
        })?;

        let mut ids = BTreeMap::new();
        for row in rows {
            let (name, id) = row?;
            ids.insert(name, id);
        }
        Ok(ids)
    }

    /// Set weights of the most recent prior attempt of an exercise.
    ///
    /// Returns None when no prior attempt exists; an attempt with nothing
    /// logged yields an empty list.
    pub fn prior_set_weights(
        &self,
        username: &str,
        session_index: u32,
        exercise_name: &str,
        lookup: PriorLookup,
        today: NaiveDate,
    ) -> Result<Option<Vec<f64>>> {
        let conn = self.connect()?;

        let prior: Option<i64> = match lookup {
            PriorLookup::AnyDate => conn
                .query_row(
                    PRIOR_ATTEMPT_ANY_DATE,
                    params![username, session_index, exercise_name],
                    |row| row.get(0),
                )
                .optional()?,
            PriorLookup::BeforeToday => conn
                .query_row(
                    PRIOR_ATTEMPT_BEFORE_TODAY,
                    params![username, session_index, exercise_name, today],
                    |row| row.get(0),
                )
                .optional()?,
        };

        let Some(exercise_attempt_id) = prior else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare("SELECT weight FROM set_logs WHERE exercise_log_id = ?1 ORDER BY set_number")?;
        let weights = stmt
            .query_map(params![exercise_attempt_id], |row| row.get::<_, f64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(weights))
    }

    // ========================================================================
    // Set results
    // ========================================================================

    /// Stored weight for one set, if that set has been logged
    pub fn set_weight(
        &self,
        exercise_attempt_id: ExerciseAttemptId,
        set_number: u32,
    ) -> Result<Option<f64>> {
        let conn = self.connect()?;
        let weight = conn
            .query_row(
                "SELECT weight FROM set_logs WHERE exercise_log_id = ?1 AND set_number = ?2",
                params![exercise_attempt_id, set_number],
                |row| row.get(0),
            )
            .optional()?;
        Ok(weight)
    }

    /// Insert or update one set as completed at `weight`
    pub fn upsert_set(
        &self,
        exercise_attempt_id: ExerciseAttemptId,
        set_number: u32,
        weight: f64,
    ) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO set_logs (exercise_log_id, set_number, weight, completed)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT(exercise_log_id, set_number)
             DO UPDATE SET weight = excluded.weight, completed = 1",
            params![exercise_attempt_id, set_number, weight],
        )?;
        tracing::debug!(
            "Logged set {} of exercise attempt {} at {}",
            set_number,
            exercise_attempt_id,
            weight
        );
        Ok(())
    }

    /// Logged sets of an exercise attempt with their row ids, by set number
    pub fn set_rows(&self, exercise_attempt_id: ExerciseAttemptId) -> Result<Vec<(i64, SetResult)>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, set_number, weight, completed FROM set_logs
             WHERE exercise_log_id = ?1 ORDER BY set_number",
        )?;
        let rows = stmt
            .query_map(params![exercise_attempt_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    SetResult {
                        set_number: row.get(1)?,
                        weight: row.get(2)?,
                        completed: row.get::<_, Option<bool>>(3)?.unwrap_or(false),
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Logged sets of an exercise attempt, by set number
    pub fn set_results(&self, exercise_attempt_id: ExerciseAttemptId) -> Result<Vec<SetResult>> {
        Ok(self
            .set_rows(exercise_attempt_id)?
            .into_iter()
            .map(|(_, set)| set)
            .collect())
    }

    /// Number of sets logged for an exercise attempt
    pub fn logged_set_count(&self, exercise_attempt_id: ExerciseAttemptId) -> Result<u32> {
        let conn = self.connect()?;
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM set_logs WHERE exercise_log_id = ?1",
            params![exercise_attempt_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Overwrite the weight of existing set rows in one transaction
    pub fn update_set_weights(&self, updates: &[(i64, f64)]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut changed = 0;
        for (set_id, weight) in updates {
            changed += tx.execute(
                "UPDATE set_logs SET weight = ?1 WHERE id = ?2",
                params![weight, set_id],
            )?;
        }
        tx.commit()?;
        tracing::info!("Updated {} set weights", changed);
        Ok(changed)
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    /// Heaviest completed set per exercise, ordered by exercise name
    pub fn personal_bests(&self, username: &str) -> Result<Vec<PersonalBest>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT el.exercise_name, MAX(sl.weight)
             FROM workout_logs wl
             JOIN exercise_logs el ON wl.id = el.workout_log_id
             JOIN set_logs sl ON el.id = sl.exercise_log_id
             WHERE wl.username = ?1 AND sl.completed = 1
             GROUP BY el.exercise_name
             ORDER BY el.exercise_name",
        )?;
        let bests = stmt
            .query_map(params![username], |row| {
                Ok(PersonalBest {
                    exercise_name: row.get(0)?,
                    weight: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bests)
    }

    /// Every exercise attempt and logged set of a user, newest workout first
    pub fn history_rows(&self, username: &str) -> Result<Vec<HistoryRow>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT wl.id, wl.date, wl.session_index, el.id, el.exercise_name,
                    sl.id, sl.set_number, sl.weight, sl.completed
             FROM workout_logs wl
             JOIN exercise_logs el ON wl.id = el.workout_log_id
             LEFT JOIN set_logs sl ON el.id = sl.exercise_log_id
             WHERE wl.username = ?1
             ORDER BY wl.date DESC, wl.id DESC, el.id, sl.set_number",
        )?;
        let rows = stmt
            .query_map(params![username], |row| {
                Ok(HistoryRow {
                    workout_id: row.get(0)?,
                    date: row.get(1)?,
                    session_index: row.get(2)?,
                    exercise_attempt_id: row.get(3)?,
                    exercise_name: row.get(4)?,
                    set_id: row.get(5)?,
                    set_number: row.get(6)?,
                    weight: row.get(7)?,
                    completed: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn attempt_from_row(row: &rusqlite::Row) -> rusqlite::Result<WorkoutAttempt> {
    Ok(WorkoutAttempt {
        id: row.get(0)?,
        username: row.get(1)?,
        session_index: row.get(2)?,
        date: row.get(3)?,
    })
}
