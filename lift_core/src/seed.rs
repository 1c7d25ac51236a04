//! Program catalog seeding from a tabular (CSV) source.
//!
//! Source layout, one row per line, no header:
//! - leading rows can be skipped (title rows, notes)
//! - a row whose first cell is `DAY` is a column label and ignored
//! - a non-empty first cell starts a new session; the third cell holds its
//!   sets×reps notation such as `5x5` or `3 x 8 reps`
//! - an empty first cell with a non-empty second cell is an exercise of the
//!   current session

use crate::types::*;
use crate::Result;
use std::io::Read;
use std::path::Path;

/// Sets×reps used when a session header's notation can't be parsed
pub const FALLBACK_SETS_REPS: (u32, u32) = (5, 5);

struct PendingSession {
    header: String,
    sets_reps: Option<String>,
    exercises: Vec<String>,
}

/// Load a program from a CSV file
pub fn load_program(path: &Path, skip_rows: usize) -> Result<Catalog> {
    let file = std::fs::File::open(path)?;
    let catalog = parse_program(file, skip_rows)?;
    tracing::info!(
        "Parsed {} sessions from {:?}",
        catalog.sessions.len(),
        path
    );
    Ok(catalog)
}

/// Parse a program from CSV data
pub fn parse_program<R: Read>(reader: R, skip_rows: usize) -> Result<Catalog> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut pending: Vec<PendingSession> = Vec::new();
    let mut current: Option<PendingSession> = None;

    for (row_num, record) in reader.records().enumerate().skip(skip_rows) {
        let record = record?;
        let cell = |i: usize| {
            record
                .get(i)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        match (cell(0), cell(1)) {
            (Some(first), _) if first.eq_ignore_ascii_case("DAY") => continue,
            (Some(first), _) => {
                if let Some(done) = current.take() {
                    pending.push(done);
                }
                current = Some(PendingSession {
                    header: first.to_string(),
                    sets_reps: cell(2).map(str::to_string),
                    exercises: Vec::new(),
                });
            }
            (None, Some(exercise)) => match current.as_mut() {
                Some(session) => session.exercises.push(exercise.to_string()),
                None => tracing::warn!(
                    "Row {}: exercise '{}' appears before any session header, skipping",
                    row_num + 1,
                    exercise
                ),
            },
            (None, None) => {}
        }
    }
    if let Some(done) = current.take() {
        pending.push(done);
    }

    let sessions = pending
        .into_iter()
        .filter(|p| {
            if p.exercises.is_empty() {
                tracing::debug!("Dropping session '{}' with no exercises", p.header);
            }
            !p.exercises.is_empty()
        })
        .enumerate()
        .map(|(i, p)| {
            let index = i as u32 + 1;
            let (target_sets, target_reps) = p
                .sets_reps
                .as_deref()
                .and_then(parse_sets_reps)
                .unwrap_or_else(|| {
                    tracing::warn!(
                        "Session {} ('{}'): unreadable sets x reps {:?}, using {}x{}",
                        index,
                        p.header,
                        p.sets_reps,
                        FALLBACK_SETS_REPS.0,
                        FALLBACK_SETS_REPS.1
                    );
                    FALLBACK_SETS_REPS
                });

            Session {
                index,
                name: format!("Session {}", index),
                exercises: p
                    .exercises
                    .into_iter()
                    .map(|name| SessionExercise {
                        name,
                        target_sets,
                        target_reps,
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(Catalog { sessions })
}

/// Parse `SxR` notation such as `5x5`, `5 X 5` or `3 x 8 reps`
pub fn parse_sets_reps(notation: &str) -> Option<(u32, u32)> {
    let lower = notation.to_ascii_lowercase();
    let mut parts = lower.split('x');
    let sets = leading_number(parts.next()?)?;
    let reps = leading_number(parts.next()?)?;
    if parts.next().is_some() || sets == 0 || reps == 0 {
        return None;
    }
    Some((sets, reps))
}

fn leading_number(part: &str) -> Option<u32> {
    part.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
Strength Program,,
notes,,
DAY,EXERCISE,SETS
Week 1 Day 1,,5x5
,Squat,
,Bench Press,
,Barbell Row,
Week 1 Day 2,,3 x 8 reps
,Deadlift,
,Overhead Press,
";

    #[test]
    fn test_parse_sessions_and_exercises() {
        let catalog = parse_program(SHEET.as_bytes(), 2).unwrap();
        assert_eq!(catalog.sessions.len(), 2);

        let first = &catalog.sessions[0];
        assert_eq!(first.index, 1);
        assert_eq!(first.name, "Session 1");
        assert_eq!(first.exercises.len(), 3);
        assert_eq!(first.exercises[0].name, "Squat");
        assert_eq!(
            (first.exercises[0].target_sets, first.exercises[0].target_reps),
            (5, 5)
        );

        let second = &catalog.sessions[1];
        assert_eq!(second.exercises[1].name, "Overhead Press");
        assert_eq!(
            (second.exercises[1].target_sets, second.exercises[1].target_reps),
            (3, 8)
        );
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn test_day_marker_is_ignored() {
        // Without skipping, the title row becomes an empty session and is dropped
        let catalog = parse_program(SHEET.as_bytes(), 0).unwrap();
        assert_eq!(catalog.sessions.len(), 2);
        assert_eq!(catalog.sessions[0].exercises[0].name, "Squat");
    }

    #[test]
    fn test_unparsable_sets_reps_falls_back() {
        let data = "Day A,,heavy\n,Squat,\n";
        let catalog = parse_program(data.as_bytes(), 0).unwrap();
        let squat = &catalog.sessions[0].exercises[0];
        assert_eq!((squat.target_sets, squat.target_reps), FALLBACK_SETS_REPS);
    }

    #[test]
    fn test_orphan_exercise_is_skipped() {
        let data = ",Curl\nDay A,,4x6\n,Squat\n";
        let catalog = parse_program(data.as_bytes(), 0).unwrap();
        assert_eq!(catalog.sessions.len(), 1);
        assert_eq!(catalog.sessions[0].exercises.len(), 1);
        assert_eq!(catalog.sessions[0].exercises[0].target_sets, 4);
    }

    #[test]
    fn test_parse_sets_reps() {
        assert_eq!(parse_sets_reps("5x5"), Some((5, 5)));
        assert_eq!(parse_sets_reps("3 X 10"), Some((3, 10)));
        assert_eq!(parse_sets_reps(" 4 x 8 reps "), Some((4, 8)));
        assert_eq!(parse_sets_reps("heavy"), None);
        assert_eq!(parse_sets_reps("0x5"), None);
        assert_eq!(parse_sets_reps("5x5x5"), None);
    }

    #[test]
    fn test_load_program_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("program.csv");
        std::fs::write(&path, SHEET).unwrap();

        let catalog = load_program(&path, 2).unwrap();
        assert_eq!(catalog.sessions.len(), 2);
    }
}
