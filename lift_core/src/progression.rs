//! Progressive-overload weight suggestions.
//!
//! Rules, applied to the most recent prior attempt of the same exercise in the
//! same session slot:
//! - Fully logged (one weight per target set): lowest weight + one step
//! - Partially logged: repeat the lowest weight
//! - Nothing logged, or no prior attempt: no suggestion (`0.0`)

use crate::store::LogStore;
use crate::{PlannedExercise, PriorLookup, Result, Session, SuggestionKind};
use chrono::NaiveDate;

/// Weight added after a fully logged attempt
pub const DEFAULT_INCREMENT: f64 = 5.0;

/// Suggested working weight using the default step.
///
/// An empty slice means either no prior attempt or a prior attempt with
/// nothing logged; both yield `0.0`.
pub fn suggest_weight(prior_set_weights: &[f64], target_sets: u32) -> f64 {
    suggest(Some(prior_set_weights), target_sets, DEFAULT_INCREMENT).0
}

/// Suggested weight and how it was derived
pub fn suggest(
    prior_set_weights: Option<&[f64]>,
    target_sets: u32,
    increment: f64,
) -> (f64, SuggestionKind) {
    let weights = match prior_set_weights {
        Some(w) if !w.is_empty() => w,
        _ => return (0.0, SuggestionKind::New),
    };

    let lowest = weights.iter().copied().fold(f64::INFINITY, f64::min);

    if weights.len() == target_sets as usize {
        (lowest + increment, SuggestionKind::Increase)
    } else {
        (lowest, SuggestionKind::Repeat)
    }
}

/// Plan every exercise of `session` for `username`.
///
/// `lookup` selects which prior attempts count: the preview path considers
/// any date, the resume path only attempts dated before `today` so that the
/// attempt being resumed is not its own reference.
pub fn plan_session(
    store: &LogStore,
    username: &str,
    session: &Session,
    lookup: PriorLookup,
    today: NaiveDate,
    increment: f64,
) -> Result<Vec<PlannedExercise>> {
    let mut planned = Vec::with_capacity(session.exercises.len());

    for ex in &session.exercises {
        let prior =
            store.prior_set_weights(username, session.index, &ex.name, lookup, today)?;
        let (suggested_weight, suggestion) = suggest(prior.as_deref(), ex.target_sets, increment);

        tracing::debug!(
            "Planned {} for session {}: {:?} at {}",
            ex.name,
            session.index,
            suggestion,
            suggested_weight
        );

        planned.push(PlannedExercise {
            name: ex.name.clone(),
            target_sets: ex.target_sets,
            target_reps: ex.target_reps,
            suggested_weight,
            suggestion,
        });
    }

    Ok(planned)
}
