#![forbid(unsafe_code)]

//! Core domain model and business logic for liftlog.
//!
//! This crate provides:
//! - Domain types (catalog sessions, workout attempts, set results)
//! - Program catalog and CSV seeding
//! - Progression engine (progressive-overload weight suggestions)
//! - Workout state machine
//! - Persistence (SQLite log store, workout state file)
//! - History, bulk edits, personal bests, CSV export

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod identity;
pub mod seed;
pub mod store;
pub mod state;
pub mod progression;
pub mod workout;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use identity::Identity;
pub use store::LogStore;
pub use progression::suggest_weight;
pub use workout::{ActiveWorkout, SetWrite, StagedSession, WorkoutEngine, WorkoutState};
pub use history::{edit_workout_weights, load_history, WeightEdit};
