//! Workout state persistence with file locking.
//!
//! The CLI runs one transition per invocation, so the state machine's value
//! is kept in a JSON file between runs. A lost or unreadable file falls back
//! to `Idle`; an in-progress attempt can then be picked up again with resume.

use crate::workout::WorkoutState;
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl WorkoutState {
    /// Load workout state from a file with shared locking
    ///
    /// Returns `Idle` if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No workout state file at {:?}, starting idle", path);
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open workout state {:?}: {}. Starting idle.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock workout state {:?}: {}. Starting idle.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read workout state {:?}: {}. Starting idle.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<WorkoutState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded workout state ({}) from {:?}", state.name(), path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse workout state {:?}: {}. Starting idle.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save workout state to a file with exclusive locking
    ///
    /// Writes to a temp file in the same directory, syncs it, then renames
    /// it over the original.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "state path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved workout state ({}) to {:?}", self.name(), path);
        Ok(())
    }

    /// Load state, run a transition on it, and save it back.
    ///
    /// Nothing is saved when the transition fails.
    pub fn update<F, T>(path: &Path, f: F) -> Result<(Self, T)>
    where
        F: FnOnce(&mut WorkoutState) -> Result<T>,
    {
        let mut state = Self::load(path)?;
        let out = f(&mut state)?;
        state.save(path)?;
        Ok((state, out))
    }
}
