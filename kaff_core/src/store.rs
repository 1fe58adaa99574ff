//! Consumption log persistence with file locking.
//!
//! The entry log is a single JSON array (schema
//! `{id, drink, caffeineAmount, timestamp, icon}` with ISO-8601 timestamps)
//! rewritten whole on every save. Reads take a shared lock; saves write a
//! locked temp file and atomically rename it over the original. A missing
//! or corrupt file is treated as an empty log, never a fatal error.

use crate::error::{Error, Result};
use crate::DoseEvent;
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File-backed store for the dose event log
#[derive(Clone, Debug)]
pub struct EntryStore {
    path: PathBuf,
}

impl EntryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries with shared locking
    ///
    /// Returns an empty log if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns an empty log.
    pub fn load(&self) -> Result<Vec<DoseEvent>> {
        if !self.path.exists() {
            tracing::info!("No entry file found, starting with an empty log");
            return Ok(Vec::new());
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open entry file {:?}: {}. Treating as empty.",
                    self.path,
                    e
                );
                return Ok(Vec::new());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock entry file {:?}: {}. Treating as empty.",
                self.path,
                e
            );
            return Ok(Vec::new());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read entry file {:?}: {}. Treating as empty.",
                self.path,
                e
            );
            return Ok(Vec::new());
        }

        file.unlock()?;

        match serde_json::from_str::<Vec<DoseEvent>>(&contents) {
            Ok(entries) => {
                tracing::debug!("Loaded {} entries from {:?}", entries.len(), self.path);
                Ok(entries)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse entry file {:?}: {}. Treating as empty.",
                    self.path,
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Save the full entry log with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, entries: &[DoseEvent]) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(self.path.parent().ok_or_else(|| {
            Error::Store("entry path missing parent".into())
        })?)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(entries)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old entry file
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} entries to {:?}", entries.len(), self.path);
        Ok(())
    }

    /// Load the log, modify it, and save it back atomically
    pub fn update<F>(&self, f: F) -> Result<Vec<DoseEvent>>
    where
        F: FnOnce(&mut Vec<DoseEvent>) -> Result<()>,
    {
        let mut entries = self.load()?;
        f(&mut entries)?;
        self.save(&entries)?;
        Ok(entries)
    }
}
