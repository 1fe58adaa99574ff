//! Session controller owning the consumption log.
//!
//! A `Tracker` owns the entries and the kinetics calibration, and hands
//! immutable snapshots to the pure engine per query. All mutation of the
//! log goes through this type.

use crate::bedtime::BedtimeInsights;
use crate::error::{Error, Result};
use crate::kinetics::{CurveSamples, Kinetics};
use crate::types::{DoseEvent, DrinkCatalog, LevelBand};
use crate::window::ChartWindow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Owns the dose event log and the kinetics calibration
#[derive(Clone, Debug)]
pub struct Tracker {
    kinetics: Kinetics,
    entries: Vec<DoseEvent>,
}

impl Tracker {
    pub fn new(kinetics: Kinetics, entries: Vec<DoseEvent>) -> Self {
        Self { kinetics, entries }
    }

    pub fn kinetics(&self) -> &Kinetics {
        &self.kinetics
    }

    /// Immutable snapshot of the log, in insertion order
    pub fn entries(&self) -> &[DoseEvent] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DoseEvent> {
        self.entries
    }

    /// Entries sorted newest first, for display
    pub fn log_newest_first(&self) -> Vec<&DoseEvent> {
        let mut sorted: Vec<&DoseEvent> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Log a dose. The amount must be positive and finite.
    pub fn add(
        &mut self,
        drink: impl Into<String>,
        caffeine_mg: f64,
        at: DateTime<Utc>,
        icon: impl Into<String>,
    ) -> Result<&DoseEvent> {
        if !caffeine_mg.is_finite() || caffeine_mg <= 0.0 {
            return Err(Error::Other(format!(
                "Dose must be a positive amount of caffeine, got {}mg",
                caffeine_mg
            )));
        }

        let entry = DoseEvent::new(drink, caffeine_mg, at, icon);
        tracing::info!("Logged {}mg of {} at {}", entry.caffeine_mg, entry.drink, entry.timestamp);
        self.entries.push(entry);
        let idx = self.entries.len() - 1;
        Ok(&self.entries[idx])
    }

    /// Log a dose of a catalog drink, optionally by serving-size name
    pub fn add_from_catalog(
        &mut self,
        catalog: &DrinkCatalog,
        name_or_id: &str,
        size: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<&DoseEvent> {
        let drink = catalog
            .find(name_or_id)
            .ok_or_else(|| Error::Catalog(format!("Unknown drink '{}'", name_or_id)))?;

        let caffeine_mg = drink.amount_for_size(size).ok_or_else(|| {
            Error::Catalog(format!(
                "Drink '{}' has no serving size '{}'",
                drink.name,
                size.unwrap_or_default()
            ))
        })?;

        let (name, icon) = (drink.name.clone(), drink.icon.clone());
        self.add(name, caffeine_mg, at, icon)
    }

    /// Remove an entry by id, returning it
    pub fn remove(&mut self, id: Uuid) -> Result<DoseEvent> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::Store(format!("No entry with id {}", id)))?;

        let removed = self.entries.remove(idx);
        tracing::info!("Removed entry {} ({})", removed.id, removed.drink);
        Ok(removed)
    }

    /// Correct an entry's timestamp.
    ///
    /// Meant for time-of-day fixes; callers decide how (and whether) the
    /// date part changes.
    pub fn retime(&mut self, id: Uuid, new_timestamp: DateTime<Utc>) -> Result<&DoseEvent> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::Store(format!("No entry with id {}", id)))?;

        tracing::info!(
            "Retimed entry {} from {} to {}",
            entry.id,
            entry.timestamp,
            new_timestamp
        );
        entry.timestamp = new_timestamp;
        Ok(entry)
    }

    // ========================================================================
    // Derived queries (thin delegations to the pure engine)
    // ========================================================================

    pub fn level_at(&self, at: DateTime<Utc>) -> f64 {
        self.kinetics.level_at(&self.entries, at)
    }

    pub fn level_band_at(&self, at: DateTime<Utc>) -> LevelBand {
        LevelBand::for_level(self.level_at(at))
    }

    pub fn time_until_threshold(
        &self,
        threshold_mg: f64,
        reference: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        self.kinetics
            .time_until_threshold(&self.entries, threshold_mg, reference)
    }

    pub fn bedtime_insights(
        &self,
        bedtime: DateTime<Utc>,
        threshold_mg: f64,
        now: DateTime<Utc>,
    ) -> BedtimeInsights {
        BedtimeInsights::compute(&self.kinetics, &self.entries, bedtime, threshold_mg, now)
    }

    pub fn sample_curve(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step_minutes: u32,
    ) -> CurveSamples<'_> {
        self.kinetics.sample_curve(&self.entries, start, end, step_minutes)
    }

    pub fn default_window(&self, now: DateTime<Utc>) -> ChartWindow {
        ChartWindow::default_for(&self.kinetics, &self.entries, now)
    }
}
