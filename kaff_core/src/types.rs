//! Core domain types for the Kaff caffeine tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Dose events (one timestamped caffeine intake)
//! - Drinks and serving-size variants
//! - The drink catalog
//! - Level bands for presentation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Dose Event
// ============================================================================

/// A single timestamped caffeine intake, modeled as an instantaneous bolus.
///
/// The kinetics engine reads these as an immutable snapshot; it never
/// creates, mutates, or destroys them. `drink` and `icon` are opaque
/// display strings.
///
/// Serialized field names match the persisted JSON schema
/// (`{id, drink, caffeineAmount, timestamp, icon}` with ISO-8601 timestamps).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DoseEvent {
    pub id: Uuid,
    pub drink: String,
    #[serde(rename = "caffeineAmount")]
    pub caffeine_mg: f64,
    pub timestamp: DateTime<Utc>,
    pub icon: String,
}

impl DoseEvent {
    /// Create a new dose event at the given instant.
    ///
    /// Invariant: `caffeine_mg > 0`. Enforcing this is the caller's job
    /// (the engine treats a non-positive dose as a contract violation).
    pub fn new(drink: impl Into<String>, caffeine_mg: f64, timestamp: DateTime<Utc>, icon: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            drink: drink.into(),
            caffeine_mg,
            timestamp,
            icon: icon.into(),
        }
    }
}

// ============================================================================
// Drink Catalog Types
// ============================================================================

/// A serving-size variant of a drink (e.g., a double espresso)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServingSize {
    pub name: String,
    pub caffeine_mg: f64,
}

/// A drink definition with its default serving and optional size variants
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Drink {
    pub id: String,
    pub name: String,
    /// Caffeine content of the default serving
    pub caffeine_mg: f64,
    /// Opaque display tag carried onto logged entries
    pub icon: String,
    pub sizes: Vec<ServingSize>,
}

impl Drink {
    /// Resolve the caffeine amount for an optional serving-size name.
    ///
    /// Returns the default serving when `size` is None, or None when the
    /// named size does not exist for this drink.
    pub fn amount_for_size(&self, size: Option<&str>) -> Option<f64> {
        match size {
            None => Some(self.caffeine_mg),
            Some(name) => self
                .sizes
                .iter()
                .find(|s| s.name.eq_ignore_ascii_case(name))
                .map(|s| s.caffeine_mg),
        }
    }
}

/// The complete catalog of known drinks, keyed by drink id
#[derive(Clone, Debug, Default)]
pub struct DrinkCatalog {
    pub drinks: HashMap<String, Drink>,
}

// ============================================================================
// Level Bands
// ============================================================================

/// Coarse presentation band for a caffeine level
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LevelBand {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl LevelBand {
    /// Classify a level in mg into its band
    pub fn for_level(level_mg: f64) -> Self {
        if level_mg < 25.0 {
            LevelBand::Low
        } else if level_mg < 75.0 {
            LevelBand::Moderate
        } else if level_mg < 150.0 {
            LevelBand::High
        } else {
            LevelBand::VeryHigh
        }
    }

    /// Short status line shown next to the current level
    pub fn status_text(&self) -> &'static str {
        match self {
            LevelBand::Low => "Low - Perfect for sleep",
            LevelBand::Moderate => "Moderate - Nicely alert",
            LevelBand::High => "High - Feeling energized",
            LevelBand::VeryHigh => "Very High - Maybe slow down?",
        }
    }
}
