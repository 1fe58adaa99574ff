#![forbid(unsafe_code)]

//! Core domain model and business logic for the Kaff caffeine tracker.
//!
//! This crate provides:
//! - Domain types (dose events, drinks, level bands)
//! - First-order elimination-kinetics engine
//! - Bedtime projections and chart windowing
//! - Drink catalog
//! - Persistence (entry store, CSV export, config)

pub mod types;
pub mod error;
pub mod kinetics;
pub mod window;
pub mod bedtime;
pub mod catalog;
pub mod tracker;
pub mod clock;
pub mod config;
pub mod logging;
pub mod store;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use kinetics::{Kinetics, DEFAULT_HALF_LIFE_HOURS, SLOW_METABOLIZER_HALF_LIFE_HOURS};
pub use window::ChartWindow;
pub use bedtime::{next_bedtime, parse_bedtime, BedtimeInsights, DEFAULT_BEDTIME_THRESHOLD_MG};
pub use catalog::{build_default_catalog, get_default_catalog};
pub use tracker::Tracker;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use store::EntryStore;
pub use csv_export::export_entries_csv;
