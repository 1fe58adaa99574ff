//! Bedtime setting and sleep projections.
//!
//! The bedtime is a scalar `HH:MM` (24-hour) setting. Resolving it to an
//! instant rolls it to the next day when it has already passed, so it can
//! be used directly as a query time against the kinetics engine.

use crate::error::{Error, Result};
use crate::kinetics::{hours_between, Kinetics};
use crate::DoseEvent;
use chrono::{DateTime, Days, Duration, NaiveTime, TimeZone, Utc};

/// Conservative target level at bedtime (mg)
pub const DEFAULT_BEDTIME_THRESHOLD_MG: f64 = 50.0;

/// Parse a `HH:MM` 24-hour bedtime string
pub fn parse_bedtime(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| Error::Time(format!("Invalid bedtime '{}' (expected HH:MM): {}", s, e)))
}

/// Resolve a bedtime to its next occurrence strictly after `now`.
///
/// A bedtime that has already passed today rolls over to tomorrow. Works
/// in any timezone so callers can resolve against local wall-clock time
/// and hand the result to the engine as a plain instant.
pub fn next_bedtime<Tz: TimeZone>(bedtime: NaiveTime, now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    for day_offset in 0..3u64 {
        let Some(date) = now.date_naive().checked_add_days(Days::new(day_offset)) else {
            break;
        };
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(bedtime)).earliest() {
            if candidate > *now {
                return candidate;
            }
        }
    }
    // Only reachable around pathological DST transitions
    now.clone() + Duration::days(1)
}

/// Derived bedtime projections for the current entry snapshot
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BedtimeInsights {
    pub bedtime: DateTime<Utc>,
    pub hours_until_bed: f64,
    /// Projected level at bedtime, assuming no further doses
    pub projected_at_bed_mg: f64,
    /// Largest dose consumable now that still meets the threshold at bedtime
    pub max_additional_mg: f64,
    /// Largest single fresh dose that decays to the threshold by bedtime
    pub max_single_dose_mg: f64,
    pub on_track: bool,
    pub past_bedtime: bool,
}

impl BedtimeInsights {
    pub fn compute(
        kinetics: &Kinetics,
        entries: &[DoseEvent],
        bedtime: DateTime<Utc>,
        threshold_mg: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let hours_until_bed = hours_between(now, bedtime);
        let projected_at_bed_mg = kinetics.level_at(entries, bedtime);

        Self {
            bedtime,
            hours_until_bed,
            projected_at_bed_mg,
            max_additional_mg: kinetics.max_additional_dose(entries, bedtime, threshold_mg, now),
            max_single_dose_mg: kinetics.max_dose_for_target(hours_until_bed, threshold_mg),
            on_track: projected_at_bed_mg <= threshold_mg,
            past_bedtime: hours_until_bed <= 0.0,
        }
    }
}
