//! Default time-window selection for the level chart.
//!
//! A UX heuristic layered on top of the pure engine: pick bounds that show
//! the tail of recent consumption and the projected decay, without dragging
//! in days of flat zero. The engine primitives underneath stay exact.

use crate::kinetics::Kinetics;
use crate::DoseEvent;
use chrono::{DateTime, Duration, Utc};

/// Coarse scan step used when probing for window edges
const SCAN_STEP_MINUTES: i64 = 30;
/// How far back the window may reach
const LOOKBACK_CAP_HOURS: i64 = 24;
/// How far forward the window may reach
const LOOKAHEAD_CAP_HOURS: i64 = 36;
/// Level considered "present" when searching for the left edge
const START_EPSILON_MG: f64 = 0.5;
/// Level considered "gone" when searching for the right edge
const END_EPSILON_MG: f64 = 1.0;
/// Lookahead used when the level is already negligible
const IDLE_LOOKAHEAD_HOURS: i64 = 8;
/// Minimum total window width
const MIN_WIDTH_HOURS: i64 = 6;

/// Chart bounds, inclusive on both ends
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ChartWindow {
    /// Choose default bounds around `now` for the given entries.
    ///
    /// Scans backward (up to 24h, 30-minute steps) for the earliest point
    /// where the level exceeds 0.5mg and starts 1h before it; scans forward
    /// (up to 36h) for where the level drops below 1mg and ends 2h after,
    /// or uses a fixed 8h lookahead when already below. A 6h minimum width
    /// is enforced by extending the end.
    pub fn default_for(kinetics: &Kinetics, entries: &[DoseEvent], now: DateTime<Utc>) -> Self {
        let step = Duration::minutes(SCAN_STEP_MINUTES);

        let lookback_cap = now - Duration::hours(LOOKBACK_CAP_HOURS);
        let mut earliest_active = None;
        let mut probe = now;
        while probe >= lookback_cap {
            if kinetics.level_at(entries, probe) > START_EPSILON_MG {
                earliest_active = Some(probe);
            }
            probe = probe - step;
        }
        let start = match earliest_active {
            Some(t) => (t - Duration::hours(1)).max(lookback_cap),
            None => now - Duration::hours(1),
        };

        let lookahead_cap = now + Duration::hours(LOOKAHEAD_CAP_HOURS);
        let end = if kinetics.level_at(entries, now) > END_EPSILON_MG {
            let mut crossing = None;
            let mut probe = now;
            while probe <= lookahead_cap {
                if kinetics.level_at(entries, probe) < END_EPSILON_MG {
                    crossing = Some(probe);
                    break;
                }
                probe = probe + step;
            }
            match crossing {
                Some(t) => (t + Duration::hours(2)).min(lookahead_cap),
                None => lookahead_cap,
            }
        } else {
            now + Duration::hours(IDLE_LOOKAHEAD_HOURS)
        };

        let end = end.max(start + Duration::hours(MIN_WIDTH_HOURS));

        ChartWindow { start, end }
    }

    pub fn width(&self) -> Duration {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 14, 0, 0).unwrap()
    }

    fn entry(mg: f64, at: DateTime<Utc>) -> DoseEvent {
        DoseEvent::new("Test", mg, at, "☕")
    }

    #[test]
    fn test_empty_entries_short_window() {
        let k = Kinetics::new(5.0);
        let w = ChartWindow::default_for(&k, &[], now());

        assert_eq!(w.start, now() - Duration::hours(1));
        assert_eq!(w.end, now() + Duration::hours(IDLE_LOOKAHEAD_HOURS));
    }

    #[test]
    fn test_recent_dose_window() {
        let k = Kinetics::new(5.0);
        let entries = vec![entry(100.0, now() - Duration::hours(2))];
        let w = ChartWindow::default_for(&k, &entries, now());

        // Level first exceeds 0.5mg at the dose instant, so the window
        // starts an hour before it.
        assert_eq!(w.start, now() - Duration::hours(3));
        // 100mg two hours in takes well over six hours to fall below 1mg.
        assert!(w.end > now() + Duration::hours(6));
        assert!(w.end <= now() + Duration::hours(LOOKAHEAD_CAP_HOURS));
    }

    #[test]
    fn test_lookback_cap() {
        let k = Kinetics::new(5.0);
        // Dosed heavily 30 hours ago; still traceable, but the lookback
        // stops at 24h.
        let entries = vec![entry(400.0, now() - Duration::hours(30))];
        let w = ChartWindow::default_for(&k, &entries, now());

        assert_eq!(w.start, now() - Duration::hours(24));
    }

    #[test]
    fn test_lookahead_cap() {
        let k = Kinetics::new(5.0);
        // A fresh 10g-equivalent level stays above 1mg for far longer
        // than the 36h lookahead.
        let entries = vec![entry(10_000.0, now())];
        let w = ChartWindow::default_for(&k, &entries, now());

        assert_eq!(w.end, now() + Duration::hours(36));
    }

    #[test]
    fn test_minimum_width_enforced() {
        let k = Kinetics::new(5.0);
        // A tiny dose half an hour ago crosses below 1mg almost
        // immediately, which would leave a window under six hours wide.
        let entries = vec![entry(1.2, now() - Duration::minutes(30))];
        let w = ChartWindow::default_for(&k, &entries, now());

        assert_eq!(w.width(), Duration::hours(6));
        assert_eq!(w.end, w.start + Duration::hours(6));
    }
}
