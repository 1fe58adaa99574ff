//! First-order elimination-kinetics engine.
//!
//! Everything here is pure and time-agnostic: operations take an immutable
//! snapshot of dose events plus explicit query instants, and never read a
//! wall clock. The single tunable is the biological half-life, from which
//! the elimination rate constant is derived as `k = ln(2) / H`.

use crate::DoseEvent;
use chrono::{DateTime, Duration, Utc};

/// Default half-life calibration in hours
pub const DEFAULT_HALF_LIFE_HOURS: f64 = 5.0;

/// Alternate calibration for slow-to-moderate metabolizers
pub const SLOW_METABOLIZER_HALF_LIFE_HOURS: f64 = 6.5;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Fractional hours from `from` to `to` (negative when `to` is earlier)
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

fn hours_to_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * MILLIS_PER_HOUR).round() as i64)
}

/// The elimination-kinetics model, parameterized by half-life.
///
/// `C(t) = C0 * e^(-k * t)` for a single dose; multi-dose levels are the
/// superposition of independent decays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kinetics {
    half_life_hours: f64,
}

impl Default for Kinetics {
    fn default() -> Self {
        Self::new(DEFAULT_HALF_LIFE_HOURS)
    }
}

impl Kinetics {
    /// Create a model with the given half-life in hours
    pub fn new(half_life_hours: f64) -> Self {
        Self { half_life_hours }
    }

    pub fn half_life_hours(&self) -> f64 {
        self.half_life_hours
    }

    /// Elimination rate constant `k = ln(2) / H`, per hour
    pub fn elimination_rate(&self) -> f64 {
        std::f64::consts::LN_2 / self.half_life_hours
    }

    /// Caffeine remaining from a single dose after `hours_elapsed`.
    ///
    /// A dose has no effect before it is consumed: negative elapsed time
    /// yields 0, not the full dose. At zero elapsed time the full dose is
    /// present; afterwards the level decays monotonically toward 0.
    pub fn remaining_from_dose(&self, dose_mg: f64, hours_elapsed: f64) -> f64 {
        if hours_elapsed < 0.0 {
            return 0.0;
        }
        dose_mg * (-self.elimination_rate() * hours_elapsed).exp()
    }

    /// Total caffeine level from all entries at the query instant.
    ///
    /// Superposition: each entry contributes independently, so entries can
    /// be added, removed, or reordered without recomputing the others.
    pub fn level_at(&self, entries: &[DoseEvent], at: DateTime<Utc>) -> f64 {
        entries
            .iter()
            .map(|entry| self.remaining_from_dose(entry.caffeine_mg, hours_between(entry.timestamp, at)))
            // fold from +0.0: `Sum<f64>` seeds with -0.0, which an empty log
            // would surface as "-0mg" in formatted output
            .fold(0.0, |acc, mg| acc + mg)
    }

    /// When the level will next cross down through `threshold_mg`, starting
    /// from `reference`, assuming no further doses.
    ///
    /// Returns None when the level is already at or below the threshold (no
    /// future crossing exists going forward).
    ///
    /// Uses the lumped-exponential approximation: the current total level is
    /// treated as one equivalent dose decaying at `k`, giving
    /// `t = ln(level / threshold) / k`. Exact for a single dose (or doses of
    /// equal age); slightly early otherwise.
    pub fn time_until_threshold(
        &self,
        entries: &[DoseEvent],
        threshold_mg: f64,
        reference: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if threshold_mg <= 0.0 {
            return None;
        }

        let level = self.level_at(entries, reference);
        if level <= threshold_mg {
            return None;
        }

        let hours = (level / threshold_mg).ln() / self.elimination_rate();
        Some(reference + hours_to_duration(hours))
    }

    /// The single fresh dose taken now that decays to exactly `threshold_mg`
    /// after `hours_until_target` hours.
    ///
    /// Returns 0 when no time remains (any dose now exceeds the target
    /// instantly).
    pub fn max_dose_for_target(&self, hours_until_target: f64, threshold_mg: f64) -> f64 {
        if hours_until_target <= 0.0 {
            return 0.0;
        }
        threshold_mg * (self.elimination_rate() * hours_until_target).exp()
    }

    /// Maximum additional dose consumable at `reference` while staying at or
    /// below `threshold_mg` when `target_time` arrives.
    ///
    /// Projects existing entries to the target, then inverts the remaining
    /// headroom through the decay between now and then. Returns 0 when the
    /// target has passed or the projection already exceeds the threshold.
    pub fn max_additional_dose(
        &self,
        entries: &[DoseEvent],
        target_time: DateTime<Utc>,
        threshold_mg: f64,
        reference: DateTime<Utc>,
    ) -> f64 {
        let hours_until_target = hours_between(reference, target_time);
        if hours_until_target <= 0.0 {
            return 0.0;
        }

        let headroom = threshold_mg - self.level_at(entries, target_time);
        if headroom <= 0.0 {
            return 0.0;
        }

        self.max_dose_for_target(hours_until_target, headroom)
    }

    /// Evenly spaced samples of the aggregate level across `[start, end]`.
    ///
    /// Lazy and restartable: the iterator is recomputed deterministically
    /// from its inputs and caches nothing. Empty iff the entry set is empty.
    pub fn sample_curve<'a>(
        &self,
        entries: &'a [DoseEvent],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step_minutes: u32,
    ) -> CurveSamples<'a> {
        CurveSamples {
            kinetics: *self,
            entries,
            next: if entries.is_empty() { None } else { Some(start) },
            end,
            step: Duration::minutes(step_minutes.max(1) as i64),
        }
    }

    /// Decay samples for a single synthetic dose, for the educational
    /// single-dose chart. Always non-empty for a non-negative projection.
    pub fn decay_curve(&self, dose_mg: f64, hours_to_project: f64, step_minutes: u32) -> DecayCurve {
        DecayCurve {
            kinetics: *self,
            dose_mg,
            next_hours: 0.0,
            end_hours: hours_to_project,
            step_hours: step_minutes.max(1) as f64 / 60.0,
        }
    }
}

/// One sample of the aggregate level curve
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvePoint {
    pub time: DateTime<Utc>,
    pub level_mg: f64,
}

/// Iterator over aggregate level samples. See [`Kinetics::sample_curve`].
#[derive(Clone, Debug)]
pub struct CurveSamples<'a> {
    kinetics: Kinetics,
    entries: &'a [DoseEvent],
    next: Option<DateTime<Utc>>,
    end: DateTime<Utc>,
    step: Duration,
}

impl Iterator for CurveSamples<'_> {
    type Item = CurvePoint;

    fn next(&mut self) -> Option<CurvePoint> {
        let time = self.next?;
        if time > self.end {
            self.next = None;
            return None;
        }
        self.next = Some(time + self.step);
        Some(CurvePoint {
            time,
            level_mg: self.kinetics.level_at(self.entries, time),
        })
    }
}

/// One sample of a single-dose decay curve
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecayPoint {
    pub hours: f64,
    pub remaining_mg: f64,
    pub percent_remaining: f64,
}

/// Iterator over single-dose decay samples. See [`Kinetics::decay_curve`].
#[derive(Clone, Debug)]
pub struct DecayCurve {
    kinetics: Kinetics,
    dose_mg: f64,
    next_hours: f64,
    end_hours: f64,
    step_hours: f64,
}

impl Iterator for DecayCurve {
    type Item = DecayPoint;

    fn next(&mut self) -> Option<DecayPoint> {
        if self.next_hours > self.end_hours {
            return None;
        }
        let hours = self.next_hours;
        self.next_hours += self.step_hours;

        let remaining_mg = self.kinetics.remaining_from_dose(self.dose_mg, hours);
        let percent_remaining = if self.dose_mg > 0.0 {
            remaining_mg / self.dose_mg * 100.0
        } else {
            0.0
        };

        Some(DecayPoint {
            hours,
            remaining_mg,
            percent_remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn entry(mg: f64, at: DateTime<Utc>) -> DoseEvent {
        DoseEvent::new("Test", mg, at, "☕")
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {} ≈ {}", a, b);
    }

    #[test]
    fn test_full_dose_at_zero_elapsed() {
        let k = Kinetics::new(5.0);
        assert_close(k.remaining_from_dose(100.0, 0.0), 100.0);
        assert_close(k.remaining_from_dose(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_zero_before_consumption() {
        let k = Kinetics::new(5.0);
        assert_eq!(k.remaining_from_dose(100.0, -0.001), 0.0);
        assert_eq!(k.remaining_from_dose(100.0, -12.0), 0.0);
    }

    #[test]
    fn test_half_life_roundtrip() {
        let k = Kinetics::new(5.0);
        assert_close(k.remaining_from_dose(100.0, 5.0), 50.0);

        let slow = Kinetics::new(SLOW_METABOLIZER_HALF_LIFE_HOURS);
        assert_close(slow.remaining_from_dose(200.0, 6.5), 100.0);
    }

    #[test]
    fn test_strictly_decreasing() {
        let k = Kinetics::default();
        let mut prev = k.remaining_from_dose(100.0, 0.0);
        for i in 1..=48 {
            let level = k.remaining_from_dose(100.0, i as f64 * 0.5);
            assert!(level < prev);
            assert!(level > 0.0);
            prev = level;
        }
    }

    #[test]
    fn test_level_at_empty_is_zero() {
        let k = Kinetics::default();
        assert_eq!(k.level_at(&[], t0()), 0.0);
    }

    #[test]
    fn test_superposition() {
        let k = Kinetics::new(5.0);
        let a = vec![entry(63.0, t0())];
        let b = vec![entry(80.0, t0() + Duration::hours(2))];
        let both: Vec<_> = a.iter().chain(b.iter()).cloned().collect();

        let at = t0() + Duration::hours(6);
        assert_close(k.level_at(&both, at), k.level_at(&a, at) + k.level_at(&b, at));
    }

    #[test]
    fn test_two_dose_scenario() {
        // 63mg at T, 80mg at T+2h: at T+2h the second dose is fully present
        // and the first has decayed for two hours.
        let k = Kinetics::new(5.0);
        let entries = vec![entry(63.0, t0()), entry(80.0, t0() + Duration::hours(2))];

        let level = k.level_at(&entries, t0() + Duration::hours(2));
        let expected = 63.0 * (-k.elimination_rate() * 2.0).exp() + 80.0;
        assert_close(level, expected);
    }

    #[test]
    fn test_threshold_single_dose_exact() {
        // 100mg at t0 with threshold 50 is exactly one half-life away.
        let k = Kinetics::new(5.0);
        let entries = vec![entry(100.0, t0())];

        let when = k.time_until_threshold(&entries, 50.0, t0()).unwrap();
        assert_eq!(when, t0() + Duration::hours(5));
    }

    #[test]
    fn test_threshold_none_when_already_below() {
        let k = Kinetics::new(5.0);
        let entries = vec![entry(40.0, t0())];

        assert!(k.time_until_threshold(&entries, 50.0, t0()).is_none());
        assert!(k.time_until_threshold(&[], 50.0, t0()).is_none());
    }

    #[test]
    fn test_threshold_guards_nonpositive_threshold() {
        let k = Kinetics::new(5.0);
        let entries = vec![entry(100.0, t0())];

        assert!(k.time_until_threshold(&entries, 0.0, t0()).is_none());
        assert!(k.time_until_threshold(&entries, -10.0, t0()).is_none());
    }

    #[test]
    fn test_drip_coffee_scenario() {
        // Single 95mg drip coffee, H=5: halves at T+5h and again at T+10h,
        // so the 30mg crossing lands strictly between them.
        let k = Kinetics::new(5.0);
        let entries = vec![entry(95.0, t0())];

        assert_close(k.level_at(&entries, t0() + Duration::hours(5)), 47.5);
        assert_close(k.level_at(&entries, t0() + Duration::hours(10)), 23.75);

        let when = k.time_until_threshold(&entries, 30.0, t0()).unwrap();
        assert!(when > t0() + Duration::hours(5));
        assert!(when < t0() + Duration::hours(10));
    }

    #[test]
    fn test_max_dose_for_target() {
        let k = Kinetics::new(5.0);
        assert_eq!(k.max_dose_for_target(0.0, 50.0), 0.0);
        assert_eq!(k.max_dose_for_target(-2.0, 50.0), 0.0);
        // One half-life of lead time doubles the allowable dose.
        assert_close(k.max_dose_for_target(5.0, 50.0), 100.0);
    }

    #[test]
    fn test_max_additional_dose_composes() {
        let k = Kinetics::new(5.0);
        let entries = vec![entry(100.0, t0())];
        let target = t0() + Duration::hours(10);

        // Projection at target is 25mg, headroom 25mg, inverted over 10h.
        let max = k.max_additional_dose(&entries, target, 50.0, t0());
        assert_close(max, k.max_dose_for_target(10.0, 25.0));
    }

    #[test]
    fn test_max_additional_dose_guards() {
        let k = Kinetics::new(5.0);
        let entries = vec![entry(300.0, t0())];

        // Target already passed
        assert_eq!(
            k.max_additional_dose(&entries, t0() - Duration::hours(1), 50.0, t0()),
            0.0
        );
        // No headroom: 300mg won't be near 50mg an hour from now
        assert_eq!(
            k.max_additional_dose(&entries, t0() + Duration::hours(1), 50.0, t0()),
            0.0
        );
    }

    #[test]
    fn test_sample_curve_spacing() {
        let k = Kinetics::new(5.0);
        let entries = vec![entry(100.0, t0())];
        let start = t0();
        let end = t0() + Duration::hours(1);

        let points: Vec<_> = k.sample_curve(&entries, start, end, 15).collect();
        assert_eq!(points.len(), 5); // 0, 15, 30, 45, 60 minutes

        assert_eq!(points[0].time, start);
        assert_eq!(points.last().unwrap().time, end);
        for pair in points.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, Duration::minutes(15));
        }
    }

    #[test]
    fn test_sample_curve_last_not_past_end() {
        let k = Kinetics::default();
        let entries = vec![entry(100.0, t0())];
        // 50-minute window with a 15-minute step: last sample at +45m.
        let end = t0() + Duration::minutes(50);

        let points: Vec<_> = k.sample_curve(&entries, t0(), end, 15).collect();
        assert_eq!(points.len(), 4);
        assert!(points.last().unwrap().time <= end);
    }

    #[test]
    fn test_sample_curve_empty_iff_no_entries() {
        let k = Kinetics::default();
        let points: Vec<_> = k.sample_curve(&[], t0(), t0() + Duration::hours(4), 15).collect();
        assert!(points.is_empty());
    }

    #[test]
    fn test_sample_curve_restartable() {
        let k = Kinetics::default();
        let entries = vec![entry(100.0, t0())];
        let samples = k.sample_curve(&entries, t0(), t0() + Duration::hours(2), 30);

        let first: Vec<_> = samples.clone().collect();
        let second: Vec<_> = samples.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_decay_curve() {
        let k = Kinetics::new(5.0);
        let points: Vec<_> = k.decay_curve(100.0, 10.0, 60).collect();

        assert_eq!(points.len(), 11);
        assert_close(points[0].remaining_mg, 100.0);
        assert_close(points[0].percent_remaining, 100.0);
        assert_close(points[5].remaining_mg, 50.0);
        assert_close(points[10].percent_remaining, 25.0);
    }

    #[test]
    fn test_decay_curve_never_empty() {
        let k = Kinetics::default();
        let points: Vec<_> = k.decay_curve(80.0, 0.0, 15).collect();
        assert_eq!(points.len(), 1);
        assert_close(points[0].remaining_mg, 80.0);
    }

    #[test]
    fn test_hours_between() {
        assert_close(hours_between(t0(), t0() + Duration::minutes(90)), 1.5);
        assert_close(hours_between(t0(), t0() - Duration::hours(2)), -2.0);
    }
}
