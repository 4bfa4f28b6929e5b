//! # Segment Builder
//!
//! Slices an activity timeseries into segments and computes per-segment
//! statistics: average pace, average heart rate, elevation grade,
//! grade-adjusted pace (GAP) and heart-rate-zone distribution.
//!
//! Two segmentations are produced:
//!
//! - **Mile segments** ([`build_mile_segments`]) are geometric: fixed
//!   1609.344 m bins over the cumulative-distance channel. Trailing partial
//!   miles are dropped, never padded.
//! - **Lap segments** ([`build_lap_segments`]) are boundary-driven: the
//!   caller supplies one [`LapSummary`] per device lap (lap-button press or
//!   typed run/walk split), and the builder labels them to reflect the
//!   actual workout structure ("Warmup" / "Run 1" / "Walk 1" / … /
//!   "Cooldown") rather than geographic miles.
//!
//! Lap segments carry an [`LapSegment::is_active`] predicate (run, warmup
//! and cooldown laps); the bonk detector relies on it to keep planned rest
//! intervals out of its baselines.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::pace::grade_adjusted_pace;
use crate::stats::{mean, round_to};
use crate::zones::classify_zone;
use crate::Sample;

/// One mile in meters (standard).
pub const METERS_PER_MILE: f64 = 1609.344;

/// A mile bin counts as complete once its samples cover this fraction of the
/// bin width. Tolerates the last recorded distance landing a few meters
/// short of the exact boundary under discrete sampling.
const MILE_COVERAGE_FRACTION: f64 = 0.95;

/// Slack on the total-distance cutoff when deciding whether a mile band can
/// contain data at all.
const DISTANCE_TOLERANCE_M: f64 = 10.0;

/// Run laps shorter than this at the start/end of an activity are treated as
/// warmup/cooldown jogs. Empirically tuned against one device's lap data;
/// re-validate before trusting it on other sampling rates.
const WARMUP_COOLDOWN_DISTANCE_M: f64 = 1000.0;

// ============================================================================
// Types
// ============================================================================

/// Caller-supplied type tag on a lap descriptor, as recorded by the device
/// or the provider API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitType {
    /// Active running split
    Run,
    /// Walking / recovery split
    Walk,
    /// Explicitly tagged warmup
    Warmup,
    /// Explicitly tagged cooldown
    Cooldown,
    /// Untyped lap-button lap
    Lap,
}

/// Structured-workout step type attached to a lap through the workout
/// definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Warmup,
    Cooldown,
    Interval,
    Recovery,
    Rest,
    /// Transition press between reps (no training content)
    Other,
}

impl StepType {
    /// Parse a workout-service step type key ("warmup", "interval", …).
    /// Unrecognized keys yield `None` rather than a guess.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "warmup" => Some(Self::Warmup),
            "cooldown" => Some(Self::Cooldown),
            "interval" => Some(Self::Interval),
            "recovery" => Some(Self::Recovery),
            "rest" => Some(Self::Rest),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Kind tag on a built lap segment, after labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Run,
    Walk,
    Warmup,
    Cooldown,
    Recovery,
    Other,
}

/// One lap descriptor, supplied by the caller in activity order.
///
/// This is plain value data (typically normalized from a provider's lap
/// DTOs or reloaded from storage), never a live handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapSummary {
    pub split_type: SplitType,
    /// Lap start offset in elapsed seconds from activity start
    pub start_elapsed_seconds: u32,
    pub duration_seconds: f64,
    pub distance_meters: f64,
    pub avg_hr: Option<f64>,
    pub avg_pace_s_per_km: Option<f64>,
    pub total_ascent_meters: Option<f64>,
    /// Step type from the linked structured workout, if any
    pub workout_step_type: Option<StepType>,
    /// Slow bound of the workout step's target pace band (s/km)
    pub target_pace_slow_s_per_km: Option<f64>,
    /// Fast bound of the workout step's target pace band (s/km)
    pub target_pace_fast_s_per_km: Option<f64>,
}

impl LapSummary {
    /// A minimal descriptor with no HR/pace/workout context.
    pub fn new(
        split_type: SplitType,
        start_elapsed_seconds: u32,
        duration_seconds: f64,
        distance_meters: f64,
    ) -> Self {
        Self {
            split_type,
            start_elapsed_seconds,
            duration_seconds,
            distance_meters,
            avg_hr: None,
            avg_pace_s_per_km: None,
            total_ascent_meters: None,
            workout_step_type: None,
            target_pace_slow_s_per_km: None,
            target_pace_fast_s_per_km: None,
        }
    }
}

/// Statistics for one complete mile of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MileSegment {
    /// "Mile 1", "Mile 2", …
    pub label: String,
    pub start_elapsed_s: u32,
    pub end_elapsed_s: u32,
    pub duration_seconds: f64,
    /// Observed distance coverage within the mile bin
    pub distance_meters: f64,
    pub avg_pace_s_per_km: f64,
    pub avg_hr: f64,
    /// Average grade over the mile, percent (positive = uphill)
    pub grade_pct: f64,
    /// Grade-adjusted pace in s/km
    pub gap_s_per_km: f64,
    /// Fraction of HR-bearing samples per zone (index 0 = zone 1); all zero
    /// when the mile carries no HR data
    pub hr_zone_distribution: [f64; 5],
}

/// Statistics for one lap of a structured workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapSegment {
    /// "Warmup", "Run 2", "Walk 1", "Recovery 1", "Cooldown", "Lap 3"
    pub label: String,
    pub kind: SegmentKind,
    pub start_elapsed_s: u32,
    pub end_elapsed_s: u32,
    pub duration_seconds: f64,
    pub distance_meters: f64,
    pub avg_pace_s_per_km: Option<f64>,
    pub avg_hr: Option<f64>,
    /// Fraction of HR-bearing timeseries samples per zone within the lap
    /// window; all zero when no timeseries was supplied
    pub hr_zone_distribution: [f64; 5],
    pub total_ascent_meters: Option<f64>,
    pub workout_step_type: Option<StepType>,
    pub target_pace_slow_s_per_km: Option<f64>,
    pub target_pace_fast_s_per_km: Option<f64>,
}

impl LapSegment {
    /// Whether this lap is eligible as a bonk-detection baseline.
    ///
    /// Run, warmup and cooldown laps are active; walk and recovery laps are
    /// planned rest and must not look like a collapse.
    pub fn is_active(&self) -> bool {
        matches!(
            self.kind,
            SegmentKind::Run | SegmentKind::Warmup | SegmentKind::Cooldown
        )
    }

    /// Whether this lap is a transition press between workout steps
    /// (workout step type "other").
    pub fn is_transitional(&self) -> bool {
        self.workout_step_type == Some(StepType::Other)
    }

    /// Lap distance in miles.
    pub fn distance_miles(&self) -> f64 {
        self.distance_meters / METERS_PER_MILE
    }
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// Fraction of HR-bearing samples in each zone (index 0 = zone 1).
/// All-zero when no sample carries HR.
fn hr_zone_distribution<'a, I>(samples: I, max_hr: u16) -> [f64; 5]
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut counts = [0usize; 5];
    for sample in samples {
        if let Some(hr) = sample.heart_rate {
            counts[usize::from(classify_zone(hr, max_hr)) - 1] += 1;
        }
    }
    let total: usize = counts.iter().sum();
    if total == 0 {
        return [0.0; 5];
    }
    let mut fractions = [0.0; 5];
    for (f, c) in fractions.iter_mut().zip(counts) {
        *f = c as f64 / total as f64;
    }
    fractions
}

/// Average grade over a window as a percentage, estimated from the first and
/// last samples carrying both elevation and distance. 0.0 with fewer than
/// two such samples or a non-positive distance delta.
fn grade_pct_for_window(samples: &[&Sample]) -> f64 {
    let mut pairs = samples.iter().filter_map(|s| match (s.elevation_meters, s.distance_meters) {
        (Some(elev), Some(dist)) => Some((elev, dist)),
        _ => None,
    });

    let Some((first_elev, first_dist)) = pairs.next() else {
        return 0.0;
    };
    let Some((last_elev, last_dist)) = pairs.last() else {
        return 0.0;
    };

    let dist_change = last_dist - first_dist;
    if dist_change <= 0.0 {
        return 0.0;
    }
    ((last_elev - first_elev) / dist_change) * 100.0
}

// ============================================================================
// Mile Segmentation
// ============================================================================

/// Slice a run into complete one-mile segments and compute per-segment
/// statistics.
///
/// Bin *i* collects samples whose cumulative distance falls in
/// `[i·1609.344, (i+1)·1609.344)`. A bin is accepted only when its samples
/// cover at least 95% of the bin width; segmentation stops at the first
/// incomplete bin, so trailing partial miles are dropped.
///
/// Returns an empty vector for an empty timeseries, a timeseries with no
/// distance channel, or a run shorter than one mile; none of these is an
/// error.
pub fn build_mile_segments(samples: &[Sample], max_hr: u16) -> Vec<MileSegment> {
    if samples.is_empty() {
        return Vec::new();
    }

    // Callers should pass chronologically ordered data; re-sort defensively.
    let mut pts: Vec<Sample> = samples.to_vec();
    pts.sort_by_key(|p| p.elapsed_seconds);

    let total_distance = pts
        .iter()
        .filter_map(|p| p.distance_meters)
        .fold(f64::NAN, f64::max);
    if !total_distance.is_finite() || total_distance < METERS_PER_MILE {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut mile_index = 0usize;

    loop {
        let mile_start_m = mile_index as f64 * METERS_PER_MILE;
        let mile_end_m = (mile_index + 1) as f64 * METERS_PER_MILE;
        if mile_start_m >= total_distance + DISTANCE_TOLERANCE_M {
            break;
        }

        let mile_pts: Vec<&Sample> = pts
            .iter()
            .filter(|p| {
                p.distance_meters
                    .is_some_and(|d| d >= mile_start_m && d < mile_end_m)
            })
            .collect();
        if mile_pts.is_empty() {
            break;
        }

        let max_dist_in_bin = mile_pts
            .iter()
            .filter_map(|p| p.distance_meters)
            .fold(f64::NAN, f64::max);
        let coverage = max_dist_in_bin - mile_start_m;
        if coverage < METERS_PER_MILE * MILE_COVERAGE_FRACTION {
            break;
        }

        let start_elapsed = mile_pts[0].elapsed_seconds;
        let end_elapsed = mile_pts[mile_pts.len() - 1].elapsed_seconds;
        let duration = f64::from(end_elapsed - start_elapsed);

        // Average pace from valid per-sample paces, else derived from time
        // over the bin width.
        let paces: Vec<f64> = mile_pts
            .iter()
            .filter_map(|p| p.pace_s_per_km)
            .filter(|&p| p > 0.0)
            .collect();
        let avg_pace = if paces.is_empty() {
            if duration > 0.0 {
                (duration / METERS_PER_MILE) * 1000.0
            } else {
                0.0
            }
        } else {
            mean(&paces)
        };

        let hrs: Vec<f64> = mile_pts
            .iter()
            .filter_map(|p| p.heart_rate)
            .map(f64::from)
            .collect();
        let avg_hr = mean(&hrs);

        let grade_pct = grade_pct_for_window(&mile_pts);
        let gap = if avg_pace > 0.0 {
            grade_adjusted_pace(avg_pace, grade_pct / 100.0)
        } else {
            avg_pace
        };

        segments.push(MileSegment {
            label: format!("Mile {}", mile_index + 1),
            start_elapsed_s: start_elapsed,
            end_elapsed_s: end_elapsed,
            duration_seconds: duration,
            distance_meters: coverage,
            avg_pace_s_per_km: round_to(avg_pace, 2),
            avg_hr: round_to(avg_hr, 1),
            grade_pct: round_to(grade_pct, 2),
            gap_s_per_km: round_to(gap, 2),
            hr_zone_distribution: hr_zone_distribution(mile_pts.iter().copied(), max_hr),
        });

        mile_index += 1;
    }

    debug!("built {} mile segments", segments.len());
    segments
}

// ============================================================================
// Lap Segmentation
// ============================================================================

/// Build labeled lap segments from caller-supplied lap descriptors.
///
/// Labeling precedence (first match wins):
///
/// 1. an explicit warmup/cooldown split type is honored outright;
/// 2. a first run-type lap under 1000 m becomes "Warmup";
/// 3. a last run- or walk-type lap under 1000 m (and distinct from any
///    warmup) becomes "Cooldown";
/// 4. walk laps become "Walk N"; run laps whose workout step is tagged
///    recovery become "Recovery N";
/// 5. remaining run laps become "Run N"; untyped laps become "Lap N".
///
/// Per-lap zone distributions are computed from whichever `samples` fall in
/// the lap's `[start, end)` window; with an empty timeseries they are all
/// zero. An empty descriptor list yields an empty vector.
pub fn build_lap_segments(
    laps: &[LapSummary],
    samples: &[Sample],
    max_hr: u16,
) -> Vec<LapSegment> {
    if laps.is_empty() {
        return Vec::new();
    }

    // Positional heuristics, resolved up front so the counters below never
    // see the warmup/cooldown laps.
    let warmup_idx = (laps[0].split_type == SplitType::Run
        && laps[0].distance_meters < WARMUP_COOLDOWN_DISTANCE_M)
        .then_some(0);
    let last = laps.len() - 1;
    let cooldown_idx = (Some(last) != warmup_idx
        && matches!(laps[last].split_type, SplitType::Run | SplitType::Walk)
        && laps[last].distance_meters < WARMUP_COOLDOWN_DISTANCE_M)
        .then_some(last);

    let mut run_count = 0usize;
    let mut walk_count = 0usize;
    let mut recovery_count = 0usize;
    let mut lap_count = 0usize;

    let segments: Vec<LapSegment> = laps
        .iter()
        .enumerate()
        .map(|(i, lap)| {
            let (label, kind) = match lap.split_type {
                SplitType::Warmup => ("Warmup".to_string(), SegmentKind::Warmup),
                SplitType::Cooldown => ("Cooldown".to_string(), SegmentKind::Cooldown),
                _ if Some(i) == warmup_idx => ("Warmup".to_string(), SegmentKind::Warmup),
                _ if Some(i) == cooldown_idx => ("Cooldown".to_string(), SegmentKind::Cooldown),
                SplitType::Walk => {
                    walk_count += 1;
                    (format!("Walk {walk_count}"), SegmentKind::Walk)
                }
                SplitType::Run if lap.workout_step_type == Some(StepType::Recovery) => {
                    recovery_count += 1;
                    (format!("Recovery {recovery_count}"), SegmentKind::Recovery)
                }
                SplitType::Run => {
                    run_count += 1;
                    (format!("Run {run_count}"), SegmentKind::Run)
                }
                SplitType::Lap => {
                    lap_count += 1;
                    (format!("Lap {lap_count}"), SegmentKind::Other)
                }
            };

            let start = lap.start_elapsed_seconds;
            let end = start + lap.duration_seconds.round() as u32;
            let in_window = samples
                .iter()
                .filter(|s| s.elapsed_seconds >= start && s.elapsed_seconds < end);

            LapSegment {
                label,
                kind,
                start_elapsed_s: start,
                end_elapsed_s: end,
                duration_seconds: lap.duration_seconds,
                distance_meters: lap.distance_meters,
                avg_pace_s_per_km: lap.avg_pace_s_per_km,
                avg_hr: lap.avg_hr,
                hr_zone_distribution: hr_zone_distribution(in_window, max_hr),
                total_ascent_meters: lap.total_ascent_meters,
                workout_step_type: lap.workout_step_type,
                target_pace_slow_s_per_km: lap.target_pace_slow_s_per_km,
                target_pace_fast_s_per_km: lap.target_pace_fast_s_per_km,
            }
        })
        .collect();

    debug!(
        "built {} lap segments ({} active)",
        segments.len(),
        segments.iter().filter(|s| s.is_active()).count()
    );
    segments
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat steady-state run at constant pace and HR, one sample per 5 s.
    fn make_flat_run(distance_m: f64, pace_s_per_km: f64, hr: u16) -> Vec<Sample> {
        let speed = 1000.0 / pace_s_per_km;
        let total_s = (distance_m / speed) as u32;
        (0..total_s)
            .step_by(5)
            .map(|t| Sample {
                elapsed_seconds: t,
                heart_rate: Some(hr),
                pace_s_per_km: Some(pace_s_per_km),
                speed_ms: Some(speed),
                elevation_meters: Some(100.0),
                cadence_spm: Some(162),
                distance_meters: Some(speed * f64::from(t)),
                temperature_c: Some(15.0),
                ..Sample::default()
            })
            .collect()
    }

    fn make_lap(
        split_type: SplitType,
        start: u32,
        duration: f64,
        distance: f64,
    ) -> LapSummary {
        LapSummary {
            avg_hr: Some(140.0),
            avg_pace_s_per_km: Some(360.0),
            ..LapSummary::new(split_type, start, duration, distance)
        }
    }

    // ── Mile segmentation ────────────────────────────────────────────────

    #[test]
    fn test_five_mile_run_yields_five_segments() {
        let samples = make_flat_run(5.0 * METERS_PER_MILE, 450.0, 148);
        let segments = build_mile_segments(&samples, 185);
        assert_eq!(segments.len(), 5);
    }

    #[test]
    fn test_mile_labels_are_sequential() {
        let samples = make_flat_run(3.0 * METERS_PER_MILE, 450.0, 148);
        let labels: Vec<String> = build_mile_segments(&samples, 185)
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["Mile 1", "Mile 2", "Mile 3"]);
    }

    #[test]
    fn test_flat_run_segment_statistics() {
        let samples = make_flat_run(5.0 * METERS_PER_MILE, 450.0, 148);
        for seg in build_mile_segments(&samples, 185) {
            assert!((seg.avg_pace_s_per_km - 450.0).abs() < 450.0 * 0.05);
            assert!((seg.avg_hr - 148.0).abs() < 2.0);
            assert!(seg.grade_pct.abs() < 1.0);
            let zone_sum: f64 = seg.hr_zone_distribution.iter().sum();
            assert!((zone_sum - 1.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_flat_run_gap_equals_pace() {
        let samples = make_flat_run(2.0 * METERS_PER_MILE, 450.0, 148);
        for seg in build_mile_segments(&samples, 185) {
            assert!((seg.gap_s_per_km - seg.avg_pace_s_per_km).abs() < 1.0);
        }
    }

    #[test]
    fn test_under_one_mile_yields_no_segments() {
        let samples = make_flat_run(1200.0, 450.0, 148);
        assert!(build_mile_segments(&samples, 185).is_empty());
    }

    #[test]
    fn test_empty_timeseries_yields_no_segments() {
        assert!(build_mile_segments(&[], 185).is_empty());
    }

    #[test]
    fn test_no_distance_channel_yields_no_segments() {
        let samples: Vec<Sample> = (0u32..600)
            .step_by(5)
            .map(|t| Sample {
                elapsed_seconds: t,
                heart_rate: Some(150),
                pace_s_per_km: Some(450.0),
                ..Sample::default()
            })
            .collect();
        assert!(build_mile_segments(&samples, 185).is_empty());
    }

    #[test]
    fn test_partial_trailing_mile_dropped() {
        // 2.5 miles → exactly 2 complete segments
        let samples = make_flat_run(2.5 * METERS_PER_MILE, 450.0, 148);
        assert_eq!(build_mile_segments(&samples, 185).len(), 2);
    }

    #[test]
    fn test_uphill_mile_grade_and_gap() {
        // Constant 5% climb: elevation tracks distance
        let pace = 500.0;
        let speed = 1000.0 / pace;
        let samples: Vec<Sample> = (0u32..1000)
            .map(|i| {
                let t = i * 5;
                let dist = speed * f64::from(t);
                Sample {
                    elapsed_seconds: t,
                    heart_rate: Some(160),
                    pace_s_per_km: Some(pace),
                    elevation_meters: Some(100.0 + dist * 0.05),
                    distance_meters: Some(dist),
                    ..Sample::default()
                }
            })
            .collect();
        let segments = build_mile_segments(&samples, 185);
        assert!(!segments.is_empty());
        let seg = &segments[0];
        assert!((seg.grade_pct - 5.0).abs() < 0.5);
        // Working uphill: flat-equivalent pace is faster than actual
        assert!(seg.gap_s_per_km < seg.avg_pace_s_per_km);
    }

    #[test]
    fn test_mile_without_hr_has_zero_histogram() {
        let mut samples = make_flat_run(1.2 * METERS_PER_MILE, 450.0, 148);
        for s in &mut samples {
            s.heart_rate = None;
        }
        let segments = build_mile_segments(&samples, 185);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].hr_zone_distribution, [0.0; 5]);
    }

    // ── Lap segmentation: labeling ───────────────────────────────────────

    #[test]
    fn test_typical_workout_labels() {
        let laps = vec![
            make_lap(SplitType::Run, 0, 300.0, 800.0),
            make_lap(SplitType::Run, 300, 1800.0, 4828.0),
            make_lap(SplitType::Walk, 2100, 300.0, 300.0),
            make_lap(SplitType::Run, 2400, 300.0, 800.0),
        ];
        let labels: Vec<String> = build_lap_segments(&laps, &[], 185)
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["Warmup", "Run 1", "Walk 1", "Cooldown"]);
    }

    #[test]
    fn test_run_and_walk_counters_sequential() {
        let laps = vec![
            make_lap(SplitType::Run, 0, 300.0, 800.0),
            make_lap(SplitType::Run, 300, 600.0, 1600.0),
            make_lap(SplitType::Walk, 900, 120.0, 100.0),
            make_lap(SplitType::Run, 1020, 600.0, 1600.0),
            make_lap(SplitType::Walk, 1620, 120.0, 100.0),
            make_lap(SplitType::Run, 1740, 600.0, 1600.0),
            make_lap(SplitType::Run, 2340, 300.0, 800.0),
        ];
        let labels: Vec<String> = build_lap_segments(&laps, &[], 185)
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(
            labels,
            vec!["Warmup", "Run 1", "Walk 1", "Run 2", "Walk 2", "Run 3", "Cooldown"]
        );
    }

    #[test]
    fn test_no_heuristic_labels_when_laps_are_long() {
        let laps = vec![
            make_lap(SplitType::Run, 0, 600.0, 1600.0),
            make_lap(SplitType::Walk, 600, 120.0, 100.0),
            make_lap(SplitType::Run, 720, 600.0, 1600.0),
        ];
        let labels: Vec<String> = build_lap_segments(&laps, &[], 185)
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["Run 1", "Walk 1", "Run 2"]);
    }

    #[test]
    fn test_explicit_warmup_cooldown_tags_honored() {
        // Explicit tags win even over the distance heuristic (both laps here
        // are longer than the 1000 m cutoff).
        let laps = vec![
            make_lap(SplitType::Warmup, 0, 600.0, 1500.0),
            make_lap(SplitType::Run, 600, 1200.0, 3200.0),
            make_lap(SplitType::Cooldown, 1800, 600.0, 1400.0),
        ];
        let segs = build_lap_segments(&laps, &[], 185);
        assert_eq!(segs[0].label, "Warmup");
        assert_eq!(segs[0].kind, SegmentKind::Warmup);
        assert_eq!(segs[2].label, "Cooldown");
        assert_eq!(segs[2].kind, SegmentKind::Cooldown);
    }

    #[test]
    fn test_last_short_walk_becomes_cooldown() {
        let laps = vec![
            make_lap(SplitType::Run, 0, 3600.0, 9000.0),
            make_lap(SplitType::Walk, 3600, 300.0, 400.0),
        ];
        let segs = build_lap_segments(&laps, &[], 185);
        assert_eq!(segs[1].label, "Cooldown");
    }

    #[test]
    fn test_single_long_run_labeled_run_1() {
        let laps = vec![make_lap(SplitType::Run, 0, 1800.0, 5000.0)];
        let segs = build_lap_segments(&laps, &[], 185);
        assert_eq!(segs[0].label, "Run 1");
        assert_eq!(segs[0].kind, SegmentKind::Run);
    }

    #[test]
    fn test_single_short_run_is_warmup_not_cooldown() {
        let laps = vec![make_lap(SplitType::Run, 0, 300.0, 800.0)];
        let segs = build_lap_segments(&laps, &[], 185);
        assert_eq!(segs[0].label, "Warmup");
    }

    #[test]
    fn test_recovery_step_laps_counted_separately() {
        let mut rep = make_lap(SplitType::Run, 0, 300.0, 1200.0);
        rep.workout_step_type = Some(StepType::Interval);
        let mut rec1 = make_lap(SplitType::Run, 300, 180.0, 1200.0);
        rec1.workout_step_type = Some(StepType::Recovery);
        let mut rep2 = make_lap(SplitType::Run, 480, 300.0, 1200.0);
        rep2.workout_step_type = Some(StepType::Interval);
        let mut rec2 = make_lap(SplitType::Run, 780, 180.0, 1200.0);
        rec2.workout_step_type = Some(StepType::Recovery);

        let labels: Vec<String> = build_lap_segments(&[rep, rec1, rep2, rec2], &[], 185)
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["Run 1", "Recovery 1", "Run 2", "Recovery 2"]);
    }

    #[test]
    fn test_untyped_laps_labeled_lap_n() {
        let laps = vec![
            make_lap(SplitType::Lap, 0, 600.0, 1600.0),
            make_lap(SplitType::Lap, 600, 600.0, 1600.0),
        ];
        let segs = build_lap_segments(&laps, &[], 185);
        assert_eq!(segs[0].label, "Lap 1");
        assert_eq!(segs[1].label, "Lap 2");
        assert_eq!(segs[0].kind, SegmentKind::Other);
        assert!(!segs[0].is_active());
    }

    // ── Lap segmentation: fields and predicates ──────────────────────────

    #[test]
    fn test_lap_fields_passed_through() {
        let mut lap = make_lap(SplitType::Run, 300, 1800.0, 4828.0);
        lap.avg_hr = Some(155.0);
        lap.avg_pace_s_per_km = Some(373.0);
        lap.total_ascent_meters = Some(42.0);
        let segs = build_lap_segments(&[lap], &[], 185);
        let seg = &segs[0];
        assert_eq!(seg.start_elapsed_s, 300);
        assert_eq!(seg.end_elapsed_s, 2100);
        assert_eq!(seg.duration_seconds, 1800.0);
        assert_eq!(seg.distance_meters, 4828.0);
        assert_eq!(seg.avg_hr, Some(155.0));
        assert_eq!(seg.avg_pace_s_per_km, Some(373.0));
        assert_eq!(seg.total_ascent_meters, Some(42.0));
    }

    #[test]
    fn test_target_pace_band_passed_through() {
        let mut lap = make_lap(SplitType::Run, 0, 227.0, 1200.0);
        lap.target_pace_slow_s_per_km = Some(295.1);
        lap.target_pace_fast_s_per_km = Some(282.6);
        let segs = build_lap_segments(&[lap], &[], 185);
        assert_eq!(segs[0].target_pace_slow_s_per_km, Some(295.1));
        assert_eq!(segs[0].target_pace_fast_s_per_km, Some(282.6));
    }

    #[test]
    fn test_target_pace_defaults_absent() {
        let segs = build_lap_segments(&[make_lap(SplitType::Run, 0, 227.0, 1200.0)], &[], 185);
        assert_eq!(segs[0].target_pace_slow_s_per_km, None);
        assert_eq!(segs[0].target_pace_fast_s_per_km, None);
    }

    #[test]
    fn test_is_active_per_kind() {
        let laps = vec![
            make_lap(SplitType::Warmup, 0, 300.0, 800.0),
            make_lap(SplitType::Run, 300, 600.0, 1600.0),
            make_lap(SplitType::Walk, 900, 120.0, 1100.0),
            make_lap(SplitType::Cooldown, 1020, 300.0, 800.0),
        ];
        let segs = build_lap_segments(&laps, &[], 185);
        assert!(segs[0].is_active());
        assert!(segs[1].is_active());
        assert!(!segs[2].is_active());
        assert!(segs[3].is_active());
    }

    #[test]
    fn test_is_transitional_only_for_other_step_type() {
        let mut transitional = make_lap(SplitType::Run, 0, 30.0, 1050.0);
        transitional.workout_step_type = Some(StepType::Other);
        let mut interval = make_lap(SplitType::Run, 30, 300.0, 1200.0);
        interval.workout_step_type = Some(StepType::Interval);
        let plain = make_lap(SplitType::Run, 330, 300.0, 1200.0);

        let segs = build_lap_segments(&[transitional, interval, plain], &[], 185);
        assert!(segs[0].is_transitional());
        assert!(!segs[1].is_transitional());
        assert!(!segs[2].is_transitional());
    }

    #[test]
    fn test_distance_miles() {
        let segs = build_lap_segments(&[make_lap(SplitType::Run, 0, 300.0, 1200.0)], &[], 185);
        assert!((segs[0].distance_miles() - 1200.0 / METERS_PER_MILE).abs() < 1e-9);
    }

    #[test]
    fn test_empty_lap_list_yields_empty() {
        assert!(build_lap_segments(&[], &[], 185).is_empty());
    }

    // ── Lap segmentation: zone histograms ────────────────────────────────

    #[test]
    fn test_lap_zone_histogram_from_timeseries() {
        let laps = vec![make_lap(SplitType::Run, 0, 600.0, 1600.0)];
        let samples: Vec<Sample> = (0u32..600)
            .step_by(5)
            .map(|t| Sample {
                elapsed_seconds: t,
                heart_rate: Some(120), // 65% of 185 → zone 2
                ..Sample::default()
            })
            .collect();
        let segs = build_lap_segments(&laps, &samples, 185);
        assert_eq!(segs[0].hr_zone_distribution, [0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_lap_zone_histogram_respects_window() {
        let laps = vec![
            make_lap(SplitType::Run, 0, 300.0, 1600.0),
            make_lap(SplitType::Run, 300, 300.0, 1600.0),
        ];
        // Zone 2 during the first lap, zone 4 during the second
        let samples: Vec<Sample> = (0u32..600)
            .step_by(5)
            .map(|t| Sample {
                elapsed_seconds: t,
                heart_rate: Some(if t < 300 { 120 } else { 155 }),
                ..Sample::default()
            })
            .collect();
        let segs = build_lap_segments(&laps, &samples, 185);
        assert_eq!(segs[0].hr_zone_distribution, [0.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(segs[1].hr_zone_distribution, [0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_lap_zone_histogram_zero_without_timeseries() {
        let laps = vec![make_lap(SplitType::Run, 0, 600.0, 1600.0)];
        let segs = build_lap_segments(&laps, &[], 185);
        assert_eq!(segs[0].hr_zone_distribution, [0.0; 5]);
    }

    // ── Serialization ────────────────────────────────────────────────────

    #[test]
    fn test_lap_segment_serializes_round_trip() {
        let segs = build_lap_segments(&[make_lap(SplitType::Run, 0, 600.0, 1600.0)], &[], 185);
        let json = serde_json::to_string(&segs[0]).unwrap();
        let back: LapSegment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, segs[0]);
    }
}
