//! # Bonk Detection
//!
//! A "bonk" (hitting the wall) is a metabolic event where glycogen stores
//! are depleted and performance collapses. Its signature:
//!
//! - pace drops suddenly by more than 20% (not gradually, like cardiac drift)
//! - HR spikes or stays elevated despite the slower pace
//! - the drop is not explained by terrain (a pace drop on a 5%+ grade is a
//!   hill, not a bonk)
//! - the runner may or may not recover
//!
//! Two entry points share the core algorithm: [`detect_bonk`] scans the
//! whole timeseries; [`detect_bonk_per_segment`] first restricts it to
//! samples inside *active* lap segments, so that the planned rest intervals
//! of an interval workout (a sudden pace collapse, often with lingering
//! elevated HR from cardiac lag) are invisible to the detector.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::segments::LapSegment;
use crate::stats::{mean, median, round_to};
use crate::Sample;

/// Candidate instants are sampled every 15 seconds to avoid redundant
/// window computations.
const CANDIDATE_STEP_SECONDS: u32 = 15;

/// Width of the HR comparison windows immediately around a candidate.
const HR_WINDOW_SECONDS: u32 = 60;

/// Half-width of the forward terrain assessment window; the full lookahead
/// is twice this.
const GRADE_WINDOW_SECONDS: u32 = 60;

/// A pace window needs at least this many valid samples to be scored.
const MIN_WINDOW_SAMPLES: usize = 3;

/// Tunables for bonk detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonkConfig {
    /// Minimum relative pace drop to qualify as significant
    pub pace_drop_threshold: f64,
    /// Minimum HR rise (bpm) accompanying the drop
    pub hr_spike_threshold_bpm: f64,
    /// Width of the pre-onset pace baseline window
    pub pre_window_seconds: u32,
    /// Width of the post-onset pace assessment window
    pub post_window_seconds: u32,
    /// How long after the post window to probe for recovery
    pub recovery_window_seconds: u32,
    /// Pace must return within this fraction of the baseline to count as
    /// recovered
    pub recovery_threshold: f64,
    /// Pace drops on grades at or above this magnitude are hills, not bonks
    pub hill_grade_threshold: f64,
    /// Ignore the start of the run (warmup noise)
    pub min_elapsed_seconds: u32,
    /// Candidates this close together are one event
    pub merge_window_seconds: u32,
}

impl Default for BonkConfig {
    fn default() -> Self {
        Self {
            pace_drop_threshold: 0.20,    // 20% pace drop = significant
            hr_spike_threshold_bpm: 8.0,  // 8 bpm rise accompanying the drop
            pre_window_seconds: 180,      // 3 min pre-bonk baseline
            post_window_seconds: 180,     // 3 min post-onset assessment
            recovery_window_seconds: 480, // 8 min to assess recovery
            recovery_threshold: 0.15,     // within 15% of baseline = recovered
            hill_grade_threshold: 0.05,   // ignore drops on ≥5% grades
            min_elapsed_seconds: 600,     // ignore the first 10 minutes
            merge_window_seconds: 120,    // merge candidates within 2 minutes
        }
    }
}

/// A detected performance collapse event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonkEvent {
    /// When the collapse starts
    pub elapsed_seconds_onset: u32,
    /// Median pace in the baseline window before onset (s/km)
    pub pre_bonk_pace_s_per_km: f64,
    /// Median pace in the assessment window after onset (s/km)
    pub bonk_pace_s_per_km: f64,
    /// Relative drop: (bonk_pace − pre_pace) / pre_pace
    pub pace_drop_pct: f64,
    /// Mean HR just before onset
    pub pre_bonk_hr: f64,
    /// Mean HR just after onset
    pub peak_hr: f64,
    /// Whether pace returned to within the recovery threshold of baseline
    pub recovered: bool,
    /// When recovery was confirmed; absent if never recovered or not yet
    /// assessable
    pub elapsed_seconds_end: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    t: u32,
    pre_pace: f64,
    post_pace: f64,
    pace_drop_pct: f64,
    pre_hr: f64,
    peak_hr: f64,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Before,
    After,
}

/// Median pace in a window before or after `elapsed`, excluding absent and
/// non-positive paces. `None` with fewer than 3 valid samples.
fn median_pace(samples: &[Sample], elapsed: u32, window_seconds: u32, side: Side) -> Option<f64> {
    let (lo, hi) = match side {
        Side::Before => (elapsed.saturating_sub(window_seconds), elapsed),
        Side::After => (elapsed, elapsed + window_seconds),
    };
    let paces: Vec<f64> = samples
        .iter()
        .filter(|s| s.elapsed_seconds >= lo && s.elapsed_seconds < hi)
        .filter_map(|s| s.pace_s_per_km)
        .filter(|&p| p > 0.0)
        .collect();
    if paces.len() < MIN_WINDOW_SAMPLES {
        return None;
    }
    Some(median(&paces))
}

/// Mean HR in a window before or after `elapsed`. `None` if the window
/// carries no HR samples.
fn mean_hr(samples: &[Sample], elapsed: u32, window_seconds: u32, side: Side) -> Option<f64> {
    let (lo, hi) = match side {
        Side::Before => (elapsed.saturating_sub(window_seconds), elapsed),
        Side::After => (elapsed, elapsed + window_seconds),
    };
    let hrs: Vec<f64> = samples
        .iter()
        .filter(|s| s.elapsed_seconds >= lo && s.elapsed_seconds < hi)
        .filter_map(|s| s.heart_rate)
        .map(f64::from)
        .collect();
    if hrs.is_empty() {
        return None;
    }
    Some(mean(&hrs))
}

/// Terrain grade after `elapsed`, as a decimal (0.10 = 10% uphill).
///
/// Looks forward over `[elapsed, elapsed + 2·GRADE_WINDOW_SECONDS]`: the
/// pace has already dropped, so the question is whether upcoming terrain
/// explains it. 0.0 when elevation data is insufficient.
fn grade_after(samples: &[Sample], elapsed: u32) -> f64 {
    let hi = elapsed + 2 * GRADE_WINDOW_SECONDS;
    let mut pairs = samples
        .iter()
        .filter(|s| s.elapsed_seconds >= elapsed && s.elapsed_seconds <= hi)
        .filter_map(|s| match (s.elevation_meters, s.distance_meters) {
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
    (last_elev - first_elev) / dist_change
}

/// Detect bonk events across a whole timeseries.
///
/// A candidate is confirmed when the pace drop, HR spike and flat-terrain
/// criteria all hold; candidates within the merge window collapse into one
/// event, keeping the largest pace drop as the representative. An empty
/// timeseries or no surviving candidate yields an empty vector, not an
/// error.
pub fn detect_bonk(samples: &[Sample], config: &BonkConfig) -> Vec<BonkEvent> {
    if samples.is_empty() {
        return Vec::new();
    }

    // Candidate instants: sample timestamps past the warmup cutoff that land
    // on the 15-second grid.
    let mut candidate_times: Vec<u32> = samples
        .iter()
        .map(|s| s.elapsed_seconds)
        .filter(|&t| t >= config.min_elapsed_seconds && t % CANDIDATE_STEP_SECONDS == 0)
        .collect();
    candidate_times.dedup();

    let mut raw: Vec<Candidate> = Vec::new();
    for t in candidate_times {
        let Some(pre_pace) = median_pace(samples, t, config.pre_window_seconds, Side::Before)
        else {
            continue;
        };
        let Some(post_pace) = median_pace(samples, t, config.post_window_seconds, Side::After)
        else {
            continue;
        };

        let pace_drop = (post_pace - pre_pace) / pre_pace;
        if pace_drop < config.pace_drop_threshold {
            continue;
        }

        let Some(pre_hr) = mean_hr(samples, t, HR_WINDOW_SECONDS, Side::Before) else {
            continue;
        };
        let Some(post_hr) = mean_hr(samples, t, HR_WINDOW_SECONDS, Side::After) else {
            continue;
        };
        if post_hr - pre_hr < config.hr_spike_threshold_bpm {
            continue;
        }

        // Hills cause pace drops too; don't call those bonks.
        if grade_after(samples, t).abs() >= config.hill_grade_threshold {
            continue;
        }

        raw.push(Candidate {
            t,
            pre_pace,
            post_pace,
            pace_drop_pct: pace_drop,
            pre_hr,
            peak_hr: post_hr,
        });
    }

    if raw.is_empty() {
        return Vec::new();
    }
    debug!("bonk: {} raw candidates", raw.len());

    // Fold time-ordered candidates into clusters: gaps within the merge
    // window extend the current cluster, keeping the largest drop as its
    // representative.
    let merged = raw.into_iter().fold(Vec::<Candidate>::new(), |mut clusters, cand| {
        match clusters.last_mut() {
            Some(current) if cand.t - current.t <= config.merge_window_seconds => {
                if cand.pace_drop_pct > current.pace_drop_pct {
                    *current = cand;
                }
            }
            _ => clusters.push(cand),
        }
        clusters
    });
    debug!("bonk: {} merged events", merged.len());

    merged
        .into_iter()
        .map(|c| {
            let recovery_start =
                c.t + config.post_window_seconds + config.recovery_window_seconds;
            let recovery_pace =
                median_pace(samples, recovery_start, config.pre_window_seconds, Side::After);

            let recovered = recovery_pace
                .is_some_and(|p| p <= c.pre_pace * (1.0 + config.recovery_threshold));

            BonkEvent {
                elapsed_seconds_onset: c.t,
                pre_bonk_pace_s_per_km: c.pre_pace,
                bonk_pace_s_per_km: c.post_pace,
                pace_drop_pct: round_to(c.pace_drop_pct, 3),
                pre_bonk_hr: round_to(c.pre_hr, 1),
                peak_hr: round_to(c.peak_hr, 1),
                recovered,
                elapsed_seconds_end: recovered.then_some(recovery_start),
            }
        })
        .collect()
}

/// Segment-aware bonk detection.
///
/// Restricts the timeseries to samples inside *active* lap segments (run,
/// warmup, cooldown; see [`LapSegment::is_active`]) before running
/// [`detect_bonk`]. Rest and walk laps in an interval workout otherwise
/// look identical to a genuine collapse: a sudden pace drop, sometimes with
/// elevated HR from cardiac lag.
pub fn detect_bonk_per_segment(
    samples: &[Sample],
    lap_segments: &[LapSegment],
    config: &BonkConfig,
) -> Vec<BonkEvent> {
    let active_windows: Vec<(u32, u32)> = lap_segments
        .iter()
        .filter(|seg| seg.is_active())
        .map(|seg| (seg.start_elapsed_s, seg.end_elapsed_s))
        .collect();

    let filtered: Vec<Sample> = samples
        .iter()
        .filter(|s| {
            active_windows
                .iter()
                .any(|&(start, end)| s.elapsed_seconds >= start && s.elapsed_seconds < end)
        })
        .copied()
        .collect();

    detect_bonk(&filtered, config)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::{build_lap_segments, LapSummary, SplitType};

    /// Constant-pace, constant-HR stretch of samples, one per 5 s over
    /// `[start_s, end_s)`, with cumulative distance continuing from
    /// `start_dist` and flat elevation.
    fn make_stretch(start_s: u32, end_s: u32, pace: f64, hr: u16, start_dist: f64) -> Vec<Sample> {
        let speed = 1000.0 / pace;
        (start_s..end_s)
            .step_by(5)
            .map(|t| Sample {
                elapsed_seconds: t,
                heart_rate: Some(hr),
                pace_s_per_km: Some(pace),
                speed_ms: Some(speed),
                elevation_meters: Some(100.0),
                distance_meters: Some(start_dist + f64::from(t - start_s) * speed),
                ..Sample::default()
            })
            .collect()
    }

    fn end_distance(stretch: &[Sample]) -> f64 {
        stretch.last().and_then(|s| s.distance_meters).unwrap_or(0.0)
    }

    /// 25 min steady at 450 s/km / HR 145, then a collapse to 720 s/km /
    /// HR 168 lasting `collapse_s`, then an optional tail.
    fn make_collapse_run(collapse_s: u32, tail: Option<(u32, f64, u16)>) -> Vec<Sample> {
        let mut samples = make_stretch(0, 1500, 450.0, 145, 0.0);
        let d1 = end_distance(&samples);
        samples.extend(make_stretch(1500, 1500 + collapse_s, 720.0, 168, d1));
        if let Some((tail_s, tail_pace, tail_hr)) = tail {
            let d2 = end_distance(&samples);
            let tail_start = 1500 + collapse_s;
            samples.extend(make_stretch(tail_start, tail_start + tail_s, tail_pace, tail_hr, d2));
        }
        samples
    }

    // ── Core detection ───────────────────────────────────────────────────

    #[test]
    fn test_sustained_collapse_yields_one_unrecovered_event() {
        let samples = make_collapse_run(660, None);
        let events = detect_bonk(&samples, &BonkConfig::default());
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert!(e.pace_drop_pct >= 0.20);
        assert!(!e.recovered);
        assert_eq!(e.elapsed_seconds_end, None);
        assert!(e.peak_hr > e.pre_bonk_hr);
        assert!(e.bonk_pace_s_per_km > e.pre_bonk_pace_s_per_km);
    }

    #[test]
    fn test_collapse_with_near_normal_tail_recovers() {
        // 6 min collapse, then 12 min back near baseline pace
        let samples = make_collapse_run(360, Some((720, 460.0, 150)));
        let events = detect_bonk(&samples, &BonkConfig::default());
        assert_eq!(events.len(), 1);
        assert!(events[0].recovered);
        assert!(events[0].elapsed_seconds_end.is_some());
    }

    #[test]
    fn test_steady_run_yields_no_events() {
        let samples = make_stretch(0, 3600, 450.0, 148, 0.0);
        assert!(detect_bonk(&samples, &BonkConfig::default()).is_empty());
    }

    #[test]
    fn test_empty_timeseries_yields_no_events() {
        assert!(detect_bonk(&[], &BonkConfig::default()).is_empty());
    }

    #[test]
    fn test_collapse_before_warmup_cutoff_ignored() {
        // Collapse at 5 min, run ends at 10 min: nothing past the cutoff
        let mut samples = make_stretch(0, 300, 450.0, 145, 0.0);
        let d = end_distance(&samples);
        samples.extend(make_stretch(300, 600, 900.0, 170, d));
        assert!(detect_bonk(&samples, &BonkConfig::default()).is_empty());
    }

    #[test]
    fn test_collapse_on_steep_grade_is_a_hill_not_a_bonk() {
        // Identical collapse, but elevation climbs at 10% from the onset
        let mut samples = make_collapse_run(660, None);
        let onset_dist = 1500.0 * (1000.0 / 450.0);
        for s in &mut samples {
            if let Some(d) = s.distance_meters {
                if d > onset_dist {
                    s.elevation_meters = Some(100.0 + (d - onset_dist) * 0.10);
                }
            }
        }
        assert!(detect_bonk(&samples, &BonkConfig::default()).is_empty());
    }

    #[test]
    fn test_pace_drop_without_hr_spike_not_a_bonk() {
        // Pace collapses but HR drops too: a deliberate ease-off
        let mut samples = make_stretch(0, 1500, 450.0, 145, 0.0);
        let d = end_distance(&samples);
        samples.extend(make_stretch(1500, 2400, 720.0, 130, d));
        assert!(detect_bonk(&samples, &BonkConfig::default()).is_empty());
    }

    #[test]
    fn test_two_separated_collapses_yield_two_events() {
        let mut samples = make_stretch(0, 1200, 450.0, 145, 0.0);
        let d1 = end_distance(&samples);
        samples.extend(make_stretch(1200, 1500, 700.0, 160, d1));
        let d2 = end_distance(&samples);
        samples.extend(make_stretch(1500, 2400, 450.0, 145, d2));
        let d3 = end_distance(&samples);
        samples.extend(make_stretch(2400, 2700, 700.0, 162, d3));
        let d4 = end_distance(&samples);
        samples.extend(make_stretch(2700, 3300, 450.0, 145, d4));

        let events = detect_bonk(&samples, &BonkConfig::default());
        assert_eq!(events.len(), 2);
        assert!(events[0].elapsed_seconds_onset < events[1].elapsed_seconds_onset);
        assert!(events[0].recovered);
        assert!(events[1].recovered);
    }

    #[test]
    fn test_higher_drop_threshold_suppresses_detection() {
        let samples = make_collapse_run(660, None);
        let strict = BonkConfig {
            pace_drop_threshold: 0.80,
            ..BonkConfig::default()
        };
        assert!(detect_bonk(&samples, &strict).is_empty());
    }

    // ── Segment-aware detection ──────────────────────────────────────────

    fn galloway_run_with_cardiac_lag() -> (Vec<Sample>, Vec<LapSummary>) {
        // Long steady run, then a walk break where HR stays elevated
        // (cardiac lag), the motivating false positive.
        let mut samples = make_stretch(0, 1800, 420.0, 148, 0.0);
        let d1 = end_distance(&samples);
        samples.extend(make_stretch(1800, 2100, 900.0, 158, d1));
        let d2 = end_distance(&samples);
        samples.extend(make_stretch(2100, 3000, 420.0, 150, d2));

        let laps = vec![
            LapSummary::new(SplitType::Run, 0, 1800.0, 4286.0),
            LapSummary::new(SplitType::Walk, 1800, 300.0, 333.0),
            LapSummary::new(SplitType::Run, 2100, 900.0, 2143.0),
        ];
        (samples, laps)
    }

    #[test]
    fn test_naive_detector_fires_on_walk_break_with_lagging_hr() {
        let (samples, _) = galloway_run_with_cardiac_lag();
        let events = detect_bonk(&samples, &BonkConfig::default());
        assert!(!events.is_empty());
    }

    #[test]
    fn test_segment_aware_suppresses_walk_break_false_positive() {
        let (samples, laps) = galloway_run_with_cardiac_lag();
        let segments = build_lap_segments(&laps, &samples, 185);
        let events = detect_bonk_per_segment(&samples, &segments, &BonkConfig::default());
        assert!(events.is_empty());
    }

    #[test]
    fn test_real_bonk_still_detected_within_active_segment() {
        // Warmup → long run with a genuine collapse at 35 min → cooldown,
        // no rest intervals anywhere.
        let mut samples = make_stretch(0, 600, 450.0, 130, 0.0);
        let d1 = end_distance(&samples);
        samples.extend(make_stretch(600, 2100, 420.0, 148, d1));
        let d2 = end_distance(&samples);
        samples.extend(make_stretch(2100, 2700, 720.0, 165, d2));
        let d3 = end_distance(&samples);
        samples.extend(make_stretch(2700, 3000, 480.0, 140, d3));

        let laps = vec![
            LapSummary::new(SplitType::Run, 0, 600.0, 1333.0),
            LapSummary::new(SplitType::Run, 600, 2100.0, 6000.0),
            LapSummary::new(SplitType::Run, 2700, 300.0, 625.0),
        ];
        let segments = build_lap_segments(&laps, &samples, 185);
        let events = detect_bonk_per_segment(&samples, &segments, &BonkConfig::default());
        assert!(!events.is_empty());
        assert!(events[0].elapsed_seconds_onset >= 600);
        assert!(events[0].elapsed_seconds_onset < 2700);
    }

    #[test]
    fn test_segment_aware_empty_timeseries() {
        let laps = vec![LapSummary::new(SplitType::Run, 0, 3600.0, 9000.0)];
        let segments = build_lap_segments(&laps, &[], 185);
        assert!(detect_bonk_per_segment(&[], &segments, &BonkConfig::default()).is_empty());
    }

    #[test]
    fn test_segment_aware_empty_segments() {
        let samples = make_stretch(0, 3600, 420.0, 150, 0.0);
        assert!(detect_bonk_per_segment(&samples, &[], &BonkConfig::default()).is_empty());
    }

    #[test]
    fn test_all_walk_segments_leave_nothing_to_analyze() {
        let samples = make_stretch(0, 3600, 900.0, 120, 0.0);
        let laps = vec![
            LapSummary::new(SplitType::Walk, 0, 1800.0, 2000.0),
            LapSummary::new(SplitType::Walk, 1800, 1800.0, 2000.0),
        ];
        let segments = build_lap_segments(&laps, &samples, 185);
        assert!(detect_bonk_per_segment(&samples, &segments, &BonkConfig::default()).is_empty());
    }
}
