//! # Cardiac Drift Detection
//!
//! Cardiac drift is a progressive heart-rate rise during a steady-state run
//! while pace stays constant, a sign of cardiovascular fatigue, dehydration
//! or heat accumulation.
//!
//! ## Algorithm
//! 1. Discard the warmup period and any sample missing HR or a positive pace
//! 2. Partition the remainder into consecutive non-overlapping fixed-length
//!    windows (a window needs at least 3 samples to be scored)
//! 3. Keep only "steady" windows whose pace coefficient of variation is
//!    below the stability threshold; unsteady windows (e.g. inside
//!    intervals) are excluded entirely, not averaged in
//! 4. Fit a least-squares line of window ordinal → mean HR across the steady
//!    windows and project the total rise over their span
//! 5. Report drift only if the projected rise meets the threshold
//!
//! Projecting the fitted trend, rather than taking raw max-minus-min HR,
//! keeps within-window HR noise from triggering false positives.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::stats::{coefficient_of_variation, linear_slope, mean, round_to};
use crate::Sample;

/// A scored window needs at least this many usable samples.
const MIN_WINDOW_SAMPLES: usize = 3;

/// Tunables for cardiac drift detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Samples before this offset are ignored (warmup)
    pub warmup_seconds: u32,
    /// Width of the non-overlapping scoring windows
    pub window_seconds: u32,
    /// Pace coefficient-of-variation ceiling for a window to count as steady
    pub pace_stability_threshold: f64,
    /// Minimum projected HR rise (bpm) to report drift
    pub drift_threshold_bpm: f64,
    /// Minimum number of steady windows required for a fit
    pub min_steady_windows: usize,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            warmup_seconds: 15 * 60,       // 15 min warmup
            window_seconds: 5 * 60,        // 5 min windows
            pace_stability_threshold: 0.10, // 10% pace CV = steady
            drift_threshold_bpm: 8.0,      // min projected rise to call it drift
            min_steady_windows: 4,
        }
    }
}

/// Result of cardiac drift detection. Absence means "not detected".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardiacDriftEvent {
    /// Start of the first steady window
    pub onset_elapsed_seconds: u32,
    /// Projected HR rise across the steady windows (bpm)
    pub total_hr_rise_bpm: f64,
    /// Mean pace in the first steady window (s/km), for context
    pub pace_at_onset_s_per_km: f64,
}

struct WindowStat {
    start_t: u32,
    mean_hr: f64,
    mean_pace: f64,
    pace_cv: f64,
}

/// Detect cardiac drift: progressive HR rise at steady pace.
///
/// Returns `None` whenever a detection is not possible or not warranted:
/// too little post-warmup data, fewer steady windows than
/// [`DriftConfig::min_steady_windows`], or a projected rise below the
/// threshold. None of these is an error.
pub fn detect_cardiac_drift(samples: &[Sample], config: &DriftConfig) -> Option<CardiacDriftEvent> {
    // Post-warmup samples carrying both HR and a positive pace
    let usable: Vec<(u32, f64, f64)> = samples
        .iter()
        .filter(|s| s.elapsed_seconds >= config.warmup_seconds)
        .filter_map(|s| match (s.heart_rate, s.pace_s_per_km) {
            (Some(hr), Some(pace)) if pace > 0.0 => {
                Some((s.elapsed_seconds, f64::from(hr), pace))
            }
            _ => None,
        })
        .collect();

    let (start_time, end_time) = match (usable.first(), usable.last()) {
        (Some(first), Some(last)) => (first.0, last.0),
        _ => return None,
    };

    // Consecutive non-overlapping windows anchored at the first usable sample
    let mut windows = Vec::new();
    let mut t = start_time;
    while t + config.window_seconds <= end_time {
        let window_end = t + config.window_seconds;
        let in_window: Vec<&(u32, f64, f64)> = usable
            .iter()
            .filter(|(ts, _, _)| *ts >= t && *ts < window_end)
            .collect();

        if in_window.len() >= MIN_WINDOW_SAMPLES {
            let hrs: Vec<f64> = in_window.iter().map(|(_, hr, _)| *hr).collect();
            let paces: Vec<f64> = in_window.iter().map(|(_, _, pace)| *pace).collect();
            windows.push(WindowStat {
                start_t: t,
                mean_hr: mean(&hrs),
                mean_pace: mean(&paces),
                pace_cv: coefficient_of_variation(&paces),
            });
        }
        t += config.window_seconds;
    }

    let steady: Vec<&WindowStat> = windows
        .iter()
        .filter(|w| w.pace_cv < config.pace_stability_threshold)
        .collect();

    if steady.len() < config.min_steady_windows {
        debug!(
            "cardiac drift: {} steady windows of {} scored, need {}",
            steady.len(),
            windows.len(),
            config.min_steady_windows
        );
        return None;
    }

    let hr_series: Vec<f64> = steady.iter().map(|w| w.mean_hr).collect();
    let slope = linear_slope(&hr_series)?;
    let projected_rise = slope * (steady.len() - 1) as f64;

    if projected_rise < config.drift_threshold_bpm {
        return None;
    }

    debug!(
        "cardiac drift detected: {:.1} bpm projected over {} steady windows",
        projected_rise,
        steady.len()
    );
    Some(CardiacDriftEvent {
        onset_elapsed_seconds: steady[0].start_t,
        total_hr_rise_bpm: round_to(projected_rise, 1),
        pace_at_onset_s_per_km: steady[0].mean_pace,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
