//! # Galloway Run/Walk Detection
//!
//! Detects whether a run used a Galloway (run/walk interval) strategy by
//! inspecting typed lap summaries, and computes per-phase statistics so that
//! downstream reporting can distinguish run-phase data from walk-break data.
//!
//! This is pattern recognition over lap tags, not plan verification: a run
//! counts as Galloway once it contains enough walk laps, regardless of the
//! rep structure.

use serde::{Deserialize, Serialize};

use crate::segments::SplitType;
use crate::stats::mean;

/// Tunables for Galloway detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GallowayConfig {
    /// Minimum number of walk laps required to call the run a Galloway run
    pub min_walk_segments: usize,
}

impl Default for GallowayConfig {
    fn default() -> Self {
        Self {
            min_walk_segments: 3,
        }
    }
}

/// One lap-level summary, as supplied by the caller. Only the run/walk tag,
/// distance, time, average speed and average HR matter here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub split_type: SplitType,
    pub distance_meters: f64,
    pub elapsed_seconds: f64,
    pub avg_speed_ms: Option<f64>,
    pub avg_hr: Option<f64>,
}

/// Result of Galloway run/walk detection.
///
/// A phase with zero laps yields absent (not zero) averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GallowaySegments {
    pub is_galloway: bool,
    pub run_segment_count: usize,
    pub walk_segment_count: usize,
    pub avg_run_pace_s_per_km: Option<f64>,
    pub avg_walk_pace_s_per_km: Option<f64>,
    pub avg_run_hr: Option<f64>,
    pub avg_walk_hr: Option<f64>,
}

/// Distance-weighted average pace (s/km) for one phase; falls back to the
/// unweighted mean of speed-derived paces when no distance is recorded.
fn phase_pace(splits: &[&SplitSummary]) -> Option<f64> {
    let total_dist: f64 = splits.iter().map(|s| s.distance_meters).sum();
    if total_dist <= 0.0 {
        let speeds: Vec<f64> = splits
            .iter()
            .filter_map(|s| s.avg_speed_ms)
            .filter(|&v| v > 0.0)
            .collect();
        if speeds.is_empty() {
            return None;
        }
        let avg_speed = mean(&speeds);
        return (avg_speed > 0.0).then(|| 1000.0 / avg_speed);
    }

    let total_time: f64 = splits.iter().map(|s| s.elapsed_seconds).sum();
    Some((total_time / total_dist) * 1000.0)
}

/// Unweighted mean of the laps that carry HR data.
fn phase_hr(splits: &[&SplitSummary]) -> Option<f64> {
    let hrs: Vec<f64> = splits.iter().filter_map(|s| s.avg_hr).collect();
    if hrs.is_empty() {
        return None;
    }
    Some(mean(&hrs))
}

/// Detect a Galloway run/walk pattern from typed lap summaries.
///
/// Laps tagged neither run nor walk (warmup, cooldown, untyped) are ignored
/// entirely. Empty input yields "not detected" with all-absent statistics,
/// not an error.
pub fn detect_galloway_segments(
    splits: &[SplitSummary],
    config: &GallowayConfig,
) -> GallowaySegments {
    let runs: Vec<&SplitSummary> = splits
        .iter()
        .filter(|s| s.split_type == SplitType::Run)
        .collect();
    let walks: Vec<&SplitSummary> = splits
        .iter()
        .filter(|s| s.split_type == SplitType::Walk)
        .collect();

    GallowaySegments {
        is_galloway: walks.len() >= config.min_walk_segments,
        run_segment_count: runs.len(),
        walk_segment_count: walks.len(),
        avg_run_pace_s_per_km: (!runs.is_empty()).then(|| phase_pace(&runs)).flatten(),
        avg_walk_pace_s_per_km: (!walks.is_empty()).then(|| phase_pace(&walks)).flatten(),
        avg_run_hr: phase_hr(&runs),
        avg_walk_hr: phase_hr(&walks),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
