//! # One-Shot Run Analysis
//!
//! Runs every analysis over one activity and bundles the results into a
//! single value for downstream reporting. Pure assembly: all data comes in
//! as arguments, nothing is fetched or persisted here.

use log::info;
use serde::{Deserialize, Serialize};

use crate::bonk::{detect_bonk, detect_bonk_per_segment, BonkConfig, BonkEvent};
use crate::drift::{detect_cardiac_drift, CardiacDriftEvent, DriftConfig};
use crate::galloway::{detect_galloway_segments, GallowayConfig, GallowaySegments, SplitSummary};
use crate::segments::{build_lap_segments, build_mile_segments, LapSegment, LapSummary, MileSegment};
use crate::zones::DEFAULT_MAX_HR;
use crate::Sample;

/// Configuration for a full analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Athlete's maximum heart rate, used for zone classification
    pub max_hr: u16,
    pub bonk: BonkConfig,
    pub drift: DriftConfig,
    pub galloway: GallowayConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_hr: DEFAULT_MAX_HR,
            bonk: BonkConfig::default(),
            drift: DriftConfig::default(),
            galloway: GallowayConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults with an explicit max HR.
    pub fn with_max_hr(max_hr: u16) -> Self {
        Self {
            max_hr,
            ..Self::default()
        }
    }
}

/// Complete analysis package for one run, safe to serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunAnalysis {
    pub mile_segments: Vec<MileSegment>,
    pub lap_segments: Vec<LapSegment>,
    pub bonk_events: Vec<BonkEvent>,
    pub cardiac_drift: Option<CardiacDriftEvent>,
    pub galloway: GallowaySegments,
}

/// Run the full analysis over one activity.
///
/// Bonk detection is segment-aware whenever lap descriptors are supplied
/// (rest intervals must not masquerade as collapses) and falls back to the
/// unrestricted scan otherwise. An empty lap list simply disables the
/// lap-based results.
pub fn analyze_run(samples: &[Sample], laps: &[LapSummary], config: &AnalysisConfig) -> RunAnalysis {
    let mile_segments = build_mile_segments(samples, config.max_hr);
    let lap_segments = build_lap_segments(laps, samples, config.max_hr);

    let bonk_events = if lap_segments.is_empty() {
        detect_bonk(samples, &config.bonk)
    } else {
        detect_bonk_per_segment(samples, &lap_segments, &config.bonk)
    };

    let cardiac_drift = detect_cardiac_drift(samples, &config.drift);

    let splits: Vec<SplitSummary> = laps
        .iter()
        .map(|lap| SplitSummary {
            split_type: lap.split_type,
            distance_meters: lap.distance_meters,
            elapsed_seconds: lap.duration_seconds,
            avg_speed_ms: lap
                .avg_pace_s_per_km
                .filter(|&p| p > 0.0)
                .map(|p| 1000.0 / p),
            avg_hr: lap.avg_hr,
        })
        .collect();
    let galloway = detect_galloway_segments(&splits, &config.galloway);

    info!(
        "analyzed run: {} miles, {} laps, {} bonk events, drift={}, galloway={}",
        mile_segments.len(),
        lap_segments.len(),
        bonk_events.len(),
        cardiac_drift.is_some(),
        galloway.is_galloway
    );

    RunAnalysis {
        mile_segments,
        lap_segments,
        bonk_events,
        cardiac_drift,
        galloway,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
