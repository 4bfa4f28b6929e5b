//! # Run Telemetry
//!
//! Run telemetry analytics for wearable-device activity streams.
//!
//! This library turns a per-second stream of GPS/HR/pace/elevation samples,
//! plus externally supplied lap boundaries, into derived physiological events
//! and per-segment statistics:
//!
//! - Mile and lap segmentation with per-segment pace, heart rate, grade and
//!   grade-adjusted pace (GAP)
//! - Heart-rate zone classification (5-zone model)
//! - Cardiac drift detection over steady-pace windows
//! - "Bonk" (metabolic collapse) detection, plain and segment-aware
//! - Galloway run/walk pattern detection
//! - Structured-workout classification and step-target extraction
//!
//! The engine performs no I/O: decoded device records and lap summaries go in
//! as plain values, immutable result values come out. A full invocation over
//! one activity (typically a few thousand samples) is a single bounded,
//! synchronous computation; callers are free to analyze independent
//! activities in parallel.
//!
//! ## Quick Start
//!
//! ```rust
//! use run_telemetry::{Sample, build_mile_segments, detect_bonk, BonkConfig};
//!
//! // One sample every 5 seconds at a steady 450 s/km
//! let samples: Vec<Sample> = (0u32..2000)
//!     .map(|i| {
//!         let t = i * 5;
//!         let speed = 1000.0 / 450.0;
//!         Sample {
//!             elapsed_seconds: t,
//!             heart_rate: Some(148),
//!             pace_s_per_km: Some(450.0),
//!             speed_ms: Some(speed),
//!             elevation_meters: Some(100.0),
//!             distance_meters: Some(f64::from(t) * speed),
//!             ..Sample::default()
//!         }
//!     })
//!     .collect();
//!
//! let segments = build_mile_segments(&samples, 185);
//! let bonks = detect_bonk(&samples, &BonkConfig::default());
//! assert!(!segments.is_empty());
//! assert!(bonks.is_empty());
//! ```

use serde::{Deserialize, Serialize};

pub mod bonk;
pub mod drift;
pub mod galloway;
pub mod pace;
pub mod record;
pub mod report;
pub mod segments;
pub mod stats;
pub mod workouts;
pub mod zones;

pub use bonk::{detect_bonk, detect_bonk_per_segment, BonkConfig, BonkEvent};
pub use drift::{detect_cardiac_drift, CardiacDriftEvent, DriftConfig};
pub use galloway::{detect_galloway_segments, GallowayConfig, GallowaySegments, SplitSummary};
pub use pace::{
    compute_grade, format_pace, grade_adjusted_pace, minetti_grade_multiplier, pace_from_speed,
    PaceUnit,
};
pub use record::{samples_from_records, ExtractError, RecordMessage};
pub use report::{analyze_run, AnalysisConfig, RunAnalysis};
pub use segments::{
    build_lap_segments, build_mile_segments, LapSegment, LapSummary, MileSegment, SegmentKind,
    SplitType, StepType, METERS_PER_MILE,
};
pub use workouts::{
    build_step_target_map, classify_workout_definition, StepTarget, WorkoutClassification,
    WorkoutType,
};
pub use zones::{classify_zone, DEFAULT_MAX_HR};

// ============================================================================
// Core Types
// ============================================================================

/// One measurement sample from a device activity stream, typically ~1 per
/// second.
///
/// `elapsed_seconds` (relative to the first record of the activity) is the
/// ordering key and the only required field; the device may not record every
/// metric at every sample. Within an ordered sequence, elapsed time is
/// non-decreasing, and cumulative distance, where present, is non-decreasing.
///
/// Samples are created once by [`samples_from_records`] (or directly from
/// persisted per-sample rows) and consumed read-only by every analysis
/// function.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since activity start
    pub elapsed_seconds: u32,
    /// Heart rate in bpm
    pub heart_rate: Option<u16>,
    /// Pace in seconds per kilometer, derived from speed
    pub pace_s_per_km: Option<f64>,
    /// Raw speed in m/s
    pub speed_ms: Option<f64>,
    /// Elevation in meters above sea level
    pub elevation_meters: Option<f64>,
    /// Running cadence in steps per minute
    pub cadence_spm: Option<u16>,
    /// Cumulative distance in meters from activity start
    pub distance_meters: Option<f64>,
    /// Latitude in decimal degrees
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees
    pub longitude: Option<f64>,
    /// Ambient temperature in °C
    pub temperature_c: Option<f64>,
}
