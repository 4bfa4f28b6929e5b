//! # Pace and Grade Model
//!
//! Pure numeric conversions between speed, pace and terrain grade, plus the
//! Minetti metabolic-cost model behind grade-adjusted pace (GAP).
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`pace_from_speed`] | m/s → seconds per kilometer |
//! | [`compute_grade`] | elevation change / distance → decimal grade |
//! | [`minetti_grade_multiplier`] | metabolic cost multiplier for a grade |
//! | [`grade_adjusted_pace`] | flat-ground-equivalent pace for a grade |
//! | [`format_pace`] | presentation-only "M:SS/km" or "M:SS/mi" |
//!
//! ## Algorithm Notes
//!
//! The GAP model evaluates the Minetti et al. (2002) quintic for the
//! metabolic cost of running on slopes (the same model Strava uses for
//! grade-adjusted pace), normalized so that flat ground maps to 1.0.
//!
//! Reference: Minetti AE et al., "Energy cost of walking and running at
//! extreme uphill and downhill slopes", J Appl Physiol, 2002.

use serde::{Deserialize, Serialize};

/// 1 mile in kilometers (exact).
const KM_PER_MILE: f64 = 1.60934;

/// Flat-ground metabolic cost, the Minetti polynomial's value at grade 0.
const FLAT_COST: f64 = 3.6;

/// Grades beyond this magnitude are outside the model's physiological range
/// and are clamped.
const GRADE_CLAMP: f64 = 0.45;

/// Convert speed in m/s to pace in seconds per kilometer.
///
/// Returns `None` for zero or negative speed; GPS dropout and
/// standing-still samples are routine, not errors.
///
/// # Example
///
/// ```rust
/// use run_telemetry::pace_from_speed;
///
/// assert_eq!(pace_from_speed(2.5), Some(400.0)); // 6:40/km
/// assert_eq!(pace_from_speed(0.0), None);
/// ```
#[inline]
pub fn pace_from_speed(speed_ms: f64) -> Option<f64> {
    if speed_ms <= 0.0 {
        return None;
    }
    Some(1000.0 / speed_ms)
}

/// Compute the slope grade between two elevation readings.
///
/// Returns the grade as a decimal (0.10 = 10% uphill). Non-positive distance
/// yields 0.0 rather than an error; zero distance deltas arise routinely
/// from discrete sampling.
#[inline]
pub fn compute_grade(elevation_start: f64, elevation_end: f64, distance_meters: f64) -> f64 {
    if distance_meters <= 0.0 {
        return 0.0;
    }
    (elevation_end - elevation_start) / distance_meters
}

/// Metabolic cost multiplier for running at a given grade, relative to flat
/// ground.
///
/// Values above 1.0 mean the effort costs more than flat running; below 1.0,
/// less. The input grade is clamped to ±45% before evaluation; beyond that
/// the polynomial is not physiologically meaningful.
///
/// The curve is not monotonic on descents: cost falls past 0%, bottoms out
/// near −20%, then rises again from eccentric braking load. Callers must not
/// assume steeper downhill always means cheaper.
///
/// # Example
///
/// ```rust
/// use run_telemetry::minetti_grade_multiplier;
///
/// let flat = minetti_grade_multiplier(0.0);
/// assert!((flat - 1.0).abs() < 1e-12);
/// assert!(minetti_grade_multiplier(0.10) > 1.0); // uphill costs more
/// ```
pub fn minetti_grade_multiplier(grade: f64) -> f64 {
    let g = grade.clamp(-GRADE_CLAMP, GRADE_CLAMP);
    let cost = 155.4 * g.powi(5) - 30.4 * g.powi(4) - 43.3 * g.powi(3) + 46.3 * g.powi(2)
        + 19.5 * g
        + FLAT_COST;
    cost / FLAT_COST
}

/// Grade-adjusted pace (GAP): the flat-ground pace representing the same
/// physiological effort as `pace_s_per_km` run on terrain with `grade`.
///
/// Uphill yields a GAP faster than the actual pace (the runner worked harder
/// than the raw pace shows); downhill yields a slower GAP.
#[inline]
pub fn grade_adjusted_pace(pace_s_per_km: f64, grade: f64) -> f64 {
    pace_s_per_km / minetti_grade_multiplier(grade)
}

/// Unit for pace formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaceUnit {
    /// Seconds per kilometer, rendered "M:SS/km"
    PerKm,
    /// Seconds per mile, rendered "M:SS/mi"
    PerMile,
}

/// Format a pace (given in seconds per kilometer) as a human-readable string.
///
/// Presentation-only; detection logic never consumes formatted paces.
///
/// # Example
///
/// ```rust
/// use run_telemetry::{format_pace, PaceUnit};
///
/// assert_eq!(format_pace(317.0, PaceUnit::PerKm), "5:17/km");
/// assert_eq!(format_pace(317.0, PaceUnit::PerMile), "8:30/mi");
/// ```
pub fn format_pace(pace_s_per_km: f64, unit: PaceUnit) -> String {
    let (pace_s, label) = match unit {
        PaceUnit::PerKm => (pace_s_per_km, "km"),
        PaceUnit::PerMile => (pace_s_per_km * KM_PER_MILE, "mi"),
    };
    let total = pace_s as u64;
    format!("{}:{:02}/{}", total / 60, total % 60, label)
}

// =============================================================================
// Unit Tests
// =============================================================================
