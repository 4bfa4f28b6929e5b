//! # Sample Extraction
//!
//! Converts decoded device-file records into canonical [`Sample`] values.
//!
//! The low-level binary decoder is an external collaborator; it hands this
//! module one [`RecordMessage`] per device sample: a timestamp plus named
//! numeric fields. Extraction is where all schema-variant handling lives:
//!
//! - elapsed seconds are computed relative to the first timestamped record
//! - "enhanced" precision fields are preferred over their legacy
//!   counterparts (`enhanced_speed` over `speed`, `enhanced_altitude` over
//!   `altitude`)
//! - GPS positions are converted from the device's fixed-point semicircle
//!   encoding to decimal degrees (`degrees = semicircles × 180 / 2³¹`)
//! - pace is derived from speed, absent rather than infinite when stationary
//! - records without a timestamp are skipped
//!
//! A stream that yields zero timestamped records is the one hard failure
//! this crate surfaces: [`ExtractError::NoUsableRecords`].

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::pace::pace_from_speed;
use crate::Sample;

/// Devices store lat/lon as 32-bit signed integers in "semicircles";
/// degrees = semicircles × 180 / 2³¹.
const SEMICIRCLE_TO_DEGREES: f64 = 180.0 / 2_147_483_648.0;

/// Ordered accessor attempts per logical field: the higher-precision spelling
/// first, its legacy counterpart second.
const SPEED_FIELDS: [&str; 2] = ["enhanced_speed", "speed"];
const ALTITUDE_FIELDS: [&str; 2] = ["enhanced_altitude", "altitude"];

/// Hard failure surfaced by sample extraction.
///
/// Everything else in this crate reports "nothing found" through its return
/// type; an activity whose decoded stream carries no timestamped samples
/// cannot be analyzed at all and must not be silently treated as empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The decoded record stream was empty or no record carried a timestamp.
    #[error("decoded record stream contains no timestamped samples")]
    NoUsableRecords,
}

/// One decoded device-file record: an optional timestamp plus named numeric
/// fields, exactly as the external decoder produces them.
///
/// Field names follow the device vocabulary (`heart_rate`, `enhanced_speed`,
/// `position_lat`, …). The same shape is used for rows reloaded from
/// storage, so every analysis consumer sees one canonical input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMessage {
    /// Device timestamp; records without one are skipped during extraction.
    pub timestamp: Option<DateTime<Utc>>,
    fields: HashMap<String, f64>,
}

impl RecordMessage {
    /// Create a record with the given timestamp and no fields.
    pub fn new(timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            timestamp,
            fields: HashMap::new(),
        }
    }

    /// Builder-style field insertion.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: f64) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Insert or overwrite a named field.
    pub fn set_field(&mut self, name: &str, value: f64) {
        self.fields.insert(name.to_string(), value);
    }

    /// Look up a single named field.
    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }

    /// Try a list of field spellings in priority order, returning the first
    /// one present.
    pub fn first_of(&self, names: &[&str]) -> Option<f64> {
        names.iter().find_map(|n| self.field(n))
    }
}

/// Convert a raw semicircle coordinate to decimal degrees, discarding values
/// outside the valid WGS84 range.
fn semicircles_to_degrees(semicircles: f64, limit: f64) -> Option<f64> {
    let degrees = semicircles * SEMICIRCLE_TO_DEGREES;
    if degrees.is_finite() && degrees.abs() <= limit {
        Some(degrees)
    } else {
        None
    }
}

/// Convert decoded device records into canonical samples.
///
/// Elapsed seconds are relative to the first timestamped record; records
/// without a timestamp are skipped. Returns
/// [`ExtractError::NoUsableRecords`] if no record carries a timestamp.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use run_telemetry::{samples_from_records, RecordMessage};
///
/// let start = Utc.with_ymd_and_hms(2024, 6, 1, 6, 30, 0).unwrap();
/// let records = vec![
///     RecordMessage::new(Some(start))
///         .with_field("heart_rate", 142.0)
///         .with_field("enhanced_speed", 2.5),
///     RecordMessage::new(Some(start + chrono::Duration::seconds(5)))
///         .with_field("heart_rate", 144.0)
///         .with_field("enhanced_speed", 2.6),
/// ];
///
/// let samples = samples_from_records(&records).unwrap();
/// assert_eq!(samples.len(), 2);
/// assert_eq!(samples[1].elapsed_seconds, 5);
/// assert_eq!(samples[0].pace_s_per_km, Some(400.0));
/// ```
pub fn samples_from_records(records: &[RecordMessage]) -> Result<Vec<Sample>, ExtractError> {
    let mut samples = Vec::with_capacity(records.len());
    let mut first_timestamp: Option<DateTime<Utc>> = None;
    let mut skipped = 0usize;

    for record in records {
        let Some(timestamp) = record.timestamp else {
            skipped += 1;
            continue;
        };
        let first = *first_timestamp.get_or_insert(timestamp);
        let elapsed_seconds = (timestamp - first).num_seconds().max(0) as u32;

        let speed_ms = record.first_of(&SPEED_FIELDS);
        let pace_s_per_km = speed_ms.and_then(pace_from_speed);

        samples.push(Sample {
            elapsed_seconds,
            heart_rate: record.field("heart_rate").map(|hr| hr as u16),
            pace_s_per_km,
            speed_ms,
            elevation_meters: record.first_of(&ALTITUDE_FIELDS),
            cadence_spm: record.field("cadence").map(|c| c as u16),
            distance_meters: record.field("distance"),
            latitude: record
                .field("position_lat")
                .and_then(|s| semicircles_to_degrees(s, 90.0)),
            longitude: record
                .field("position_long")
                .and_then(|s| semicircles_to_degrees(s, 180.0)),
            temperature_c: record.field("temperature"),
        });
    }

    if samples.is_empty() {
        return Err(ExtractError::NoUsableRecords);
    }
    if skipped > 0 {
        debug!("skipped {skipped} records without a timestamp");
    }
    Ok(samples)
}

// =============================================================================
// Unit Tests
// =============================================================================
