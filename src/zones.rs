//! # Heart-Rate Zone Classification
//!
//! Five-zone model based on percentage of maximum heart rate:
//!
//! - Zone 1: < 60% (very easy, recovery)
//! - Zone 2: 60-70% (aerobic base)
//! - Zone 3: 70-80% (moderate aerobic, tempo)
//! - Zone 4: 80-90% (threshold)
//! - Zone 5: >= 90% (max effort / VO2max)

/// Zone lower boundaries for zones 2–5, as fractions of max HR.
const ZONE_BOUNDARIES: [f64; 4] = [0.60, 0.70, 0.80, 0.90];

/// Default maximum heart rate (bpm) when the caller has no athlete profile.
pub const DEFAULT_MAX_HR: u16 = 185;

/// Classify a heart-rate reading into zones 1–5 using % of max HR.
///
/// Total function: every input maps to a zone (the caller guarantees
/// `max_hr > 0`).
///
/// # Example
///
/// ```rust
/// use run_telemetry::classify_zone;
///
/// assert_eq!(classify_zone(100, 185), 1); // 54% of max
/// assert_eq!(classify_zone(140, 185), 3); // 76% of max
/// assert_eq!(classify_zone(170, 185), 5); // 92% of max
/// ```
pub fn classify_zone(heart_rate: u16, max_hr: u16) -> u8 {
    let pct = f64::from(heart_rate) / f64::from(max_hr);
    for (i, boundary) in ZONE_BOUNDARIES.iter().enumerate() {
        if pct < *boundary {
            return (i + 1) as u8;
        }
    }
    5
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_1_below_60_pct() {
        assert_eq!(classify_zone(110, 185), 1); // 59.5%
    }

    #[test]
    fn test_zone_2_at_60_pct_boundary() {
        assert_eq!(classify_zone(111, 185), 2); // exactly 60%
    }

    #[test]
    fn test_zone_3_mid_band() {
        assert_eq!(classify_zone(138, 185), 3); // 74.6%
    }

    #[test]
    fn test_zone_4_threshold_band() {
        assert_eq!(classify_zone(155, 185), 4); // 83.8%
    }

    #[test]
    fn test_zone_5_at_and_above_90_pct() {
        assert_eq!(classify_zone(167, 185), 5); // 90.3%
        assert_eq!(classify_zone(200, 185), 5); // above max HR still zone 5
    }

    #[test]
    fn test_all_zones_reachable_for_default_max() {
        let zones: Vec<u8> = (60..=200)
            .map(|hr| classify_zone(hr, DEFAULT_MAX_HR))
            .collect();
        for z in 1..=5u8 {
            assert!(zones.contains(&z), "zone {z} never produced");
        }
    }
}
