//! # Numeric Statistics Utilities
//!
//! Small, noise-tolerant statistics shared by the segment builder and the
//! event detectors.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`mean`] | Arithmetic mean of a slice |
//! | [`median`] | Robust median (interpolated for even counts) |
//! | [`sample_stdev`] | Sample (n−1) standard deviation |
//! | [`coefficient_of_variation`] | stdev / mean, the pace-stability measure |
//! | [`linear_slope`] | Ordinary-least-squares slope over index → value |
//! | [`round_to`] | Round to a fixed number of decimal places |
//!
//! All functions return a neutral value (0.0 or `None`) for degenerate input
//! rather than panicking; GPS dropout and standing-still samples make empty
//! and single-element windows routine.

// =============================================================================
// Central Tendency
// =============================================================================

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of a slice, interpolating between the two middle values for even
/// counts. Returns 0.0 for an empty slice.
///
/// # Example
///
/// ```rust
/// use run_telemetry::stats::median;
///
/// assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
/// assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
/// ```
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut xs = values.to_vec();
    xs.sort_by(f64::total_cmp);
    let n = xs.len();
    if n % 2 == 1 {
        xs[n / 2]
    } else {
        (xs[n / 2 - 1] + xs[n / 2]) / 2.0
    }
}

// =============================================================================
// Spread
// =============================================================================

/// Sample (n−1) standard deviation. Returns 0.0 for fewer than two values.
pub fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Coefficient of variation (sample stdev / mean).
///
/// Returns 0.0 for fewer than two values or a zero mean. Used as the
/// pace-stability measure when selecting steady windows.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if values.len() < 2 || m == 0.0 {
        return 0.0;
    }
    sample_stdev(values) / m
}

// =============================================================================
// Trend
// =============================================================================

/// Ordinary-least-squares slope of `values` against their indices
/// (x = 0, 1, 2, …).
///
/// Returns `None` when a slope is undefined (fewer than two values).
pub fn linear_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

// =============================================================================
// Rounding
// =============================================================================

/// Round to `decimals` decimal places.
///
/// Per-segment and per-event statistics are rounded before being returned so
/// downstream consumers see stable, presentation-ready values.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

// =============================================================================
// Unit Tests
// =============================================================================
