//! Percentage range over the full series, the fallback selection when the
//! cursors are off.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_START_PCT: f64 = 99.9;
pub const MIN_RANGE_WIDTH_PCT: f64 = 0.01;

/// End percentages at or above this count as "the whole series".
pub const FULL_RANGE_PCT: f64 = 99.99;

/// Series longer than this get a reduced initial range.
pub const DISPLAY_POINT_TARGET: usize = 50_000;

/// Plotted slices above this many points are decimated.
pub const DISPLAY_POINT_CEILING: usize = 55_000;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum RangeError {
    #[error("not a percentage: {0:?}")]
    Malformed(String),
    #[error("percentage out of range: {0}")]
    OutOfBounds(f64),
}

/// Parse a percentage field. Accepts `,` as decimal separator and a
/// trailing `%`. Empty text yields `Ok(None)`.
pub fn parse_percent(text: &str) -> Result<Option<f64>, RangeError> {
    let cleaned = text.trim().replace(',', ".").replace('%', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| RangeError::Malformed(text.to_string()))
}

/// Lenient form of [`parse_percent`]: empty or malformed text gives `default`.
pub fn percent_or(text: &str, default: f64) -> f64 {
    match parse_percent(text) {
        Ok(Some(v)) => v,
        Ok(None) => default,
        Err(e) => {
            log::warn!("{e}, using {default}");
            default
        }
    }
}

/// Start field check: empty, or `0 <= v < 100`.
pub fn validate_start(text: &str) -> Result<(), RangeError> {
    match parse_percent(text)? {
        Some(v) if !(0.0..100.0).contains(&v) => Err(RangeError::OutOfBounds(v)),
        _ => Ok(()),
    }
}

/// End field check: empty, or `0 < v <= 100`.
pub fn validate_end(text: &str) -> Result<(), RangeError> {
    match parse_percent(text)? {
        Some(v) if !(v > 0.0 && v <= 100.0) => Err(RangeError::OutOfBounds(v)),
        _ => Ok(()),
    }
}

/// Start/end percentages of the full series length.
///
/// Stored as entered; [`RangePercent::clamped`] is applied on every read.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangePercent {
    pub start: f64,
    pub end: f64,
}

impl Default for RangePercent {
    fn default() -> Self {
        Self::FULL
    }
}

impl RangePercent {
    pub const FULL: RangePercent = RangePercent { start: 0.0, end: 100.0 };

    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Build from the two text fields, falling back to 0 / 100.
    pub fn from_text(start: &str, end: &str) -> Self {
        Self {
            start: percent_or(start, 0.0),
            end: percent_or(end, 100.0),
        }
    }

    /// Like [`from_text`](Self::from_text) but rejects malformed or
    /// out-of-bounds fields instead of falling back.
    pub fn try_from_text(start: &str, end: &str) -> Result<Self, RangeError> {
        validate_start(start)?;
        validate_end(end)?;
        Ok(Self::from_text(start, end))
    }

    /// start ∈ [0, 99.9], end ∈ [start + 0.01, 100].
    pub fn clamped(&self) -> Self {
        let start = clamp_nan(self.start, 0.0, MAX_START_PCT, 0.0);
        let end = clamp_nan(self.end, start + MIN_RANGE_WIDTH_PCT, 100.0, 100.0);
        Self { start, end }
    }

    /// Whether the clamped range stops short of the end of the series.
    pub fn is_partial(&self) -> bool {
        self.clamped().end < FULL_RANGE_PCT
    }

    /// Half-open `[start, end)` index bounds of the range in a series of
    /// `len` points. `start < end` whenever `len > 0`.
    pub fn index_bounds(&self, len: usize) -> (usize, usize) {
        if len == 0 {
            return (0, 0);
        }
        let r = self.clamped();
        let total = len as f64;
        let mut start = (total * (r.start / 100.0)).clamp(0.0, (len - 1) as f64) as usize;
        let end = (total * (r.end / 100.0)).clamp(1.0, total) as usize;
        if start >= end {
            start = end.saturating_sub(1);
        }
        (start, end)
    }

    /// Like [`index_bounds`](Self::index_bounds) but for a logarithmic X
    /// axis: a leading point at or below zero (the DC bin) is skipped.
    pub fn log_index_bounds(&self, x: &[f64]) -> (usize, usize) {
        let (mut start, end) = self.index_bounds(x.len());
        if start == 0 && x.len() > 1 && x[0] <= 1e-10 {
            start = 1;
        }
        if start >= end {
            start = end.saturating_sub(1);
        }
        (start, end)
    }

    /// Initial range for a series of `total_points`: everything when it has
    /// at most `target` points, otherwise about `target` points from the
    /// start, rounded to two decimals.
    pub fn auto_limit(total_points: usize, target: usize) -> Self {
        if total_points <= target {
            return Self::FULL;
        }
        let pct = (target as f64 / total_points as f64 * 100.0).clamp(0.01, 100.0);
        Self {
            start: 0.0,
            end: (pct * 100.0).round() / 100.0,
        }
    }
}

fn clamp_nan(v: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if v.is_nan() {
        fallback.clamp(lo, hi)
    } else {
        v.clamp(lo, hi)
    }
}

/// Decimation step for plotting `points` values.
pub fn display_stride(points: usize) -> usize {
    if points > DISPLAY_POINT_CEILING {
        (points / DISPLAY_POINT_TARGET).max(1)
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_range_of_ten_thousand() {
        let r = RangePercent::new(0.0, 50.0);
        assert_eq!(r.index_bounds(10_000), (0, 5000));
    }

    #[test]
    fn test_end_above_hundred_clamps() {
        let r = RangePercent::new(0.0, 150.0);
        assert_eq!(r.clamped().end, 100.0);
        assert_eq!(r.index_bounds(10_000), (0, 10_000));
        assert!(!r.is_partial());
    }

    #[test]
    fn test_clamping_rules() {
        let r = RangePercent::new(120.0, 10.0).clamped();
        assert_eq!(r.start, 99.9);
        assert!((r.end - 99.91).abs() < 1e-9);

        let r = RangePercent::new(-5.0, 0.0).clamped();
        assert_eq!(r.start, 0.0);
        assert_eq!(r.end, 0.01);

        let r = RangePercent::new(f64::NAN, f64::NAN).clamped();
        assert_eq!(r, RangePercent::FULL);
    }

    #[test]
    fn test_index_bounds_never_empty() {
        let r = RangePercent::new(0.0, 0.0);
        assert_eq!(r.index_bounds(10), (0, 1));
        let r = RangePercent::new(99.9, 100.0);
        assert_eq!(r.index_bounds(5), (4, 5));
        assert_eq!(RangePercent::FULL.index_bounds(0), (0, 0));
    }

    #[test]
    fn test_log_bounds_skip_dc() {
        let x = [0.0, 10.0, 20.0, 30.0];
        assert_eq!(RangePercent::FULL.log_index_bounds(&x), (1, 4));
        let x = [5.0, 10.0];
        assert_eq!(RangePercent::FULL.log_index_bounds(&x), (0, 2));
        assert_eq!(RangePercent::FULL.log_index_bounds(&[0.0]), (0, 1));
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent(" 12,5 % "), Ok(Some(12.5)));
        assert_eq!(parse_percent(""), Ok(None));
        assert!(matches!(parse_percent("abc"), Err(RangeError::Malformed(_))));
        assert_eq!(percent_or("abc", 100.0), 100.0);
        assert_eq!(percent_or("  ", 7.0), 7.0);
    }

    #[test]
    fn test_from_text_defaults() {
        assert_eq!(RangePercent::from_text("", "oops"), RangePercent::FULL);
        assert_eq!(RangePercent::from_text("10", "20%"), RangePercent::new(10.0, 20.0));
    }

    #[test]
    fn test_field_validation() {
        assert!(validate_start("0").is_ok());
        assert!(validate_start("").is_ok());
        assert!(validate_start("100").is_err());
        assert!(matches!(validate_start("x"), Err(RangeError::Malformed(_))));
        assert!(validate_end("100").is_ok());
        assert!(validate_end("0").is_err());
        assert!(matches!(validate_end("101"), Err(RangeError::OutOfBounds(v)) if v == 101.0));
        assert_eq!(
            validate_end("101").unwrap_err().to_string(),
            "percentage out of range: 101"
        );
    }

    #[test]
    fn test_strict_text_range() {
        assert_eq!(RangePercent::try_from_text("", "25"), Ok(RangePercent::new(0.0, 25.0)));
        assert_eq!(RangePercent::try_from_text("", ""), Ok(RangePercent::FULL));
        assert_eq!(RangePercent::try_from_text("0", "150"), Err(RangeError::OutOfBounds(150.0)));
        assert!(matches!(RangePercent::try_from_text("ten", "50"), Err(RangeError::Malformed(_))));
    }

    #[test]
    fn test_auto_limit() {
        let target = DISPLAY_POINT_TARGET;
        assert_eq!(RangePercent::auto_limit(1000, target), RangePercent::FULL);
        assert_eq!(RangePercent::auto_limit(50_000, target), RangePercent::FULL);
        assert_eq!(RangePercent::auto_limit(200_000, target).end, 25.0);
        assert_eq!(RangePercent::auto_limit(300_000, target).end, 16.67);
        assert_eq!(RangePercent::auto_limit(usize::MAX, target).end, 0.01);
        assert_eq!(RangePercent::auto_limit(1000, 100).end, 10.0);
        assert_eq!(RangePercent::auto_limit(1000, 0).end, 0.01);
    }

    #[test]
    fn test_display_stride() {
        assert_eq!(display_stride(10), 1);
        assert_eq!(display_stride(55_000), 1);
        assert_eq!(display_stride(55_001), 1);
        assert_eq!(display_stride(150_000), 3);
    }
}
