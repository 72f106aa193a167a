use crate::selection::cursor::CursorController;
use crate::selection::range::RangePercent;
use serde::{Deserialize, Serialize};

/// Slack applied to both interval ends against round-off.
pub const MASK_EPSILON: f64 = 1e-12;

/// Closed interval `[lo, hi]` in X-axis coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    /// Build from two unordered end points.
    pub fn new(a: f64, b: f64) -> Self {
        Self { lo: a.min(b), hi: a.max(b) }
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.lo - MASK_EPSILON && x <= self.hi + MASK_EPSILON
    }
}

/// Which sub-interval of the series currently feeds the analysis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    /// Between the two cursors.
    Cursors(Interval),
    /// From the origin to the end of the percentage range.
    Range(Interval),
    /// No sub-selection.
    Full,
}

impl Selection {
    /// Resolve the authoritative selection.
    ///
    /// Active cursors win. Otherwise a range ending before the end of the
    /// series selects `[0, end% * span]`, where `span` is the coordinate
    /// extent (last frequency, or series length on an index axis).
    pub fn resolve(cursors: &CursorController, range: &RangePercent, span: f64) -> Self {
        if cursors.is_active() {
            if let Some((lo, hi)) = cursors.pair().interval() {
                return Selection::Cursors(Interval { lo, hi });
            }
        }
        if range.is_partial() {
            let end = range.clamped().end;
            return Selection::Range(Interval {
                lo: 0.0,
                hi: end / 100.0 * span,
            });
        }
        Selection::Full
    }

    pub fn interval(&self) -> Option<Interval> {
        match self {
            Selection::Cursors(i) | Selection::Range(i) => Some(*i),
            Selection::Full => None,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Selection::Full)
    }

    /// Per-point membership over the coordinate vector `x`.
    pub fn mask(&self, x: &[f64]) -> Vec<bool> {
        match self.interval() {
            Some(interval) => mask(x, interval),
            None => vec![true; x.len()],
        }
    }

    /// Indices of `x` inside the selection.
    pub fn indices(&self, x: &[f64]) -> Vec<usize> {
        self.mask(x)
            .into_iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect()
    }
}

/// `x >= lo && x <= hi`, with [`MASK_EPSILON`] slack.
pub fn mask(x: &[f64], interval: Interval) -> Vec<bool> {
    x.iter().map(|&v| interval.contains(v)).collect()
}

/// Values of `y` where `keep` is set.
pub fn apply_mask(y: &[f64], keep: &[bool]) -> Vec<f64> {
    y.iter()
        .zip(keep.iter())
        .filter_map(|(&v, &k)| k.then_some(v))
        .collect()
}

/// Index axis `0, 1, ..., len - 1` as coordinates.
pub fn index_axis(len: usize) -> Vec<f64> {
    (0..len).map(|i| i as f64).collect()
}
