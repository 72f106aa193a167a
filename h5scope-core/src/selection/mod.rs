//! Cursor and range selection over a plotted series.

pub mod cursor;
pub mod mask;
pub mod range;

use cursor::{CursorController, CursorMode};
use mask::Selection;
use range::RangePercent;

/// Cursor state plus fallback range for one plotted series.
#[derive(Clone, Debug, Default)]
pub struct SeriesSelection {
    pub cursors: CursorController,
    pub range: RangePercent,
}

impl SeriesSelection {
    pub fn new(mode: CursorMode, range: RangePercent) -> Self {
        Self {
            cursors: CursorController::new(mode),
            range,
        }
    }

    /// Authoritative selection for a series whose coordinates span `span`.
    pub fn resolve(&self, span: f64) -> Selection {
        Selection::resolve(&self.cursors, &self.range, span)
    }
}
