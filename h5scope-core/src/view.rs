use crate::dsp::stats::{calculate_statistics, Statistics};
use crate::selection::cursor::finite_extent;
use crate::selection::mask::{apply_mask, index_axis, Selection};
use crate::selection::range::display_stride;
use crate::selection::SeriesSelection;

/// A plotted X/Y series with its own cursors and range, as shown in the
/// data view.
#[derive(Clone, Debug, Default)]
pub struct SeriesView {
    x: Vec<f64>,
    y: Vec<f64>,
    pub selection: SeriesSelection,
}

impl SeriesView {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        let mut view = Self {
            x,
            y,
            selection: SeriesSelection::default(),
        };
        view.selection.cursors.reset_to_series(&view.x);
        view
    }

    /// A series plotted against its sample index.
    pub fn indexed(y: Vec<f64>) -> Self {
        Self::new(index_axis(y.len()), y)
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Swap in new data. Cursors that still fall near the new extent are kept.
    pub fn set_series(&mut self, x: Vec<f64>, y: Vec<f64>) {
        let reshaped = x.len() != self.x.len();
        self.x = x;
        self.y = y;
        if reshaped {
            self.selection.cursors.reset_to_series(&self.x);
        } else {
            self.selection.cursors.fit_to_series(&self.x);
        }
    }

    /// Largest finite X coordinate, the reference for the fallback range.
    pub fn span(&self) -> f64 {
        finite_extent(&self.x).map(|(_, hi)| hi).unwrap_or(0.0)
    }

    pub fn resolve(&self) -> Selection {
        self.selection.resolve(self.span())
    }

    /// Statistics of the Y values inside the current selection.
    pub fn statistics(&self) -> Option<Statistics> {
        let keep = self.resolve().mask(&self.x);
        calculate_statistics(&apply_mask(&self.y, &keep))
    }

    /// Rows to export: those between the cursors when they are active,
    /// every row otherwise.
    pub fn selected_rows(&self) -> Vec<usize> {
        let rows = self.x.len().min(self.y.len());
        if !self.selection.cursors.is_active() {
            return (0..rows).collect();
        }
        self.resolve().indices(&self.x[..rows])
    }

    /// Index window and decimation step for drawing the range.
    pub fn display_window(&self, log_x: bool) -> (usize, usize, usize) {
        let (start, end) = if log_x {
            self.selection.range.log_index_bounds(&self.x)
        } else {
            self.selection.range.index_bounds(self.x.len())
        };
        (start, end, display_stride(end - start))
    }
}
