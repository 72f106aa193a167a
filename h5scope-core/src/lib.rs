//! Signal analysis engine for the h5scope dataset inspector: windowed FFT,
//! harmonic distortion, descriptive statistics and the cursor/range model
//! that decides which samples feed them.

pub mod dsp;
pub mod selection;
pub mod session;
pub mod types;
pub mod view;

pub use dsp::fft::compute_fft;
pub use dsp::harmonics::{calculate_thd, find_peak, peak_with_thd, ThdParams};
pub use dsp::stats::{calculate_statistics, Statistics};
pub use dsp::window::{window, WindowKind};
pub use session::AnalysisSession;
pub use types::{PeakReport, SpectrumComponent, SpectrumResult, SpectrumSlice, XAxis};
pub use view::SeriesView;
