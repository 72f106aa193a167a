//! Analysis state for one open dataset.
//!
//! The session owns the signal, the cached spectrum and the cursor/range
//! selection. Only a change of signal, sampling frequency or window runs the
//! FFT again; cursor and range edits re-mask the cached arrays.

use crate::dsp::fft::compute_fft;
use crate::dsp::harmonics::{calculate_thd, find_peak, nearest_bin, peak_with_thd, ThdParams};
use crate::dsp::stats::{calculate_statistics, Statistics};
use crate::dsp::window::WindowKind;
use crate::selection::cursor::{CursorId, CursorMode};
use crate::selection::mask::{apply_mask, index_axis, Selection};
use crate::selection::range::RangePercent;
use crate::selection::SeriesSelection;
use crate::types::{PeakReport, SpectrumComponent, SpectrumResult, SpectrumSlice, XAxis};

/// Used when the sampling frequency is missing or unusable.
pub const DEFAULT_SAMPLING_HZ: f64 = 1000.0;

/// Identity of a computed spectrum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SpectrumKey {
    signal: blake3::Hash,
    fs_bits: u64,
    window: WindowKind,
}

#[derive(Clone, Debug)]
struct CachedSpectrum {
    key: SpectrumKey,
    result: Option<SpectrumResult>,
}

pub struct AnalysisSession {
    signal: Vec<f64>,
    digest: blake3::Hash,
    fs: f64,
    window: WindowKind,
    x_axis: XAxis,
    thd: ThdParams,
    cache: Option<CachedSpectrum>,
    fft_runs: u64,
    selection: SeriesSelection,
}

impl AnalysisSession {
    pub fn new(signal: Vec<f64>, fs: f64, window: WindowKind) -> Self {
        let digest = signal_digest(&signal);
        Self {
            signal,
            digest,
            fs: sanitize_fs(fs),
            window,
            x_axis: XAxis::default(),
            thd: ThdParams::default(),
            cache: None,
            fft_runs: 0,
            selection: SeriesSelection::default(),
        }
    }

    pub fn signal(&self) -> &[f64] {
        &self.signal
    }

    pub fn sampling_frequency(&self) -> f64 {
        self.fs
    }

    pub fn window(&self) -> WindowKind {
        self.window
    }

    pub fn x_axis(&self) -> XAxis {
        self.x_axis
    }

    pub fn thd_params(&self) -> &ThdParams {
        &self.thd
    }

    pub fn selection_state(&self) -> &SeriesSelection {
        &self.selection
    }

    /// Number of FFTs this session has run.
    pub fn fft_runs(&self) -> u64 {
        self.fft_runs
    }

    /// Replace the signal. The cursors are re-seeded on the next read.
    pub fn set_signal(&mut self, signal: Vec<f64>) {
        let digest = signal_digest(&signal);
        if digest != self.digest {
            self.selection.cursors.clear();
        }
        self.signal = signal;
        self.digest = digest;
    }

    /// Set the sampling frequency in Hz. Non-finite or non-positive values
    /// fall back to [`DEFAULT_SAMPLING_HZ`].
    pub fn set_sampling_frequency(&mut self, fs: f64) {
        self.fs = sanitize_fs(fs);
    }

    /// Set the sampling frequency from a kHz text field.
    pub fn set_sampling_frequency_text(&mut self, khz: &str) {
        self.fs = parse_sampling_khz(khz);
    }

    pub fn set_window(&mut self, window: WindowKind) {
        self.window = window;
    }

    pub fn set_window_name(&mut self, name: &str) {
        self.window = WindowKind::from_name(name);
    }

    /// Switch the cursor coordinate system. Cursors are re-seeded, since
    /// their old positions are meaningless on the new axis.
    pub fn set_x_axis(&mut self, axis: XAxis) {
        if axis != self.x_axis {
            self.x_axis = axis;
            self.selection.cursors.clear();
            self.refit_cursors();
        }
    }

    pub fn set_thd_params(&mut self, params: ThdParams) {
        self.thd = params;
    }

    pub fn set_cursor_mode(&mut self, mode: CursorMode) {
        self.selection.cursors.set_mode(mode);
    }

    /// Plot click at `x` (active axis coordinates).
    pub fn interact(&mut self, x: f64) -> Option<CursorId> {
        self.selection.cursors.interact(x)
    }

    pub fn drag_cursor(&mut self, id: CursorId, x: f64) -> bool {
        self.selection.cursors.drag(id, x)
    }

    pub fn place_cursors(&mut self, c1: f64, c2: f64) {
        self.selection.cursors.place(c1, c2);
    }

    pub fn set_range(&mut self, range: RangePercent) {
        self.selection.range = range;
    }

    /// The spectrum of the current signal, computing it if the signal,
    /// sampling frequency or window changed since the last call.
    pub fn spectrum(&mut self) -> Option<&SpectrumResult> {
        self.ensure_spectrum();
        self.cached()
    }

    /// Authoritative selection on the active axis.
    pub fn selection(&mut self) -> Selection {
        self.ensure_spectrum();
        match self.cached() {
            Some(spectrum) => self.selection.resolve(self.span(spectrum)),
            None => Selection::Full,
        }
    }

    /// Peak and THD for the current selection.
    ///
    /// Without a sub-selection this is the full-spectrum peak and THD.
    /// With one, the peak is searched inside it and THD uses that peak as the
    /// fundamental over the whole spectrum. `None` when there is no spectrum
    /// or the selection holds no bins.
    pub fn peak_report(&mut self) -> Option<PeakReport> {
        self.ensure_spectrum();
        let spectrum = self.cached()?;
        let selection = self.selection.resolve(self.span(spectrum));

        if selection.is_full() {
            let (peak_freq, peak_magnitude) = find_peak(&spectrum.frequencies, &spectrum.magnitude);
            let thd_percent = if self.thd == ThdParams::default() {
                spectrum.thd_full
            } else {
                calculate_thd(&spectrum.magnitude, &spectrum.frequencies, &self.thd)
            };
            return Some(PeakReport {
                peak_freq,
                peak_magnitude,
                peak_index: nearest_bin(&spectrum.frequencies, peak_freq).unwrap_or(0),
                thd_percent,
            });
        }

        let keep = selection.mask(&self.x_coordinates(spectrum));
        let freqs = apply_mask(&spectrum.frequencies, &keep);
        let magnitude = apply_mask(&spectrum.magnitude, &keep);
        peak_with_thd(
            SpectrumSlice::new(&freqs, &magnitude),
            spectrum.full_slice(),
            &self.thd,
        )
    }

    /// Statistics of one spectrum curve over the current selection.
    pub fn statistics(&mut self, component: SpectrumComponent) -> Option<Statistics> {
        self.ensure_spectrum();
        let spectrum = self.cached()?;
        let selection = self.selection.resolve(self.span(spectrum));
        let keep = selection.mask(&self.x_coordinates(spectrum));
        calculate_statistics(&apply_mask(spectrum.component(component), &keep))
    }

    /// Spectrum bins inside the current selection.
    pub fn selected_bins(&mut self) -> Vec<usize> {
        self.ensure_spectrum();
        match self.cached() {
            Some(spectrum) => self
                .selection
                .resolve(self.span(spectrum))
                .indices(&self.x_coordinates(spectrum)),
            None => Vec::new(),
        }
    }

    /// Coordinates of the spectrum bins on the active axis.
    pub fn x_coordinates(&self, spectrum: &SpectrumResult) -> Vec<f64> {
        match self.x_axis {
            XAxis::Frequency => spectrum.frequencies.clone(),
            XAxis::Index => index_axis(spectrum.len()),
        }
    }

    fn span(&self, spectrum: &SpectrumResult) -> f64 {
        match self.x_axis {
            XAxis::Frequency => spectrum.nyquist(),
            XAxis::Index => spectrum.len() as f64,
        }
    }

    fn key(&self) -> SpectrumKey {
        SpectrumKey {
            signal: self.digest,
            fs_bits: self.fs.to_bits(),
            window: self.window,
        }
    }

    fn cached(&self) -> Option<&SpectrumResult> {
        self.cache.as_ref()?.result.as_ref()
    }

    fn ensure_spectrum(&mut self) {
        let key = self.key();
        if self.cache.as_ref().is_some_and(|c| c.key == key) {
            return;
        }
        log::debug!(
            "computing spectrum: {} samples, fs={} Hz, window={}",
            self.signal.len(),
            self.fs,
            self.window
        );
        let result = compute_fft(&self.signal, self.fs, self.window);
        self.fft_runs += 1;
        self.cache = Some(CachedSpectrum { key, result });
        self.refit_cursors();
    }

    fn refit_cursors(&mut self) {
        let Some(spectrum) = self.cache.as_ref().and_then(|c| c.result.as_ref()) else {
            return;
        };
        let x = match self.x_axis {
            XAxis::Frequency => spectrum.frequencies.clone(),
            XAxis::Index => index_axis(spectrum.len()),
        };
        self.selection.cursors.fit_to_series(&x);
    }
}

/// Parse a sampling frequency entered in kHz, returning Hz.
///
/// Unparseable, non-finite or non-positive input gives [`DEFAULT_SAMPLING_HZ`].
pub fn parse_sampling_khz(text: &str) -> f64 {
    match text.trim().replace(',', ".").parse::<f64>() {
        Ok(khz) if khz.is_finite() && khz > 0.0 => khz * 1e3,
        _ => {
            log::warn!("invalid sampling frequency {text:?} kHz, using {DEFAULT_SAMPLING_HZ} Hz");
            DEFAULT_SAMPLING_HZ
        }
    }
}

fn sanitize_fs(fs: f64) -> f64 {
    if fs.is_finite() && fs > 0.0 {
        fs
    } else {
        log::warn!("invalid sampling frequency {fs} Hz, using {DEFAULT_SAMPLING_HZ} Hz");
        DEFAULT_SAMPLING_HZ
    }
}

/// Content digest of a signal, used as its cache identity.
pub fn signal_digest(signal: &[f64]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(signal.len() as u64).to_le_bytes());
    for v in signal {
        hasher.update(&v.to_le_bytes());
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::mask::Interval;
    use std::f64::consts::PI;

    const FS: f64 = 1e6;

    /// 1.0·sin(2π·50t) + 0.3·sin(2π·1000t) over two 50 Hz periods.
    fn demo_signal() -> Vec<f64> {
        (0..40_000)
            .map(|i| {
                let t = i as f64 / FS;
                (2.0 * PI * 50.0 * t).sin() + 0.3 * (2.0 * PI * 1000.0 * t).sin()
            })
            .collect()
    }

    fn session() -> AnalysisSession {
        AnalysisSession::new(demo_signal(), FS, WindowKind::Rectangular)
    }

    #[test]
    fn test_full_spectrum_report() {
        let mut s = session();
        let report = s.peak_report().unwrap();
        assert!((report.peak_freq - 50.0).abs() < 1e-9);
        assert!((report.peak_magnitude - 1.0).abs() < 0.05);
        assert_eq!(report.peak_index, 2);
        assert!((report.thd_percent - 30.0).abs() < 0.5);
        assert_eq!(report.thd_percent, s.spectrum().unwrap().thd_full);
    }

    #[test]
    fn test_cursor_band_finds_secondary_tone() {
        let mut s = session();
        s.set_cursor_mode(CursorMode::P1);
        s.place_cursors(2000.0, 100.0);
        assert_eq!(s.selection(), Selection::Cursors(Interval { lo: 100.0, hi: 2000.0 }));

        let report = s.peak_report().unwrap();
        assert!((report.peak_freq - 1000.0).abs() < 1e-9);
        assert!((report.peak_magnitude - 0.3).abs() < 0.01);
        assert_eq!(report.peak_index, 40);

        let spectrum = s.spectrum().unwrap().clone();
        let full = calculate_thd(
            &spectrum.magnitude,
            &spectrum.frequencies,
            &ThdParams::with_fundamental(1000.0),
        );
        assert_eq!(report.thd_percent, full);
    }

    #[test]
    fn test_cursor_moves_do_not_recompute() {
        let mut s = session();
        s.spectrum();
        assert_eq!(s.fft_runs(), 1);

        s.set_cursor_mode(CursorMode::Auto);
        for x in [100.0, 2000.0, 300.0, 5000.0] {
            s.interact(x);
            s.peak_report();
            s.statistics(SpectrumComponent::Magnitude);
        }
        s.drag_cursor(CursorId::Second, 1500.0);
        s.set_range(RangePercent::new(0.0, 10.0));
        s.peak_report();
        assert_eq!(s.fft_runs(), 1);

        s.set_window(WindowKind::Hann);
        s.peak_report();
        assert_eq!(s.fft_runs(), 2);

        s.set_window_name("Hann");
        s.spectrum();
        assert_eq!(s.fft_runs(), 2);
        s.set_window_name("Kaiser");
        assert_eq!(s.window(), WindowKind::Rectangular);
        s.spectrum();
        assert_eq!(s.fft_runs(), 3);
        s.set_window(WindowKind::Hann);

        s.set_sampling_frequency(FS / 2.0);
        s.spectrum();
        assert_eq!(s.fft_runs(), 4);

        // Same content, same identity.
        s.set_signal(demo_signal());
        s.spectrum();
        assert_eq!(s.fft_runs(), 4);
    }

    #[test]
    fn test_range_fallback_in_frequency_space() {
        let mut s = session();
        // Nyquist is 500 kHz, so 0.15 % reaches 750 Hz: only the 50 Hz tone.
        s.set_range(RangePercent::new(0.0, 0.15));
        let report = s.peak_report().unwrap();
        assert!((report.peak_freq - 50.0).abs() < 1e-9);
        assert!(matches!(s.selection(), Selection::Range(i) if (i.hi - 750.0).abs() < 1e-6));
    }

    #[test]
    fn test_index_axis_selection() {
        let mut s = session();
        s.set_x_axis(XAxis::Index);
        s.set_cursor_mode(CursorMode::P2);
        s.place_cursors(30.0, 50.0);
        let report = s.peak_report().unwrap();
        assert_eq!(report.peak_index, 40);
    }

    #[test]
    fn test_empty_selection_is_no_data() {
        let mut s = session();
        s.set_cursor_mode(CursorMode::P1);
        s.place_cursors(10.0, 20.0); // between bins 0 and 25 Hz
        assert!(s.peak_report().is_none());
        assert!(s.statistics(SpectrumComponent::Magnitude).is_none());
        assert!(s.selected_bins().is_empty());
    }

    #[test]
    fn test_cursors_seeded_on_first_spectrum() {
        let mut s = session();
        s.spectrum();
        let (lo, hi) = s.selection_state().cursors.pair().interval().unwrap();
        assert!((lo - 50_000.0).abs() < 1e-6);
        assert!((hi - 450_000.0).abs() < 1e-6);
        // Cursor mode is off, so they do not restrict anything yet.
        assert_eq!(s.selection(), Selection::Full);
    }

    #[test]
    fn test_statistics_over_selection() {
        let mut s = session();
        s.set_cursor_mode(CursorMode::P1);
        s.place_cursors(25.0, 75.0);
        let stats = s.statistics(SpectrumComponent::Magnitude).unwrap();
        assert!((stats.max - 1.0).abs() < 0.05);
        assert!(stats.min < 1e-9);
    }

    #[test]
    fn test_short_signal_has_no_spectrum() {
        let mut s = AnalysisSession::new(vec![1.0], FS, WindowKind::Hann);
        assert!(s.spectrum().is_none());
        assert!(s.peak_report().is_none());
        assert_eq!(s.selection(), Selection::Full);
        s.spectrum();
        assert_eq!(s.fft_runs(), 1);
    }

    #[test]
    fn test_sampling_frequency_fallbacks() {
        assert_eq!(parse_sampling_khz("48"), 48_000.0);
        assert_eq!(parse_sampling_khz("0,5"), 500.0);
        assert_eq!(parse_sampling_khz("abc"), DEFAULT_SAMPLING_HZ);
        assert_eq!(parse_sampling_khz("-3"), DEFAULT_SAMPLING_HZ);
        let mut s = AnalysisSession::new(vec![0.0; 4], f64::NAN, WindowKind::Rectangular);
        assert_eq!(s.sampling_frequency(), DEFAULT_SAMPLING_HZ);
        s.set_sampling_frequency_text("1000");
        assert_eq!(s.sampling_frequency(), 1e6);
    }

    #[test]
    fn test_digest_distinguishes_signals() {
        assert_ne!(signal_digest(&[1.0, 2.0]), signal_digest(&[2.0, 1.0]));
        assert_ne!(signal_digest(&[]), signal_digest(&[0.0]));
        assert_eq!(signal_digest(&[1.5]), signal_digest(&[1.5]));
    }
}
