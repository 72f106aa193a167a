use crate::dsp::harmonics::{calculate_thd, ThdParams};
use crate::dsp::window::{window, WindowKind};
use crate::types::SpectrumResult;
use realfft::RealFftPlanner;
use std::cell::RefCell;

thread_local! {
    static FFT_PLANNER: RefCell<RealFftPlanner<f64>> = RefCell::new(RealFftPlanner::new());
}

/// Magnitudes below this are clamped before conversion to dB.
pub const DB_FLOOR: f64 = 1e-12;

/// Compute the one-sided spectrum of `signal` sampled at `fs` Hz.
///
/// The mean of the finite samples is removed first so the DC bin does not
/// leak into the low bins. Magnitudes are scaled by `2 / Σwindow`, which
/// reads a full-scale sine back at its amplitude (the Nyquist bin is scaled
/// the same way). Returns `None` for fewer than two samples.
pub fn compute_fft(signal: &[f64], fs: f64, kind: WindowKind) -> Option<SpectrumResult> {
    let n = signal.len();
    if n < 2 {
        return None;
    }

    let mean = finite_mean(signal);
    let win = window(kind, n);
    let mut win_sum: f64 = win.iter().sum();
    if win_sum == 0.0 {
        win_sum = 1.0;
    }

    let fft = FFT_PLANNER.with(|p| p.borrow_mut().plan_fft_forward(n));
    let mut input = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();

    for (inp, (&s, &w)) in input.iter_mut().zip(signal.iter().zip(win.iter())) {
        *inp = (s - mean) * w;
    }

    if let Err(e) = fft.process(&mut input, &mut spectrum) {
        log::warn!("FFT of {n} samples failed: {e}");
        return None;
    }

    let frequencies = rfft_frequencies(n, fs);
    let magnitude: Vec<f64> = spectrum.iter().map(|c| 2.0 * c.norm() / win_sum).collect();
    let phase: Vec<f64> = spectrum.iter().map(|c| c.arg()).collect();
    let magnitude_db: Vec<f64> = magnitude
        .iter()
        .map(|&m| 20.0 * m.max(DB_FLOOR).log10())
        .collect();

    let thd_full = calculate_thd(&magnitude, &frequencies, &ThdParams::default());

    Some(SpectrumResult {
        frequencies,
        magnitude,
        magnitude_db,
        phase,
        thd_full,
    })
}

/// Bin centre frequencies `k * fs / n` for `k = 0..=n/2`.
pub fn rfft_frequencies(n: usize, fs: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let step = 1.0 / (n as f64 * (1.0 / fs));
    (0..=n / 2).map(|k| k as f64 * step).collect()
}

/// Mean of the finite samples; NaN when there are none.
pub(crate) fn finite_mean(samples: &[f64]) -> f64 {
    let (sum, count) = samples
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0usize), |(s, c), &v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
