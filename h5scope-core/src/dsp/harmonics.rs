//! Fundamental detection and Total Harmonic Distortion.

use crate::types::{PeakReport, SpectrumSlice};

/// Magnitudes below this are treated as no signal at all.
const MIN_FUNDAMENTAL: f64 = 1e-12;

/// Bins skipped at the bottom of the spectrum when auto-detecting the fundamental.
const DC_SKIP: usize = 1;

#[derive(Clone, Debug, PartialEq)]
pub struct ThdParams {
    /// Highest harmonic order included (2nd..=max).
    pub max_harmonic: usize,
    /// Bins summed on each side of a harmonic to absorb leakage.
    pub bins_per_harmonic: usize,
    /// Use the bin nearest to this frequency instead of auto-detecting.
    pub fundamental_freq: Option<f64>,
}

impl Default for ThdParams {
    fn default() -> Self {
        Self {
            max_harmonic: 40,
            bins_per_harmonic: 1,
            fundamental_freq: None,
        }
    }
}

impl ThdParams {
    pub fn with_fundamental(freq: f64) -> Self {
        Self {
            fundamental_freq: Some(freq),
            ..Self::default()
        }
    }
}

/// Frequency and magnitude of the largest bin, `(0.0, 0.0)` when empty.
///
/// DC is not excluded here; slice the arrays first if it must be.
pub fn find_peak(freqs: &[f64], magnitude: &[f64]) -> (f64, f64) {
    let len = freqs.len().min(magnitude.len());
    match argmax(&magnitude[..len]) {
        Some(idx) => (freqs[idx], magnitude[idx]),
        None => (0.0, 0.0),
    }
}

/// Total Harmonic Distortion in percent.
///
/// Sums the power of harmonics 2..=`max_harmonic` of the fundamental, each
/// over `2 * bins_per_harmonic + 1` bins, and divides its square root by the
/// fundamental magnitude. Stops at the first harmonic above the last
/// frequency bin. Degenerate spectra (no fundamental, fundamental at or below
/// 0 Hz) give `0.0`.
pub fn calculate_thd(magnitude: &[f64], freqs: &[f64], params: &ThdParams) -> f64 {
    let len = freqs.len().min(magnitude.len());
    let (magnitude, freqs) = (&magnitude[..len], &freqs[..len]);

    let fund_idx = match params.fundamental_freq {
        Some(f) => nearest_bin(freqs, f),
        None if len > DC_SKIP => argmax(&magnitude[DC_SKIP..]).map(|i| i + DC_SKIP),
        None => None,
    };
    let Some(fund_idx) = fund_idx else {
        return 0.0;
    };

    let fund_mag = magnitude[fund_idx];
    let f0 = freqs[fund_idx];
    if fund_mag < MIN_FUNDAMENTAL || f0 <= 0.0 {
        return 0.0;
    }

    let f_max = freqs[len - 1];
    let half = params.bins_per_harmonic;
    let mut harmonic_power = 0.0f64;

    for k in 2..=params.max_harmonic {
        let fk = k as f64 * f0;
        if fk > f_max {
            break;
        }
        let Some(idx) = nearest_bin(freqs, fk) else {
            break;
        };
        let lo = idx.saturating_sub(half);
        let hi = (idx + half + 1).min(len);
        harmonic_power += magnitude[lo..hi].iter().map(|m| m * m).sum::<f64>();
    }

    100.0 * harmonic_power.sqrt() / fund_mag
}

/// Peak of `restricted`, with THD measured over `full`.
///
/// Harmonics of an in-band peak usually lie outside the band, so the
/// harmonic search always runs on the unrestricted spectrum. Returns `None`
/// when `restricted` is empty.
pub fn peak_with_thd(restricted: SpectrumSlice<'_>, full: SpectrumSlice<'_>, params: &ThdParams) -> Option<PeakReport> {
    if restricted.is_empty() {
        return None;
    }
    let (peak_freq, peak_magnitude) = find_peak(restricted.freqs, restricted.magnitude);
    let thd_params = ThdParams {
        fundamental_freq: Some(peak_freq),
        ..params.clone()
    };
    let thd_percent = calculate_thd(full.magnitude, full.freqs, &thd_params);
    Some(PeakReport {
        peak_freq,
        peak_magnitude,
        peak_index: nearest_bin(full.freqs, peak_freq).unwrap_or(0),
        thd_percent,
    })
}

/// Index of the first maximum. A NaN wins immediately, as with numpy's argmax.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            return Some(i);
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the bin whose frequency is closest to `target` (first on ties).
pub fn nearest_bin(freqs: &[f64], target: f64) -> Option<usize> {
    let distances: Vec<f64> = freqs.iter().map(|f| -(f - target).abs()).collect();
    argmax(&distances)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(n: usize, step: f64) -> Vec<f64> {
        (0..n).map(|i| i as f64 * step).collect()
    }

    #[test]
    fn test_find_peak_empty() {
        assert_eq!(find_peak(&[], &[]), (0.0, 0.0));
    }

    #[test]
    fn test_find_peak_includes_dc() {
        let freqs = axis(4, 10.0);
        let mag = [5.0, 1.0, 3.0, 3.0];
        assert_eq!(find_peak(&freqs, &mag), (0.0, 5.0));
    }

    #[test]
    fn test_find_peak_first_of_ties() {
        let freqs = axis(4, 10.0);
        let mag = [0.0, 3.0, 1.0, 3.0];
        assert_eq!(find_peak(&freqs, &mag), (10.0, 3.0));
    }

    #[test]
    fn test_thd_all_zero_is_zero() {
        let freqs = axis(33, 1.0);
        let mag = vec![0.0; 33];
        let thd = calculate_thd(&mag, &freqs, &ThdParams::default());
        assert_eq!(thd, 0.0);
    }

    #[test]
    fn test_thd_tiny_arrays() {
        let params = ThdParams::default();
        assert_eq!(calculate_thd(&[], &[], &params), 0.0);
        assert_eq!(calculate_thd(&[1.0], &[0.0], &params), 0.0);
        assert_eq!(calculate_thd(&[1.0], &[0.0], &ThdParams::with_fundamental(5.0)), 0.0);
    }

    #[test]
    fn test_thd_single_harmonic() {
        let freqs = axis(101, 10.0);
        let mut mag = vec![0.0; 101];
        mag[5] = 1.0; // 50 Hz fundamental
        mag[10] = 0.1; // 2nd harmonic
        mag[15] = 0.05; // 3rd harmonic
        let thd = calculate_thd(&mag, &freqs, &ThdParams::default());
        let expected = 100.0 * (0.1f64 * 0.1 + 0.05 * 0.05).sqrt();
        assert!((thd - expected).abs() < 1e-9);
    }

    #[test]
    fn test_thd_skips_dc_when_auto() {
        let freqs = axis(101, 10.0);
        let mut mag = vec![0.0; 101];
        mag[0] = 10.0;
        mag[5] = 1.0;
        mag[10] = 0.5;
        let thd = calculate_thd(&mag, &freqs, &ThdParams::default());
        assert!((thd - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_thd_leakage_bins() {
        let freqs = axis(101, 10.0);
        let mut mag = vec![0.0; 101];
        mag[5] = 1.0;
        mag[9] = 0.03;
        mag[10] = 0.04;
        mag[11] = 0.0;
        let narrow = ThdParams {
            bins_per_harmonic: 0,
            ..ThdParams::default()
        };
        assert!((calculate_thd(&mag, &freqs, &narrow) - 4.0).abs() < 1e-9);
        assert!((calculate_thd(&mag, &freqs, &ThdParams::default()) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_thd_stops_above_last_bin() {
        let freqs = axis(11, 10.0); // up to 100 Hz
        let mut mag = vec![0.0; 11];
        mag[4] = 1.0; // 40 Hz, only the 2nd harmonic fits
        mag[8] = 0.2;
        mag[10] = 0.9; // 100 Hz is not a harmonic of 40 Hz
        let thd = calculate_thd(&mag, &freqs, &ThdParams::with_fundamental(40.0));
        assert!((thd - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_thd_max_harmonic_limit() {
        let freqs = axis(101, 10.0);
        let mut mag = vec![0.0; 101];
        mag[5] = 1.0;
        mag[10] = 0.1;
        mag[15] = 0.1;
        let params = ThdParams {
            max_harmonic: 2,
            bins_per_harmonic: 0,
            fundamental_freq: None,
        };
        assert!((calculate_thd(&mag, &freqs, &params) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_thd_given_fundamental_at_dc_is_zero() {
        let freqs = axis(11, 10.0);
        let mag = vec![1.0; 11];
        assert_eq!(calculate_thd(&mag, &freqs, &ThdParams::with_fundamental(0.0)), 0.0);
    }

    #[test]
    fn test_peak_with_thd_uses_full_spectrum() {
        let freqs = axis(101, 10.0);
        let mut mag = vec![0.0; 101];
        mag[5] = 2.0; // 50 Hz, outside the band
        mag[20] = 1.0; // 200 Hz, inside
        mag[40] = 0.25; // 2nd harmonic of 200 Hz, outside the band
        let lo = 15;
        let hi = 30;
        let restricted = SpectrumSlice::new(&freqs[lo..hi], &mag[lo..hi]);
        let full = SpectrumSlice::new(&freqs, &mag);

        let report = peak_with_thd(restricted, full, &ThdParams::default()).unwrap();
        assert_eq!(report.peak_freq, 200.0);
        assert_eq!(report.peak_magnitude, 1.0);
        assert_eq!(report.peak_index, 20);
        assert!((report.thd_percent - 25.0).abs() < 1e-9);

        // Restricting the harmonic search as well would miss the 400 Hz line.
        let band_only = calculate_thd(&mag[lo..hi], &freqs[lo..hi], &ThdParams::with_fundamental(200.0));
        assert_eq!(band_only, 0.0);
    }

    #[test]
    fn test_peak_with_thd_empty_restriction() {
        let freqs = axis(4, 1.0);
        let mag = [0.0, 1.0, 0.0, 0.0];
        let empty = SpectrumSlice::new(&[], &[]);
        assert!(peak_with_thd(empty, SpectrumSlice::new(&freqs, &mag), &ThdParams::default()).is_none());
    }

    #[test]
    fn test_argmax_nan_semantics() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[1.0, f64::NAN, 5.0]), Some(1));
        assert_eq!(argmax(&[1.0, 5.0, 5.0]), Some(1));
        assert_eq!(argmax(&[f64::NEG_INFINITY]), Some(0));
    }

    #[test]
    fn test_nearest_bin() {
        let freqs = axis(5, 10.0);
        assert_eq!(nearest_bin(&freqs, 14.0), Some(1));
        assert_eq!(nearest_bin(&freqs, 15.0), Some(1));
        assert_eq!(nearest_bin(&freqs, 1e9), Some(4));
        assert_eq!(nearest_bin(&[], 1.0), None);
    }
}
