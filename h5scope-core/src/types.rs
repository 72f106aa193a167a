use serde::{Deserialize, Serialize};

/// One-sided spectrum of a real signal.
///
/// All four vectors have `n / 2 + 1` entries, `frequencies` ascending from
/// 0 Hz to `fs * (n / 2) / n`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectrumResult {
    pub frequencies: Vec<f64>,
    pub magnitude: Vec<f64>,
    pub magnitude_db: Vec<f64>,
    pub phase: Vec<f64>,
    /// Full-spectrum THD in percent, fundamental auto-detected.
    pub thd_full: f64,
}

impl SpectrumResult {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn nyquist(&self) -> f64 {
        self.frequencies.last().copied().unwrap_or(0.0)
    }

    pub fn component(&self, component: SpectrumComponent) -> &[f64] {
        match component {
            SpectrumComponent::Magnitude => &self.magnitude,
            SpectrumComponent::MagnitudeDb => &self.magnitude_db,
            SpectrumComponent::Phase => &self.phase,
        }
    }

    pub fn full_slice(&self) -> SpectrumSlice<'_> {
        SpectrumSlice {
            freqs: &self.frequencies,
            magnitude: &self.magnitude,
        }
    }
}

/// Which spectrum curve is plotted on the Y axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpectrumComponent {
    #[default]
    Magnitude,
    #[serde(rename = "Magnitude (dB)")]
    MagnitudeDb,
    Phase,
}

impl SpectrumComponent {
    pub fn label(self) -> &'static str {
        match self {
            SpectrumComponent::Magnitude => "Magnitude",
            SpectrumComponent::MagnitudeDb => "Magnitude (dB)",
            SpectrumComponent::Phase => "Phase",
        }
    }
}

/// Borrowed frequency/magnitude pair used by the harmonic analysis.
#[derive(Clone, Copy, Debug)]
pub struct SpectrumSlice<'a> {
    pub freqs: &'a [f64],
    pub magnitude: &'a [f64],
}

impl<'a> SpectrumSlice<'a> {
    pub fn new(freqs: &'a [f64], magnitude: &'a [f64]) -> Self {
        Self { freqs, magnitude }
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty() || self.magnitude.is_empty()
    }
}

/// Peak and THD readout for the current selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakReport {
    pub peak_freq: f64,
    pub peak_magnitude: f64,
    /// Bin of the full spectrum closest to `peak_freq`.
    pub peak_index: usize,
    pub thd_percent: f64,
}

/// Coordinate system of the X axis the cursors live in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum XAxis {
    #[default]
    Frequency,
    Index,
}
