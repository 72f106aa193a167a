//! Analysis settings loaded from YAML.
//!
//! ```yaml
//! sampling_khz: 1000
//! window: Hann
//! max_harmonic: 40
//! bins_per_harmonic: 1
//! x_axis: Frequency
//! cursor_mode: auto
//! range_start: 0
//! range_end: 100
//! display_points: 50000
//! ```
//!
//! Every key is optional.

use crate::error::Result;
use h5scope_core::dsp::harmonics::ThdParams;
use h5scope_core::dsp::window::WindowKind;
use h5scope_core::selection::cursor::CursorMode;
use h5scope_core::selection::range::{RangePercent, DISPLAY_POINT_TARGET};
use h5scope_core::session::{AnalysisSession, DEFAULT_SAMPLING_HZ};
use h5scope_core::types::XAxis;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initial sampling frequency field value.
pub const DEFAULT_SAMPLING_KHZ: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Sampling frequency in kHz.
    pub sampling_khz: f64,
    pub window: WindowKind,
    pub max_harmonic: usize,
    pub bins_per_harmonic: usize,
    pub x_axis: XAxis,
    pub cursor_mode: CursorMode,
    pub range_start: f64,
    pub range_end: f64,
    /// Points drawn before the initial range is narrowed.
    pub display_points: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let thd = ThdParams::default();
        Self {
            sampling_khz: DEFAULT_SAMPLING_KHZ,
            window: WindowKind::default(),
            max_harmonic: thd.max_harmonic,
            bins_per_harmonic: thd.bins_per_harmonic,
            x_axis: XAxis::default(),
            cursor_mode: CursorMode::default(),
            range_start: RangePercent::FULL.start,
            range_end: RangePercent::FULL.end,
            display_points: DISPLAY_POINT_TARGET,
        }
    }
}

impl AnalysisConfig {
    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(yaml_serde::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::parse(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(yaml_serde::to_string(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Sampling frequency in Hz, falling back to the default when unusable.
    pub fn sampling_hz(&self) -> f64 {
        let hz = self.sampling_khz * 1e3;
        if hz.is_finite() && hz > 0.0 {
            hz
        } else {
            log::warn!("invalid sampling_khz {}, using {DEFAULT_SAMPLING_HZ} Hz", self.sampling_khz);
            DEFAULT_SAMPLING_HZ
        }
    }

    pub fn thd_params(&self) -> ThdParams {
        ThdParams {
            max_harmonic: self.max_harmonic,
            bins_per_harmonic: self.bins_per_harmonic,
            fundamental_freq: None,
        }
    }

    pub fn range(&self) -> RangePercent {
        RangePercent::new(self.range_start, self.range_end)
    }

    /// Initial range for a series of `total_points`, limited to about
    /// `display_points` points.
    pub fn display_range(&self, total_points: usize) -> RangePercent {
        RangePercent::auto_limit(total_points, self.display_points)
    }

    /// A session over `signal` with every setting applied.
    pub fn session(&self, signal: Vec<f64>) -> AnalysisSession {
        let mut session = AnalysisSession::new(signal, self.sampling_hz(), self.window);
        session.set_thd_params(self.thd_params());
        session.set_x_axis(self.x_axis);
        session.set_cursor_mode(self.cursor_mode);
        session.set_range(self.range());
        session
    }
}
