use serde::{Deserialize, Serialize};

/// Descriptive statistics of a sample selection.
///
/// Field names serialize to the labels shown in the statistics panel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(rename = "Average")]
    pub average: f64,
    #[serde(rename = "Max")]
    pub max: f64,
    #[serde(rename = "Min")]
    pub min: f64,
    #[serde(rename = "Pk-Pk")]
    pub peak_to_peak: f64,
    #[serde(rename = "Std Dev")]
    pub std_dev: f64,
    #[serde(rename = "RMS")]
    pub rms: f64,
}

impl Statistics {
    pub const LABELS: [&'static str; 6] = ["Average", "Max", "Min", "Pk-Pk", "Std Dev", "RMS"];

    /// `(label, value)` pairs in display order.
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            (Self::LABELS[0], self.average),
            (Self::LABELS[1], self.max),
            (Self::LABELS[2], self.min),
            (Self::LABELS[3], self.peak_to_peak),
            (Self::LABELS[4], self.std_dev),
            (Self::LABELS[5], self.rms),
        ]
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries().into_iter().find(|(l, _)| *l == label).map(|(_, v)| v)
    }
}

/// Compute statistics over `samples`, ignoring non-finite values.
///
/// Returns `None` for an empty slice. A slice with no finite value yields
/// NaN in every field.
pub fn calculate_statistics(samples: &[f64]) -> Option<Statistics> {
    if samples.is_empty() {
        return None;
    }

    let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Some(Statistics {
            average: f64::NAN,
            max: f64::NAN,
            min: f64::NAN,
            peak_to_peak: f64::NAN,
            std_dev: f64::NAN,
            rms: f64::NAN,
        });
    }

    let count = finite.len() as f64;
    let average = finite.iter().sum::<f64>() / count;
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let variance = finite.iter().map(|v| (v - average) * (v - average)).sum::<f64>() / count;

    let mean_sq = finite.iter().map(|v| v * v).sum::<f64>() / count;
    let rms = if mean_sq.is_finite() && mean_sq >= 0.0 {
        mean_sq.sqrt()
    } else {
        f64::NAN
    };

    Some(Statistics {
        average,
        max,
        min,
        peak_to_peak: max - min,
        std_dev: variance.sqrt(),
        rms,
    })
}
