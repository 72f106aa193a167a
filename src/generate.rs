//! Synthetic demo container: the same two-tone signal stored once as
//! separate time/signal datasets and once as an `[N, 2]` matrix.

use crate::error::Result;
use crate::formats::JsonContainer;
use crate::store::{AttrValue, Attributes, DType, Dataset};
use std::f64::consts::PI;
use std::path::Path;

#[derive(Clone, Debug, PartialEq)]
pub struct DemoSignal {
    pub fs: f64,
    pub f1: f64,
    pub f2: f64,
    pub a1: f64,
    pub a2: f64,
    /// Length in periods of `f1`.
    pub periods: f64,
}

impl Default for DemoSignal {
    fn default() -> Self {
        Self {
            fs: 1_000_000.0,
            f1: 50.0,
            f2: 1000.0,
            a1: 1.0,
            a2: 0.3,
            periods: 2.0,
        }
    }
}

impl DemoSignal {
    pub fn duration(&self) -> f64 {
        self.periods / self.f1
    }

    pub fn len(&self) -> usize {
        (self.fs * self.periods / self.f1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(t, signal)` sampled at `fs`.
    pub fn samples(&self) -> (Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (0..self.len()).map(|i| i as f64 / self.fs).collect();
        let y = t
            .iter()
            .map(|&t| self.a1 * (2.0 * PI * self.f1 * t).sin() + self.a2 * (2.0 * PI * self.f2 * t).sin())
            .collect();
        (t, y)
    }
}

fn attrs(pairs: &[(&str, AttrValue)]) -> Attributes {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// Write the demo container to `path`. Returns the sample count.
pub fn generate_demo(path: &Path, demo: &DemoSignal) -> Result<usize> {
    let (t, y) = demo.samples();
    let n = t.len();
    let mut out = JsonContainer::create(path);

    out.insert_group("/separate_axes", Attributes::new())?;
    let time = Dataset {
        shape: vec![n],
        dtype: DType::Float64,
        values: t.clone(),
        columns: vec!["Value".into()],
    };
    out.insert_dataset(
        "/separate_axes/time",
        &time,
        attrs(&[
            ("units", "s".into()),
            ("fs", demo.fs.into()),
            ("description", "Time axis".into()),
        ]),
    )?;
    let signal = Dataset {
        values: y.clone(),
        ..time
    };
    out.insert_dataset(
        "/separate_axes/signal",
        &signal,
        attrs(&[
            ("units", "V".into()),
            ("fundamental_frequency", demo.f1.into()),
            ("secondary_frequency", demo.f2.into()),
            (
                "description",
                format!("{} Hz + {} Hz sine wave", demo.f1, demo.f2).as_str().into(),
            ),
            ("samples", (n as i64).into()),
            ("duration_s", demo.duration().into()),
        ]),
    )?;

    let matrix = Dataset {
        shape: vec![n, 2],
        dtype: DType::Float64,
        values: t.iter().zip(&y).flat_map(|(&t, &y)| [t, y]).collect(),
        columns: vec!["time".into(), "signal".into()],
    };
    out.insert_dataset(
        "/matrix_signal/data",
        &matrix,
        attrs(&[
            ("columns", AttrValue::List(vec!["time".into(), "signal".into()])),
            ("time_units", "s".into()),
            ("signal_units", "V".into()),
            ("fs", demo.fs.into()),
            ("fundamental_frequency", demo.f1.into()),
            ("secondary_frequency", demo.f2.into()),
            ("description", "Nx2 matrix: [time, signal]".into()),
        ]),
    )?;

    out.set_root_attribute("created", chrono::Utc::now().to_rfc3339().as_str().into());
    out.set_root_attribute("author", "h5scope generator".into());
    out.set_root_attribute(
        "note",
        "Comparison between separate axis datasets and matrix dataset".into(),
    );
    out.save()?;
    log::info!("wrote {n} samples to {}", path.display());
    Ok(n)
}
