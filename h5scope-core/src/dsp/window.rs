use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;

thread_local! {
    static WINDOW_CACHE: RefCell<HashMap<(WindowKind, usize), Vec<f64>>> = RefCell::new(HashMap::new());
}

/// Tapering applied to a signal before the FFT.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    #[default]
    Rectangular,
    Hann,
    Hamming,
    Blackman,
    /// Gaussian window with σ = n/8 centred on the frame.
    Gabor,
}

impl WindowKind {
    pub const ALL: [WindowKind; 5] = [
        WindowKind::Rectangular,
        WindowKind::Hann,
        WindowKind::Hamming,
        WindowKind::Blackman,
        WindowKind::Gabor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WindowKind::Rectangular => "Rectangular",
            WindowKind::Hann => "Hann",
            WindowKind::Hamming => "Hamming",
            WindowKind::Blackman => "Blackman",
            WindowKind::Gabor => "Gabor",
        }
    }

    /// Look a window up by its display name (case-insensitive).
    /// Anything unrecognised is treated as Rectangular.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        match Self::ALL.iter().find(|k| k.name().eq_ignore_ascii_case(name)) {
            Some(kind) => *kind,
            None => {
                log::debug!("unknown window {name:?}, using Rectangular");
                WindowKind::Rectangular
            }
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for WindowKind {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

/// Window coefficients of length `n` for `kind`.
///
/// The cosine windows use the symmetric form (`n == 1` gives `[1.0]`), so the
/// first and last coefficients of Hann and Blackman are (numerically) zero.
pub fn window(kind: WindowKind, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    WINDOW_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .entry((kind, n))
            .or_insert_with(|| build_window(kind, n))
            .clone()
    })
}

fn build_window(kind: WindowKind, n: usize) -> Vec<f64> {
    match kind {
        WindowKind::Rectangular => vec![1.0; n],
        WindowKind::Hann => cosine_window(n, |x| 0.5 + 0.5 * x.cos()),
        WindowKind::Hamming => cosine_window(n, |x| 0.54 + 0.46 * x.cos()),
        WindowKind::Blackman => {
            cosine_window(n, |x| 0.42 + 0.5 * x.cos() + 0.08 * (2.0 * x).cos())
        }
        WindowKind::Gabor => {
            let center = (n as f64 - 1.0) / 2.0;
            let sigma = n as f64 / 8.0;
            (0..n)
                .map(|i| {
                    let d = i as f64 - center;
                    (-0.5 * (d * d) / (sigma * sigma)).exp()
                })
                .collect()
        }
    }
}

/// Evaluate `f(π·m/(n-1))` for `m = 1-n, 3-n, ..., n-1`.
fn cosine_window(n: usize, f: impl Fn(f64) -> f64) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| {
            let m = 2.0 * i as f64 + 1.0 - n as f64;
            f(PI * m / denom)
        })
        .collect()
}
