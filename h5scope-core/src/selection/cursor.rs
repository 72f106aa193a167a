use serde::{Deserialize, Serialize};

/// How pointer interactions on the plot move the cursors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    /// Cursors hidden, interactions ignored.
    #[default]
    Off,
    /// Every interaction places cursor 1.
    P1,
    /// Every interaction places cursor 2.
    P2,
    /// Interactions alternate between cursor 1 and cursor 2.
    Auto,
}

impl CursorMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "off" => Some(CursorMode::Off),
            "p1" => Some(CursorMode::P1),
            "p2" => Some(CursorMode::P2),
            "auto" => Some(CursorMode::Auto),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorId {
    First,
    Second,
}

impl CursorId {
    fn other(self) -> Self {
        match self {
            CursorId::First => CursorId::Second,
            CursorId::Second => CursorId::First,
        }
    }
}

/// Two independent cursor positions on the active X axis.
///
/// The pair is unordered; use [`CursorPair::interval`] to get `(min, max)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CursorPair {
    pub c1: Option<f64>,
    pub c2: Option<f64>,
}

impl CursorPair {
    pub fn new(c1: f64, c2: f64) -> Self {
        Self { c1: Some(c1), c2: Some(c2) }
    }

    pub fn get(&self, id: CursorId) -> Option<f64> {
        match id {
            CursorId::First => self.c1,
            CursorId::Second => self.c2,
        }
    }

    pub fn set(&mut self, id: CursorId, x: f64) {
        match id {
            CursorId::First => self.c1 = Some(x),
            CursorId::Second => self.c2 = Some(x),
        }
    }

    /// `(min, max)` of the two positions, if both are placed.
    pub fn interval(&self) -> Option<(f64, f64)> {
        let (a, b) = (self.c1?, self.c2?);
        Some((a.min(b), a.max(b)))
    }
}

/// Cursor state machine driven by plot interactions.
#[derive(Clone, Debug, Default)]
pub struct CursorController {
    mode: CursorMode,
    pair: CursorPair,
    next_auto: Option<CursorId>,
}

impl CursorController {
    pub fn new(mode: CursorMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> CursorMode {
        self.mode
    }

    pub fn pair(&self) -> CursorPair {
        self.pair
    }

    pub fn set_mode(&mut self, mode: CursorMode) {
        if mode == CursorMode::Auto {
            self.next_auto = Some(CursorId::First);
        }
        self.mode = mode;
    }

    /// Whether the cursors define the selection: mode is not `Off` and both
    /// positions are placed.
    pub fn is_active(&self) -> bool {
        self.mode != CursorMode::Off && self.pair.interval().is_some()
    }

    /// Handle a click at `x`. Returns the cursor that moved, or `None` when
    /// the mode ignores interactions.
    pub fn interact(&mut self, x: f64) -> Option<CursorId> {
        let id = match self.mode {
            CursorMode::Off => return None,
            CursorMode::P1 => CursorId::First,
            CursorMode::P2 => CursorId::Second,
            CursorMode::Auto => {
                let id = self.next_auto.unwrap_or(CursorId::First);
                self.next_auto = Some(id.other());
                id
            }
        };
        self.pair.set(id, x);
        Some(id)
    }

    /// Move a specific cursor, as when dragging it. Ignored in `Off` mode.
    pub fn drag(&mut self, id: CursorId, x: f64) -> bool {
        if self.mode == CursorMode::Off {
            return false;
        }
        self.pair.set(id, x);
        true
    }

    /// Place both cursors directly, bypassing the interaction mode.
    pub fn place(&mut self, c1: f64, c2: f64) {
        self.pair = CursorPair::new(c1, c2);
    }

    pub fn clear(&mut self) {
        self.pair = CursorPair::default();
    }

    /// Put the cursors at 10% and 90% of the extent of `x`.
    ///
    /// An empty, constant or non-finite series resets them to `(0, 1)`.
    pub fn reset_to_series(&mut self, x: &[f64]) {
        self.pair = match finite_extent(x) {
            Some((lo, hi)) if lo != hi => CursorPair::new(lo + (hi - lo) * 0.1, lo + (hi - lo) * 0.9),
            _ => CursorPair::new(0.0, 1.0),
        };
    }

    /// Re-seat cursors that are unset or lie more than two spans outside the
    /// extent of `x`, keeping any cursor that is still plausible.
    pub fn fit_to_series(&mut self, x: &[f64]) {
        let Some((lo, hi)) = finite_extent(x).filter(|(lo, hi)| lo != hi) else {
            self.pair = CursorPair::new(0.0, 1.0);
            return;
        };
        let span = hi - lo;
        let margin = span * 2.0;
        let in_bounds = |c: f64| c >= lo - margin && c <= hi + margin;

        match self.pair.c1 {
            Some(c) if in_bounds(c) => {}
            _ => self.pair.c1 = Some(lo + span * 0.1),
        }
        match self.pair.c2 {
            Some(c) if in_bounds(c) => {}
            _ => self.pair.c2 = Some(lo + span * 0.9),
        }
    }
}

/// `(min, max)` over the finite values of `x`.
pub(crate) fn finite_extent(x: &[f64]) -> Option<(f64, f64)> {
    x.iter().copied().filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
