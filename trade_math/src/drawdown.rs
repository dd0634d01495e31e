//! Running peak and drawdown tracking

use serde::{Deserialize, Serialize};

/// Tracks the running peak of a value series and its most negative drawdown.
///
/// Drawdowns are percentages `(value - peak) / peak * 100`, so they are zero at a
/// new peak and negative below it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownTracker {
    high_water: f64,
    max_drawdown_pct: f64,
}

impl DrawdownTracker {
    /// Start tracking from an initial value
    pub fn new(initial: f64) -> Self {
        Self {
            high_water: initial,
            max_drawdown_pct: 0.0,
        }
    }

    /// Fold a new value in and return its drawdown from the updated peak
    pub fn update(&mut self, value: f64) -> f64 {
        self.high_water = self.high_water.max(value);
        let drawdown = drawdown_pct(value, self.high_water);
        self.max_drawdown_pct = self.max_drawdown_pct.min(drawdown);
        drawdown
    }

    /// Highest value observed so far
    pub fn high_water(&self) -> f64 {
        self.high_water
    }

    /// Most negative drawdown observed so far (always `<= 0`)
    pub fn max_drawdown_pct(&self) -> f64 {
        self.max_drawdown_pct
    }
}

/// Percentage distance of `value` below `peak`; zero for a non-positive peak
pub fn drawdown_pct(value: f64, peak: f64) -> f64 {
    if peak <= 0.0 {
        return 0.0;
    }
    (value - peak) / peak * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tracks_peak_and_worst_drawdown() {
        let mut tracker = DrawdownTracker::new(100.0);
        assert_eq!(tracker.update(100.0), 0.0);
        assert_relative_eq!(tracker.update(90.0), -10.0, epsilon = 1e-12);
        assert_eq!(tracker.update(120.0), 0.0);
        assert_relative_eq!(tracker.update(108.0), -10.0, epsilon = 1e-12);
        assert_relative_eq!(tracker.update(60.0), -50.0, epsilon = 1e-12);
        assert_eq!(tracker.update(130.0), 0.0);

        assert_eq!(tracker.high_water(), 130.0);
        assert_relative_eq!(tracker.max_drawdown_pct(), -50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_peak_is_guarded() {
        assert_eq!(drawdown_pct(10.0, 0.0), 0.0);
    }
}
