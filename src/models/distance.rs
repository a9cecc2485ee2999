use serde::{Deserialize, Serialize};
use std::fmt;

/// Acceptance band `[min, max]` (meters) derived from a target distance and
/// a fractional tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceWindow {
    pub min: f64,
    pub max: f64,
}

impl ToleranceWindow {
    /// `tolerance` must lie in `[0, 1)` and `distance` must be positive.
    pub fn new(distance: f64, tolerance: f64) -> Result<Self, String> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(format!(
                "Distance must be a positive finite number, got {}",
                distance
            ));
        }
        if !(0.0..1.0).contains(&tolerance) {
            return Err(format!("Tolerance must be in [0, 1), got {}", tolerance));
        }
        Ok(ToleranceWindow {
            min: distance * (1.0 - tolerance),
            max: distance * (1.0 + tolerance),
        })
    }

    pub fn contains(&self, length: f64) -> bool {
        (self.min..=self.max).contains(&length)
    }
}

impl fmt::Display for ToleranceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}m-{:.1}m", self.min, self.max)
    }
}
