//! Chi-square gating: decides whether a track-measurement pair is close
//! enough, statistically, to be a candidate association.
//!
//! A pair with Mahalanobis distance d² is accepted iff
//! d² < χ²(confidence, dof) where dof is the sensor's measurement dimension.
//! Rejecting implausibly large residuals bounds false associations.

use crate::chi2;
use crate::types::SensorModel;

/// Gating confidence used when none is configured.
pub const DEFAULT_CONFIDENCE: f64 = 0.995;

/// Largest measurement dimension with a precomputed threshold. Larger
/// dimensions fall back to computing the quantile on the fly.
const TABLE_DIM: usize = 8;

/// Chi-square gate, parameterized by a single confidence level.
///
/// The confidence is passed in explicitly so the gate stays testable in
/// isolation; there is no ambient configuration.
#[derive(Clone, Debug)]
pub struct Gate {
    confidence: f64,
    thresholds: [f64; TABLE_DIM + 1],
}

impl Gate {
    /// # Panics
    /// Panics if `confidence` is outside (0, 1).
    pub fn new(confidence: f64) -> Self {
        assert!(
            confidence > 0.0 && confidence < 1.0,
            "gating confidence must be in (0, 1), got {confidence}"
        );
        let mut thresholds = [0.0; TABLE_DIM + 1];
        for (dof, slot) in thresholds.iter_mut().enumerate().skip(1) {
            *slot = chi2::quantile(confidence, dof);
        }
        Self {
            confidence,
            thresholds,
        }
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Gate threshold for a measurement space of dimension `dim`.
    pub fn threshold(&self, dim: usize) -> f64 {
        assert!(dim >= 1, "measurement dimension must be >= 1");
        if dim <= TABLE_DIM {
            self.thresholds[dim]
        } else {
            chi2::quantile(self.confidence, dim)
        }
    }

    /// True if `distance` lies inside the gate for this sensor's
    /// measurement dimension.
    pub fn accepts(&self, distance: f64, sensor: &dyn SensorModel) -> bool {
        distance < self.threshold(sensor.dim())
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
