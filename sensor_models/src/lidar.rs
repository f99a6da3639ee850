//! Lidar observation model: direct 3D cartesian position measurement.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracker_core::types::{DMat, DVec, SensorModel, StateVec};

/// Physical configuration of a lidar sensor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LidarParams {
    /// Mount position (x, y, z) in the tracking frame (meters)
    pub mount: [f64; 3],
    /// Maximum detection range (meters)
    pub max_range: f64,
    /// Measurement noise std per axis (meters)
    pub sigma: [f64; 3],
}

impl Default for LidarParams {
    fn default() -> Self {
        Self {
            mount: [0.0, 0.0, 0.0],
            max_range: 300.0,
            sigma: [0.3, 0.3, 0.3],
        }
    }
}

/// Lidar: measures target position relative to the mount, z = p − mount.
#[derive(Clone, Debug)]
pub struct Lidar {
    name: String,
    pub params: LidarParams,
}

impl Lidar {
    pub fn new(name: impl Into<String>, params: LidarParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Measurement noise covariance R.
    pub fn noise_cov(&self) -> DMat {
        let s = &self.params.sigma;
        DMat::from_diagonal(&DVec::from_vec(vec![
            s[0] * s[0],
            s[1] * s[1],
            s[2] * s[2],
        ]))
    }

    fn offset(&self, state: &StateVec) -> Vector3<f64> {
        Vector3::new(
            state[0] - self.params.mount[0],
            state[1] - self.params.mount[1],
            state[2] - self.params.mount[2],
        )
    }
}

impl SensorModel for Lidar {
    fn name(&self) -> &str {
        &self.name
    }

    fn dim(&self) -> usize {
        3
    }

    fn expected(&self, state: &StateVec) -> DVec {
        let d = self.offset(state);
        DVec::from_vec(vec![d[0], d[1], d[2]])
    }

    fn jacobian(&self, _state: &StateVec) -> DMat {
        // Linear model: z = p − mount, so H = [I₃ 0₃].
        DMat::from_fn(3, 6, |r, c| if r == c { 1.0 } else { 0.0 })
    }

    fn in_fov(&self, state: &StateVec) -> bool {
        self.offset(state).norm() <= self.params.max_range
    }

    fn position(&self, z: &DVec) -> Option<Vector3<f64>> {
        Some(Vector3::new(
            z[0] + self.params.mount[0],
            z[1] + self.params.mount[1],
            z[2] + self.params.mount[2],
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
