//! Camera observation model: bearing/elevation measurement with a limited
//! field of view.
//!
//! z = [azimuth, elevation] of the target relative to the mount, with
//! azimuth measured against the camera's yaw. Bearing-only: a single
//! observation carries no depth, so this model can never seed a track.

use crate::wrap_angle;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracker_core::types::{DMat, DVec, SensorModel, StateVec};

/// Physical configuration of a camera sensor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraParams {
    /// Mount position (x, y, z) in the tracking frame (meters)
    pub mount: [f64; 3],
    /// Boresight azimuth (radians)
    pub yaw: f64,
    /// Field-of-view half-angle in azimuth (radians)
    pub az_half: f64,
    /// Field-of-view half-angle in elevation (radians)
    pub el_half: f64,
    /// Angular noise std, azimuth (radians)
    pub sigma_az: f64,
    /// Angular noise std, elevation (radians)
    pub sigma_el: f64,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            mount: [0.0, 0.0, 0.0],
            yaw: 0.0,
            az_half: 0.6,
            el_half: 0.3,
            sigma_az: 0.002,
            sigma_el: 0.002,
        }
    }
}

/// Bearing/elevation camera.
#[derive(Clone, Debug)]
pub struct Camera {
    name: String,
    pub params: CameraParams,
}

impl Camera {
    pub fn new(name: impl Into<String>, params: CameraParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Measurement noise covariance R.
    pub fn noise_cov(&self) -> DMat {
        DMat::from_diagonal(&DVec::from_vec(vec![
            self.params.sigma_az * self.params.sigma_az,
            self.params.sigma_el * self.params.sigma_el,
        ]))
    }

    fn offset(&self, state: &StateVec) -> Vector3<f64> {
        Vector3::new(
            state[0] - self.params.mount[0],
            state[1] - self.params.mount[1],
            state[2] - self.params.mount[2],
        )
    }

    fn bearings(&self, state: &StateVec) -> (f64, f64) {
        let d = self.offset(state);
        let horiz = (d[0] * d[0] + d[1] * d[1]).sqrt();
        let az = wrap_angle(d[1].atan2(d[0]) - self.params.yaw);
        let el = d[2].atan2(horiz);
        (az, el)
    }
}

impl SensorModel for Camera {
    fn name(&self) -> &str {
        &self.name
    }

    fn dim(&self) -> usize {
        2
    }

    fn expected(&self, state: &StateVec) -> DVec {
        let (az, el) = self.bearings(state);
        DVec::from_vec(vec![az, el])
    }

    fn jacobian(&self, state: &StateVec) -> DMat {
        let d = self.offset(state);
        let (dx, dy, dz) = (d[0], d[1], d[2]);
        let r2 = (dx * dx + dy * dy).max(1e-9);
        let r = r2.sqrt();
        let d2 = r2 + dz * dz;

        // ∂az/∂p = [-dy/r², dx/r², 0],  ∂el/∂p = [-dx·dz/(r·d²), -dy·dz/(r·d²), r/d²]
        let mut h = DMat::zeros(2, 6);
        h[(0, 0)] = -dy / r2;
        h[(0, 1)] = dx / r2;
        h[(1, 0)] = -dx * dz / (r * d2);
        h[(1, 1)] = -dy * dz / (r * d2);
        h[(1, 2)] = r / d2;
        h
    }

    fn in_fov(&self, state: &StateVec) -> bool {
        let (az, el) = self.bearings(state);
        az.abs() <= self.params.az_half && el.abs() <= self.params.el_half
    }

    fn position(&self, _z: &DVec) -> Option<Vector3<f64>> {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
