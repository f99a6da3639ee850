//! Shared helpers for unit tests: simple sensors with controllable
//! visibility, measurement construction, track construction.

use crate::track::Track;
use crate::types::{DMat, DVec, Measurement, SensorModel, StateCov, StateVec, TrackId};
use nalgebra::Vector3;
use std::sync::Arc;

/// Cartesian position sensor with a blanket visibility switch.
#[derive(Debug)]
pub struct TestSensor {
    name: String,
    dim: usize,
    visible: bool,
}

impl SensorModel for TestSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn expected(&self, state: &StateVec) -> DVec {
        DVec::from_fn(self.dim, |r, _| state[r])
    }

    fn jacobian(&self, _state: &StateVec) -> DMat {
        DMat::from_fn(self.dim, 6, |r, c| if r == c { 1.0 } else { 0.0 })
    }

    fn in_fov(&self, _state: &StateVec) -> bool {
        self.visible
    }

    fn position(&self, z: &DVec) -> Option<Vector3<f64>> {
        let pz = if self.dim >= 3 { z[2] } else { 0.0 };
        Some(Vector3::new(z[0], z[1], pz))
    }
}

/// Bearing-only sensor: measures [azimuth, elevation], cannot seed tracks.
#[derive(Debug)]
pub struct TestBearingSensor {
    name: String,
    visible: bool,
}

impl SensorModel for TestBearingSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn dim(&self) -> usize {
        2
    }

    fn expected(&self, state: &StateVec) -> DVec {
        let (px, py, pz) = (state[0], state[1], state[2]);
        let horiz = (px * px + py * py).sqrt();
        DVec::from_vec(vec![py.atan2(px), pz.atan2(horiz)])
    }

    fn jacobian(&self, state: &StateVec) -> DMat {
        let (px, py, pz) = (state[0], state[1], state[2]);
        let r2 = (px * px + py * py).max(1e-9);
        let r = r2.sqrt();
        let d2 = r2 + pz * pz;
        let mut h = DMat::zeros(2, 6);
        h[(0, 0)] = -py / r2;
        h[(0, 1)] = px / r2;
        h[(1, 0)] = -px * pz / (r * d2);
        h[(1, 1)] = -py * pz / (r * d2);
        h[(1, 2)] = r / d2;
        h
    }

    fn in_fov(&self, _state: &StateVec) -> bool {
        self.visible
    }

    fn position(&self, _z: &DVec) -> Option<Vector3<f64>> {
        None
    }
}

/// 2D cartesian position sensor.
pub fn xy_sensor(name: &str, visible: bool) -> Arc<dyn SensorModel> {
    Arc::new(TestSensor {
        name: name.to_string(),
        dim: 2,
        visible,
    })
}

/// 3D cartesian position sensor (lidar-like).
pub fn xy3_sensor(name: &str, visible: bool) -> Arc<dyn SensorModel> {
    Arc::new(TestSensor {
        name: name.to_string(),
        dim: 3,
        visible,
    })
}

/// Bearing-only sensor (camera-like).
pub fn bearing_sensor(name: &str, visible: bool) -> Arc<dyn SensorModel> {
    Arc::new(TestBearingSensor {
        name: name.to_string(),
        visible,
    })
}

/// Measurement with isotropic noise `r_var` on every axis.
pub fn measurement(
    sensor: &Arc<dyn SensorModel>,
    z: &[f64],
    r_var: f64,
    timestamp: f64,
) -> Measurement {
    let dim = z.len();
    Measurement::new(
        DVec::from_row_slice(z),
        DMat::identity(dim, dim) * r_var,
        Arc::clone(sensor),
        timestamp,
    )
}

/// Tentative track at (x, y) with identity covariance and zero velocity.
pub fn track_at(x: f64, y: f64) -> Track {
    Track::new(
        TrackId(0),
        StateVec::new(x, y, 0.0, 0.0, 0.0, 0.0),
        StateCov::identity(),
        1.0 / 6.0,
        0.0,
    )
}
