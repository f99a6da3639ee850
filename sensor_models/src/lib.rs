//! `sensor_models` — Concrete observation models implementing the
//! [`tracker_core::SensorModel`] capability.
//!
//! - [`lidar`]  — 3D cartesian position sensor
//! - [`camera`] — bearing/elevation camera with a limited field of view

pub mod camera;
pub mod lidar;

pub use camera::{Camera, CameraParams};
pub use lidar::{Lidar, LidarParams};

/// Wrap an angle to (−π, π].
pub(crate) fn wrap_angle(a: f64) -> f64 {
    (a + std::f64::consts::PI).rem_euclid(std::f64::consts::TAU) - std::f64::consts::PI
}
