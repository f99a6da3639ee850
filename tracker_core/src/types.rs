//! Fundamental types used across the entire workspace.

use nalgebra::{DMatrix, DVector, Matrix6, Vector3, Vector6};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Scalar type: use f64 throughout for numerical precision in the filter.
// ---------------------------------------------------------------------------

/// 6-DOF state vector: [px, py, pz, vx, vy, vz]
pub type StateVec = Vector6<f64>;

/// 6×6 state covariance matrix
pub type StateCov = Matrix6<f64>;

/// Generic dynamic-size vector (measurement space: z, innovation)
pub type DVec = DVector<f64>;

/// Generic dynamic-size matrix (measurement space: H, R, S)
pub type DMat = DMatrix<f64>;

// ---------------------------------------------------------------------------
// Identifier types — newtype wrappers so IDs are never confused at compile time
// ---------------------------------------------------------------------------

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Sensor capability
// ---------------------------------------------------------------------------

/// Observation capability attached to every measurement.
///
/// One implementation per sensor modality, selected at measurement
/// construction time. The association core only ever talks to this trait.
pub trait SensorModel: fmt::Debug + Send + Sync {
    /// Short sensor name, for diagnostics only.
    fn name(&self) -> &str;

    /// Dimensionality of the measurement space (2 for a bearing/elevation
    /// camera, 3 for a cartesian lidar).
    fn dim(&self) -> usize;

    /// Nonlinear measurement function h(x): expected observation of a target
    /// at `state`.
    fn expected(&self, state: &StateVec) -> DVec;

    /// Measurement Jacobian H = ∂h/∂x evaluated at `state` (dim × 6).
    fn jacobian(&self, state: &StateVec) -> DMat;

    /// True if a target at `state` lies inside this sensor's field of view.
    fn in_fov(&self, state: &StateVec) -> bool;

    /// World position implied by a raw observation, for modalities that
    /// measure position directly. Bearing-only sensors return `None`; their
    /// observations can update existing tracks but never seed new ones.
    fn position(&self, z: &DVec) -> Option<Vector3<f64>>;
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// A single sensor observation. Immutable for the duration of one cycle.
#[derive(Clone, Debug)]
pub struct Measurement {
    /// Raw observation vector in the sensor's measurement space
    pub z: DVec,
    /// Measurement noise covariance R (dim × dim)
    pub noise_cov: DMat,
    /// The sensor that produced this observation
    pub sensor: Arc<dyn SensorModel>,
    /// Observation timestamp in seconds
    pub timestamp: f64,
}

impl Measurement {
    pub fn new(z: DVec, noise_cov: DMat, sensor: Arc<dyn SensorModel>, timestamp: f64) -> Self {
        Self {
            z,
            noise_cov,
            sensor,
            timestamp,
        }
    }

    /// Dimension of the observation vector.
    pub fn dim(&self) -> usize {
        self.z.len()
    }
}
